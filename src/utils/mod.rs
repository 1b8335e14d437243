pub mod app_lifecycle;
pub mod askpass;
pub mod command;
pub mod elevation;
pub mod error;
pub mod plist_parser;

pub use error::{AppError, AppResult};

use std::path::{Path, PathBuf};

/// Expand a `~/` prefix against the given home directory.
pub fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix() {
        let home = Path::new("/Users/me");
        assert_eq!(expand_tilde("~/Library", home), PathBuf::from("/Users/me/Library"));
        assert_eq!(expand_tilde("~", home), PathBuf::from("/Users/me"));
        assert_eq!(expand_tilde("/Library", home), PathBuf::from("/Library"));
        assert_eq!(expand_tilde("~other/x", home), PathBuf::from("~other/x"));
    }
}
