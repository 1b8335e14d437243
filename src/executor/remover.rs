use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Output;

use crate::utils::elevation::{run_elevated_script, shell_escape, ElevatedError};
use crate::utils::AppResult;

/// Result of one escalated batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub removed_count: usize,
    pub failed_paths: Vec<PathBuf>,
}

/// Deletes paths, with or without administrator rights.
pub trait Remover: Send + Sync {
    /// Remove one path as the current user. A path that is already gone is
    /// not an error.
    fn delete_unprivileged(&self, path: &Path) -> AppResult<()>;

    /// Remove every path in one privileged operation behind a single
    /// authorization prompt. Absent paths are skipped; failures are counted,
    /// never fatal to the batch.
    fn delete_batch_elevated(&self, paths: &[PathBuf]) -> Result<BatchReport, ElevatedError>;
}

/// Deletes on the real filesystem; escalates through a short-lived shell script.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRemover;

impl Remover for SystemRemover {
    fn delete_unprivileged(&self, path: &Path) -> AppResult<()> {
        let meta = match path.symlink_metadata() {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_batch_elevated(&self, paths: &[PathBuf]) -> Result<BatchReport, ElevatedError> {
        run_batch(paths, run_elevated_script)
    }
}

/// Write the batch script to a temp file and hand it to `run`.
fn run_batch(
    paths: &[PathBuf],
    run: impl FnOnce(&Path) -> Result<Output, ElevatedError>,
) -> Result<BatchReport, ElevatedError> {
    {
        // Dropping the handle deletes the script, whichever way we leave.
        let mut script = tempfile::Builder::new()
            .prefix("appsweep-uninstall-")
            .suffix(".sh")
            .tempfile()?;
        script.write_all(render_script(paths).as_bytes())?;
        script.flush()?;

        log::info!(
            "running privileged removal of {} paths via {}",
            paths.len(),
            script.path().display()
        );
        let output = run(script.path())?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_report(&stdout, paths))
    }
}

/// A `/bin/sh` script that removes each path and prints `removed:<index>` or
/// `failed:<index>` for every path it found. Indices keep the output
/// unambiguous whatever the path contains.
pub fn render_script(paths: &[PathBuf]) -> String {
    let mut script = String::from(
        "#!/bin/sh\n\
         remove_path() {\n\
         \x20 if [ -e \"$2\" ] || [ -L \"$2\" ]; then\n\
         \x20   if rm -rf -- \"$2\" && [ ! -e \"$2\" ] && [ ! -L \"$2\" ]; then\n\
         \x20     echo \"removed:$1\"\n\
         \x20   else\n\
         \x20     echo \"failed:$1\"\n\
         \x20   fi\n\
         \x20 fi\n\
         }\n\n",
    );
    for (i, path) in paths.iter().enumerate() {
        script.push_str(&format!(
            "remove_path {} {}\n",
            i,
            shell_escape(&path.to_string_lossy())
        ));
    }
    script.push_str("exit 0\n");
    script
}

/// `do shell script` hands output back with `\r` line endings.
pub fn parse_report(stdout: &str, paths: &[PathBuf]) -> BatchReport {
    let mut report = BatchReport::default();
    for line in stdout.split(['\r', '\n']).map(str::trim) {
        let (removed, index) = if let Some(i) = line.strip_prefix("removed:") {
            (true, i)
        } else if let Some(i) = line.strip_prefix("failed:") {
            (false, i)
        } else {
            continue;
        };
        let Some(path) = index.parse::<usize>().ok().and_then(|i| paths.get(i)) else {
            log::warn!("unexpected line from removal script: {}", line);
            continue;
        };
        if removed {
            report.removed_count += 1;
        } else {
            report.failed_paths.push(path.clone());
        }
    }
    report
}
