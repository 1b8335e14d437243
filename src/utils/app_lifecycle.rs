use std::path::Path;

use crate::utils::command::run_command;

/// Check whether a process is running an executable from inside the bundle.
///
/// Only command lines that *start* with `<bundle>/` count, so a process that
/// merely mentions the bundle in its arguments (this one, or the shell that
/// launched it) is not mistaken for the application.
pub fn is_app_running(app_path: &Path) -> bool {
    let pattern = bundle_pattern(app_path);
    let output = match run_command("pgrep", &["-f", &pattern]) {
        Ok(o) if o.status.success() => o,
        _ => return false,
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    !foreign_pids(&stdout, &own_pids()).is_empty()
}

/// Anchored extended regex matching command lines launched from the bundle.
fn bundle_pattern(app_path: &Path) -> String {
    let path = app_path.to_string_lossy();
    format!("^{}/", ere_escape(path.trim_end_matches('/')))
}

fn ere_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '.' | '[' | ']' | '{' | '}' | '(' | ')' | '*' | '+' | '?' | '^' | '$' | '|' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn own_pids() -> Vec<u32> {
    let mut pids = vec![std::process::id()];
    #[cfg(unix)]
    pids.push(std::os::unix::process::parent_id());
    pids
}

fn foreign_pids(pgrep_stdout: &str, own: &[u32]) -> Vec<u32> {
    pgrep_stdout
        .lines()
        .filter_map(|l| l.trim().parse::<u32>().ok())
        .filter(|pid| !own.contains(pid))
        .collect()
}
