use std::io;
use std::path::Path;
use std::process::{Command, Output};

use thiserror::Error;

use crate::utils::askpass;

/// Error type for elevated command execution.
#[derive(Debug, Error)]
pub enum ElevatedError {
    #[error("User cancelled the authorization prompt")]
    UserCancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Run a shell script file once with administrator privileges.
///
/// With an askpass helper registered this is `sudo -A /bin/sh <script>`,
/// otherwise `osascript ... with administrator privileges`. Exactly one of
/// the two runs, so the user sees at most one authorization prompt.
pub fn run_elevated_script(script: &Path) -> Result<Output, ElevatedError> {
    run_elevated_with(script, askpass::askpass_helper(), &mut |cmd| cmd.output())
}

fn run_elevated_with(
    script: &Path,
    askpass: Option<&Path>,
    spawn: &mut dyn FnMut(&mut Command) -> io::Result<Output>,
) -> Result<Output, ElevatedError> {
    let script = script.to_string_lossy();

    let mut cmd = match askpass {
        Some(ap) => {
            let mut cmd = Command::new("sudo");
            cmd.env("SUDO_ASKPASS", ap).args(["-A", "/bin/sh", &*script]);
            cmd
        }
        None => {
            let shell_cmd = format!("/bin/sh {}", shell_escape(&script));
            let mut cmd = Command::new("osascript");
            cmd.args([
                "-e",
                &format!(
                    "do shell script {} with administrator privileges",
                    applescript_quote(&shell_cmd)
                ),
            ]);
            cmd
        }
    };
    cmd.current_dir("/tmp");

    let output = spawn(&mut cmd)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_cancellation(&stderr) {
            return Err(ElevatedError::UserCancelled);
        }
        return Err(ElevatedError::CommandFailed(stderr.trim().to_string()));
    }

    Ok(output)
}

fn is_cancellation(stderr: &str) -> bool {
    stderr.contains("cancelled")
        || stderr.contains("dialog was dismissed")
        || stderr.contains("User canceled")
        || stderr.contains("-128")
}

/// Escape a string for use as a single shell word.
pub fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_'))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Quote a string as an AppleScript string literal.
fn applescript_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
