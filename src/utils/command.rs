use std::process::{Command, Output};

use crate::utils::{AppError, AppResult};

/// Run a system command to completion from a neutral working directory.
///
/// Only spawn failures are errors; a non-zero exit is left for the caller to
/// inspect on the returned `Output`.
pub fn run_command(program: &str, args: &[&str]) -> AppResult<Output> {
    Command::new(program)
        .current_dir("/tmp")
        .args(args)
        .output()
        .map_err(|e| AppError::CommandFailed(format!("{}: {}", program, e)))
}

/// Like [`run_command`] but returns trimmed stdout and fails on a non-zero exit.
pub fn run_command_stdout(program: &str, args: &[&str]) -> AppResult<String> {
    let output = run_command(program, args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::CommandFailed(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        assert_eq!(run_command_stdout("echo", &["hello"]).unwrap(), "hello");
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let err = run_command_stdout("false", &[]).unwrap_err();
        assert!(matches!(err, AppError::CommandFailed(_)));
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(run_command("appsweep-no-such-program", &[]).is_err());
    }
}
