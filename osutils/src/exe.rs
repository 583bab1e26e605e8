use std::{
    os::unix::process::ExitStatusExt,
    process::{ExitStatus, Output},
};

use crate::crate_private::Sealed;

/// Extension for process results to describe how a process ended.
/// This is a sealed trait, so it cannot be implemented outside of this crate.
pub trait ExitExplainer: Sealed {
    /// Check if the process exited successfully
    fn is_success(&self) -> bool;

    /// Get the exit code of the process, if it exited normally
    fn exit_code(&self) -> Option<i32>;

    /// Get the signal that terminated the process, if it was terminated by a signal
    fn end_signal(&self) -> Option<i32>;

    /// Produce a string explaining the exit status of the process
    fn explain_exit(&self) -> String {
        if let Some(code) = self.exit_code() {
            format!("exited with status: {code}")
        } else if let Some(signal) = self.end_signal() {
            format!("was terminated by signal: {signal}")
        } else {
            "exited with unknown status".into()
        }
    }
}

impl Sealed for ExitStatus {}

impl ExitExplainer for ExitStatus {
    fn is_success(&self) -> bool {
        self.success()
    }

    fn exit_code(&self) -> Option<i32> {
        self.code()
    }

    fn end_signal(&self) -> Option<i32> {
        self.signal()
    }
}

impl Sealed for Output {}

impl ExitExplainer for Output {
    fn is_success(&self) -> bool {
        self.status.is_success()
    }

    fn exit_code(&self) -> Option<i32> {
        self.status.exit_code()
    }

    fn end_signal(&self) -> Option<i32> {
        self.status.end_signal()
    }
}

/// Render a shell command line for logs and error messages, keeping it on one line.
pub fn render_command_line(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    use std::process::Command;

    #[test]
    fn test_explain_exit() {
        let output = Command::new("true").output().unwrap();
        assert!(output.is_success());
        assert_eq!(output.exit_code(), Some(0));
        assert_eq!(output.end_signal(), None);
        assert_eq!(output.explain_exit(), "exited with status: 0");

        let output = Command::new("bash")
            .arg("-c")
            .arg("exit 123")
            .output()
            .expect("Failed to start bash");
        assert!(!output.is_success());
        assert_eq!(output.exit_code(), Some(123));
        assert_eq!(output.explain_exit(), "exited with status: 123");

        let status = Command::new("bash")
            .arg("-c")
            .arg("kill -9 $$")
            .status()
            .expect("Failed to start bash");
        assert!(!status.is_success());
        assert_eq!(status.exit_code(), None);
        assert_eq!(status.end_signal(), Some(9));
        assert_eq!(status.explain_exit(), "was terminated by signal: 9");
    }

    #[test]
    fn test_render_command_line() {
        assert_eq!(render_command_line("echo   something"), "echo something");
        assert_eq!(
            render_command_line("bin/build clean-example\n  build-example EXAMPLE=x.c"),
            "bin/build clean-example build-example EXAMPLE=x.c"
        );
    }
}
