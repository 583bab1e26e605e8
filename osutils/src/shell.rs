use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::{
    exe::{render_command_line, ExitExplainer},
    files,
};

/// Environment variable set for every child process to stop the generator from re-entering
/// itself through the build tool.
pub const RECURSION_GUARD: &str = "_SWIG_101_README_MD";

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' {explanation}")]
    Failed {
        command: String,
        explanation: String,
        output: String,
    },

    #[error("Failed to access scratch file '{}': {source}", path.display())]
    Scratch {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Required program '{program}' could not be found: {source}")]
    MissingProgram {
        program: String,
        #[source]
        source: which::Error,
    },
}

impl ShellError {
    /// Output captured before the failure, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            ShellError::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Runs shell command lines, capturing combined stdout and stderr into a scratch file.
///
/// The scratch file is shared by every invocation and overwritten each time, so a runner
/// must only be used for one command at a time.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    scratch: PathBuf,
    dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl ShellRunner {
    pub fn new(scratch: impl Into<PathBuf>) -> Self {
        Self {
            scratch: scratch.into(),
            dir: None,
            env: vec![(RECURSION_GUARD.into(), "1".into())],
        }
    }

    /// Run commands from `dir` instead of the current directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Add a variable to the environment of every child.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run `command` through `sh -c` and return everything it printed.
    ///
    /// Fails when the process cannot be spawned or does not exit with status 0. In the
    /// latter case the error carries the captured output.
    pub fn run(&self, command: &str) -> Result<String, ShellError> {
        let rendered = render_command_line(command);
        if let Some(parent) = self.scratch.parent() {
            files::create_dirs(parent).map_err(|source| ShellError::Scratch {
                path: self.scratch.clone(),
                source,
            })?;
        }

        trace!("Executing '{rendered}'");
        let mut expression = duct::cmd!("sh", "-c", command)
            .stderr_to_stdout()
            .stdout_path(&self.scratch)
            .unchecked();
        if let Some(dir) = &self.dir {
            expression = expression.dir(dir);
        }
        for (key, value) in &self.env {
            expression = expression.env(key, value);
        }

        let result = expression.run().map_err(|source| ShellError::Spawn {
            command: command.into(),
            source,
        })?;

        let output = self.read_scratch()?;
        debug!(
            "Executed '{rendered}': {}. Output:\n{output}",
            result.explain_exit()
        );

        if !result.is_success() {
            return Err(ShellError::Failed {
                command: command.into(),
                explanation: result.explain_exit(),
                output,
            });
        }

        Ok(output)
    }

    fn read_scratch(&self) -> Result<String, ShellError> {
        let bytes = std::fs::read(&self.scratch).map_err(|e| ShellError::Scratch {
            path: self.scratch.clone(),
            source: e.into(),
        })?;
        Ok(files::decode_captured(&bytes))
    }
}

/// Locate the program that starts `command`.
///
/// Names containing a path separator are resolved against `dir`; bare names are looked up
/// on `PATH`.
pub fn require_program(command: &str, dir: &Path) -> Result<PathBuf, ShellError> {
    let program = command.split_whitespace().next().unwrap_or_default();
    which::which_in(program, std::env::var_os("PATH"), dir).map_err(|source| {
        ShellError::MissingProgram {
            program: program.into(),
            source,
        }
    })
}
