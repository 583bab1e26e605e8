use std::path::Path;

use anyhow::{Context, Error};
use log::debug;
use osutils::shell::{self, ShellError, ShellRunner};

use crate::config::Settings;

/// Something that can execute a command line and hand back its output.
pub trait CommandRunner {
    fn run(&mut self, command: &str) -> Result<String, ShellError>;
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> Result<String, ShellError> {
        ShellRunner::run(self, command)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for &mut T {
    fn run(&mut self, command: &str) -> Result<String, ShellError> {
        (**self).run(command)
    }
}

/// Make sure the programs behind the build commands exist before anything runs.
pub fn preflight(settings: &Settings, root: &Path) -> Result<(), Error> {
    for command in [&settings.clean_command, &settings.build_command] {
        let found = shell::require_program(command, root)
            .context(format!("Cannot run '{command}'"))?;
        debug!("Using '{}' for '{command}'", found.display());
    }
    Ok(())
}
