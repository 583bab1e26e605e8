use std::path::PathBuf;

use osutils::shell::ShellError;

use crate::context::RunContext;

#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("Command '{command}' failed while processing {context}:\n{output}")]
    CommandFailed {
        command: String,
        context: RunContext,
        output: String,
        #[source]
        source: ShellError,
    },

    #[error("Failed to read '{}' while processing {context}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        context: RunContext,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to search for '{pattern}' while processing {context}: {message}")]
    Discover {
        pattern: String,
        context: RunContext,
        message: String,
    },

    #[error("Cannot infer a language from '{label}' while processing {context}")]
    UnknownLanguage { label: String, context: RunContext },
}

impl DocError {
    pub fn command_failed(command: &str, context: &RunContext, source: ShellError) -> Self {
        DocError::CommandFailed {
            command: command.into(),
            context: context.clone(),
            output: source.output().unwrap_or_default().into(),
            source,
        }
    }

    pub fn context(&self) -> &RunContext {
        match self {
            DocError::CommandFailed { context, .. }
            | DocError::ReadSource { context, .. }
            | DocError::Discover { context, .. }
            | DocError::UnknownLanguage { context, .. } => context,
        }
    }
}
