use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

/// Where the generator is in its walk, reported with every failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub example: Option<String>,
    pub target: Option<String>,
    pub file: Option<String>,
}

impl RunContext {
    pub fn example(name: &str) -> Self {
        Self {
            example: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_target(&self, target: &str) -> Self {
        Self {
            target: Some(target.into()),
            file: None,
            ..self.clone()
        }
    }

    pub fn with_file(&self, file: &str) -> Self {
        Self {
            file: Some(file.into()),
            ..self.clone()
        }
    }
}

impl Display for RunContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let parts = [
            ("example", &self.example),
            ("target", &self.target),
            ("file", &self.file),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label} '{v}'")))
        .collect::<Vec<_>>();

        if parts.is_empty() {
            write!(f, "setup")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}
