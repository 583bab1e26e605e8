use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Error};
use serde::{Deserialize, Serialize};

use crate::normalize::{EnvFolding, MIN_WIDTH};

/// Environment variable holding the project root.
pub const PROJECT_ROOT_VAR: &str = "SWIG_101_DIR";

/// Full configuration of a documentation run.
///
/// Every field has a default, so an empty file (or no file at all) describes the stock
/// tutorial layout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Example programs to document, as file names under `src-dir`.
    pub examples: Vec<String>,

    /// Directory holding example sources and per-language scripts.
    pub src_dir: PathBuf,

    /// Command that removes every build artifact. Run once before the first example.
    pub clean_command: String,

    /// Command that builds one example. `{name}` is replaced with the example file name.
    pub build_command: String,

    /// Command that executes a script directly. `{file}` is replaced with its path.
    pub run_command: String,

    /// File that receives the combined output of every command.
    pub scratch_file: PathBuf,

    /// Column at which captured output is wrapped.
    pub wrap_width: usize,

    /// Variables whose values are folded into `$NAME` placeholders in captured output.
    pub env_vars: Vec<String>,

    /// Variable naming the project root. Defaults to the working directory when unset.
    pub project_root_var: String,

    /// Documentation rows generated for each example.
    pub targets: Vec<TargetSpec>,

    /// Template used to render the document instead of the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            examples: ["example1.c", "polynomial.cc", "polynomial_v2.cc", "tommath.c"]
                .into_iter()
                .map(String::from)
                .collect(),
            src_dir: "src".into(),
            clean_command: "bin/build clean".into(),
            build_command: "bin/build clean-example build-example EXAMPLE={name}".into(),
            run_command: "bin/run {file}".into(),
            scratch_file: "tmp/cmd.out".into(),
            wrap_width: 78,
            env_vars: [
                "PYTHON_HOME",
                "RUBY_HOME",
                "GUILE_HOME",
                "JAVA_HOME",
                "CLOJURE_HOME",
                "TCL_HOME",
                "POSTGRESQL_HOME",
                "HOME",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            project_root_var: PROJECT_ROOT_VAR.into(),
            targets: TargetSpec::default_table(),
            template: None,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file, or use the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let settings = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .context(format!("Failed to read config file '{}'", path.display()))?;
                serde_yaml::from_str(&contents)
                    .context(format!("Failed to parse config file '{}'", path.display()))?
            }
            None => Settings::default(),
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Error> {
        ensure!(
            self.wrap_width >= MIN_WIDTH,
            "wrap-width must be at least {MIN_WIDTH}, got {}",
            self.wrap_width
        );
        ensure!(
            !self.clean_command.trim().is_empty(),
            "clean-command must not be empty"
        );
        ensure!(
            !self.build_command.trim().is_empty(),
            "build-command must not be empty"
        );
        for name in &self.examples {
            ensure!(
                Path::new(name).extension().is_some(),
                "Example '{name}' has no file suffix"
            );
        }
        Ok(())
    }

    /// Value of the project root variable, or `root` when it is unset.
    pub fn project_root(&self, root: &Path) -> String {
        std::env::var(&self.project_root_var)
            .unwrap_or_else(|_| root.to_string_lossy().into_owned())
    }

    /// Values to fold out of captured output, read from the current environment.
    pub fn env_folding(&self, root: &Path) -> EnvFolding {
        EnvFolding::from_env(
            &self.env_vars,
            &self.project_root_var,
            &self.project_root(root),
        )
    }

    /// Build command for one example.
    pub fn build_command_for(&self, example: &str) -> String {
        expand(&self.build_command, &[("name", example)])
    }

    /// Direct-execution command for one file.
    pub fn run_command_for(&self, file: &str) -> String {
        expand(&self.run_command, &[("file", file)])
    }
}

/// One documentation row: a file kind attached to every example.
///
/// `kind`, `file`, `run` and `lang` may use the placeholders `{name}`, `{basename}`,
/// `{suffix}` and `{lang}`. `run` may also use `{file}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TargetSpec {
    /// Display type, e.g. `{lang} Header`.
    pub kind: String,

    /// File name under the source directory.
    pub file: String,

    /// How the file is exercised.
    #[serde(default)]
    pub run: RunPolicy,

    /// Language of the listing. Inferred from the first word of `kind` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl TargetSpec {
    pub fn new(kind: &str, file: &str, run: RunPolicy, lang: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            file: file.into(),
            run,
            lang: lang.map(String::from),
        }
    }

    /// The stock rows: native sources, the SWIG interface and one row per binding.
    pub fn default_table() -> Vec<Self> {
        use RunPolicy::*;

        vec![
            Self::new("{lang} Header", "{basename}.h", Skip, None),
            Self::new("{lang} Library", "{name}", Skip, None),
            Self::new(
                "{lang} Main",
                "{basename}-native.{suffix}",
                Command("target/native/{basename}".into()),
                None,
            ),
            Self::new("{lang} SWIG Interface", "{basename}.i", Skip, Some("{lang}")),
            Self::new("Python", "{basename}.py", Direct, None),
            Self::new("Clojure (Java)", "{basename}.clj", Direct, Some("Lisp")),
            Self::new("Ruby", "{basename}.rb", Direct, None),
            Self::new("Guile", "{basename}.scm", Direct, Some("Scheme")),
            Self::new("TCL", "{basename}.tcl", Direct, None),
            Self::new("PostgreSQL", "{basename}.psql", Direct, Some("SQL")),
            Self::new(
                "Python Tests",
                "{basename}-test.py",
                Command("python3 -m pytest {file}".into()),
                None,
            ),
        ]
    }
}

/// How a target's files are run.
///
/// In YAML, `-` means the file is only listed, a missing or empty value means it is
/// executed directly, and any other string is a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum RunPolicy {
    /// Listed, never run.
    Skip,

    /// Each file is executed through the run command.
    #[default]
    Direct,

    /// The primary file is exercised by this command.
    Command(String),
}

impl From<Option<String>> for RunPolicy {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            None | Some("") => RunPolicy::Direct,
            Some("-") => RunPolicy::Skip,
            Some(cmd) => RunPolicy::Command(cmd.into()),
        }
    }
}

impl From<RunPolicy> for Option<String> {
    fn from(value: RunPolicy) -> Self {
        match value {
            RunPolicy::Skip => Some("-".into()),
            RunPolicy::Direct => None,
            RunPolicy::Command(cmd) => Some(cmd),
        }
    }
}

/// Replace each `{key}` in `template` with its value.
pub fn expand(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{key}}}"), value)
        })
}
