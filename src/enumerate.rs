//! Walks every example and target, collecting listings and cleaned output.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::Serialize;

use crate::{
    annotate::{annotate, trim_blank_text},
    config::{expand, RunPolicy, Settings, TargetSpec},
    context::RunContext,
    error::DocError,
    language::Language,
    normalize::Normalizer,
    runner::CommandRunner,
};

/// One example program and everything generated around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub name: String,
    pub basename: String,
    pub suffix: String,
    pub lang: Language,
    pub fence: &'static str,
    pub src: String,
    pub workflow_command: String,
    pub workflow_output: String,
    pub targets: Vec<Target>,
}

/// A documentation row for one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub kind: String,
    pub name: String,
    pub lang: Language,
    pub fence: &'static str,
    pub comment: &'static str,
    pub run: RunPolicy,
    /// Files found on disk. Empty when the example has no such file.
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    /// Whether this is the file named by the target rather than a discovered variant.
    pub primary: bool,
    pub code: String,
    pub run: Option<String>,
    pub run_output: Option<String>,
}

/// A target row with every placeholder filled in for one example.
struct ResolvedTarget {
    kind: String,
    file: String,
    run: RunPolicy,
    lang: String,
}

/// Builds [`Example`] records by running the configured commands in order.
pub struct Generator<'a, R> {
    settings: &'a Settings,
    normalizer: &'a Normalizer,
    runner: R,
    root: PathBuf,
}

impl<'a, R: CommandRunner> Generator<'a, R> {
    pub fn new(
        settings: &'a Settings,
        normalizer: &'a Normalizer,
        runner: R,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            settings,
            normalizer,
            runner,
            root: root.into(),
        }
    }

    /// Clean the tree once, then document every configured example.
    pub fn generate(&mut self) -> Result<Vec<Example>, DocError> {
        let settings = self.settings;
        info!("Cleaning build artifacts");
        self.run(&settings.clean_command, &RunContext::default())?;

        let mut examples = Vec::with_capacity(settings.examples.len());
        for name in &settings.examples {
            examples.push(self.example(name)?);
        }

        info!("Documented {} example(s)", examples.len());
        Ok(examples)
    }

    /// Build one example and collect all of its targets.
    pub fn example(&mut self, name: &str) -> Result<Example, DocError> {
        let settings = self.settings;
        let context = RunContext::example(name);
        let (basename, suffix) = name.rsplit_once('.').unwrap_or((name, ""));
        let lang = Language::from_suffix(suffix).ok_or_else(|| DocError::UnknownLanguage {
            label: name.into(),
            context: context.clone(),
        })?;

        info!("Building example '{name}'");
        let workflow_command = settings.build_command_for(name);
        let workflow_output = self.run(&workflow_command, &context)?;

        let lang_name = lang.to_string();
        let vars = [
            ("name", name),
            ("basename", basename),
            ("suffix", suffix),
            ("lang", lang_name.as_str()),
        ];
        let rows: Vec<ResolvedTarget> = settings
            .targets
            .iter()
            .map(|spec| resolve(spec, &vars))
            .collect();

        // A file named by one row is never picked up as a variant of another.
        let claimed: HashSet<&str> = rows.iter().map(|row| row.file.as_str()).collect();

        let mut targets = Vec::with_capacity(rows.len());
        for row in &rows {
            targets.push(self.target(row, &claimed, &context)?);
        }

        Ok(Example {
            name: name.into(),
            basename: basename.into(),
            suffix: suffix.into(),
            lang,
            fence: lang.fence(),
            src: settings.src_dir.join(name).to_string_lossy().into_owned(),
            workflow_command,
            workflow_output,
            targets,
        })
    }

    fn target(
        &mut self,
        row: &ResolvedTarget,
        claimed: &HashSet<&str>,
        context: &RunContext,
    ) -> Result<Target, DocError> {
        let context = context.with_target(&row.kind);
        let lang = Language::infer(&row.lang).ok_or_else(|| DocError::UnknownLanguage {
            label: row.lang.clone(),
            context: context.clone(),
        })?;

        let mut files = Vec::new();
        for (name, primary) in self.discover(row, claimed, &context)? {
            files.push(self.file_record(row, &name, primary, lang, &context)?);
        }
        if !files.is_empty() {
            info!("  {}: {} file(s)", row.kind, files.len());
        }

        Ok(Target {
            kind: row.kind.clone(),
            name: row.file.clone(),
            lang,
            fence: lang.fence(),
            comment: lang.comment_token(),
            run: row.run.clone(),
            files,
        })
    }

    /// The target's own file, if present, followed by `{stem}-*.{ext}` variants.
    fn discover(
        &self,
        row: &ResolvedTarget,
        claimed: &HashSet<&str>,
        context: &RunContext,
    ) -> Result<Vec<(String, bool)>, DocError> {
        let src = self.root.join(&self.settings.src_dir);
        let mut found = Vec::new();

        if src.join(&row.file).is_file() {
            found.push((row.file.clone(), true));
        } else {
            debug!("No '{}' for {context}", row.file);
        }

        let file = Path::new(&row.file);
        let (Some(stem), Some(ext)) = (
            file.file_stem().and_then(|s| s.to_str()),
            file.extension().and_then(|s| s.to_str()),
        ) else {
            return Ok(found);
        };
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => src.join(parent),
            _ => src.clone(),
        };
        let pattern = format!(
            "{}/{}-*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            glob::Pattern::escape(stem),
            glob::Pattern::escape(ext),
        );

        let discover_error = |message: String| DocError::Discover {
            pattern: pattern.clone(),
            context: context.clone(),
            message,
        };
        for entry in glob::glob(&pattern).map_err(|e| discover_error(e.to_string()))? {
            let path = entry.map_err(|e| discover_error(e.to_string()))?;
            let Some(name) = path.strip_prefix(&src).ok().and_then(|p| p.to_str()) else {
                continue;
            };
            if path.is_file() && !claimed.contains(name) {
                found.push((name.to_string(), false));
            }
        }

        Ok(found)
    }

    fn file_record(
        &mut self,
        row: &ResolvedTarget,
        name: &str,
        primary: bool,
        lang: Language,
        context: &RunContext,
    ) -> Result<FileRecord, DocError> {
        let settings = self.settings;
        let relative = settings.src_dir.join(name);
        let path = relative.to_string_lossy().into_owned();
        let context = context.with_file(&path);

        let absolute = self.root.join(&relative);
        let bytes = std::fs::read(&absolute).map_err(|source| DocError::ReadSource {
            path: absolute.clone(),
            context: context.clone(),
            source,
        })?;
        let code = annotate(&String::from_utf8_lossy(&bytes), lang);

        let run = match &row.run {
            RunPolicy::Skip => None,
            RunPolicy::Direct => Some(settings.run_command_for(&path)),
            RunPolicy::Command(cmd) if primary => Some(expand(cmd, &[("file", path.as_str())])),
            RunPolicy::Command(_) => None,
        };
        let run_output = match &run {
            Some(cmd) => Some(self.run(cmd, &context)?),
            None => None,
        };

        Ok(FileRecord {
            name: name.into(),
            path,
            primary,
            code,
            run,
            run_output,
        })
    }

    /// Run `command` and return its normalized output.
    fn run(&mut self, command: &str, context: &RunContext) -> Result<String, DocError> {
        debug!("Running '{command}' for {context}");
        let raw = self
            .runner
            .run(command)
            .map_err(|e| DocError::command_failed(command, context, e))?;
        Ok(trim_blank_text(&self.normalizer.normalize(&raw)))
    }
}

fn resolve(spec: &TargetSpec, vars: &[(&str, &str)]) -> ResolvedTarget {
    let kind = expand(&spec.kind, vars);
    ResolvedTarget {
        file: expand(&spec.file, vars),
        run: match &spec.run {
            RunPolicy::Command(cmd) => RunPolicy::Command(expand(cmd, vars)),
            other => other.clone(),
        },
        lang: spec
            .lang
            .as_deref()
            .map(|lang| expand(lang, vars))
            .unwrap_or_else(|| kind.clone()),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;
    use osutils::shell::ShellError;

    use crate::normalize::EnvFolding;

    /// Records commands and answers with canned output.
    #[derive(Default)]
    struct MockRunner {
        calls: Vec<String>,
        fail_on: Option<String>,
    }

    impl CommandRunner for MockRunner {
        fn run(&mut self, command: &str) -> Result<String, ShellError> {
            self.calls.push(command.into());
            if self.fail_on.as_deref() == Some(command) {
                return Err(ShellError::Failed {
                    command: command.into(),
                    explanation: "exited with status: 2".into(),
                    output: "boom\n".into(),
                });
            }
            Ok(format!("\n\n{command}\n/opt/project//src   ok\n\n\n"))
        }
    }

    fn write(root: &Path, name: &str, contents: &str) {
        let path = root.join("src").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "example1.c", "#include \"example1.h\"\n\ndouble cube(double x) { return x * x * x; }\n");
        write(root, "example1.h", "#pragma once\ndouble cube(double x);\n");
        write(root, "example1.i", "%module example1_swig\n%include \"example1.h\"\n");
        write(
            root,
            "example1.py",
            indoc! {"
                #!/usr/bin/env python3
                from example1_swig import *
                print(cube(2.0))
            "},
        );
        write(root, "example1-2.py", "print('variant')\n");
        write(root, "example1-test.py", "def test_cube():\n    assert True\n");
        write(root, "notes.txt", "not an example file\n");
        dir
    }

    fn settings() -> Settings {
        Settings {
            examples: vec!["example1.c".into()],
            ..Settings::default()
        }
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(78, &EnvFolding::new([("SWIG_101_DIR", "/opt/project")])).unwrap()
    }

    #[test]
    fn test_generate_collects_targets() {
        let dir = project();
        let settings = settings();
        let normalizer = normalizer();
        let mut runner = MockRunner::default();

        let examples = Generator::new(&settings, &normalizer, &mut runner, dir.path())
            .generate()
            .unwrap();

        assert_eq!(
            runner.calls,
            vec![
                "bin/build clean",
                "bin/build clean-example build-example EXAMPLE=example1.c",
                "bin/run src/example1.py",
                "bin/run src/example1-2.py",
                "python3 -m pytest src/example1-test.py",
            ]
        );

        assert_eq!(examples.len(), 1);
        let example = &examples[0];
        assert_eq!(example.basename, "example1");
        assert_eq!(example.suffix, "c");
        assert_eq!(example.lang, Language::C);
        assert_eq!(example.src, "src/example1.c");
        assert_eq!(
            example.workflow_output,
            "bin/build clean-example build-example EXAMPLE=example1.c\n$SWIG_101_DIR/src ok"
        );

        let kinds: Vec<&str> = example.targets.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(
            kinds,
            [
                "C Header",
                "C Library",
                "C Main",
                "C SWIG Interface",
                "Python",
                "Clojure (Java)",
                "Ruby",
                "Guile",
                "TCL",
                "PostgreSQL",
                "Python Tests",
            ]
        );

        let header = &example.targets[0];
        assert_eq!(header.files.len(), 1);
        assert_eq!(header.files[0].code, "double cube(double x);  // 1");
        assert_eq!(header.files[0].run, None);

        let main = &example.targets[2];
        assert_eq!(main.name, "example1-native.c");
        assert!(main.files.is_empty());

        let swig = &example.targets[3];
        assert_eq!(swig.lang, Language::C);
        assert_eq!(swig.comment, "//");

        let python = &example.targets[4];
        let names: Vec<&str> = python.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["example1.py", "example1-2.py"]);
        assert!(python.files[0].primary);
        assert!(!python.files[1].primary);
        assert_eq!(
            python.files[0].code,
            "from example1_swig import *  # 1\nprint(cube(2.0))             # 2"
        );
        assert_eq!(
            python.files[0].run_output.as_deref(),
            Some("bin/run src/example1.py\n$SWIG_101_DIR/src ok")
        );

        let clojure = &example.targets[5];
        assert_eq!(clojure.lang, Language::Lisp);
        assert_eq!(clojure.comment, ";;");
        assert!(clojure.files.is_empty());

        let tests = &example.targets[10];
        assert_eq!(tests.files.len(), 1);
        assert_eq!(
            tests.files[0].run.as_deref(),
            Some("python3 -m pytest src/example1-test.py")
        );
    }

    #[test]
    fn test_generate_is_repeatable() {
        let dir = project();
        let settings = settings();
        let normalizer = normalizer();

        let first = Generator::new(&settings, &normalizer, MockRunner::default(), dir.path())
            .generate()
            .unwrap();
        let second = Generator::new(&settings, &normalizer, MockRunner::default(), dir.path())
            .generate()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_failure_carries_context() {
        let dir = project();
        let settings = settings();
        let normalizer = normalizer();
        let mut runner = MockRunner {
            fail_on: Some("bin/run src/example1-2.py".into()),
            ..Default::default()
        };

        let err = Generator::new(&settings, &normalizer, &mut runner, dir.path())
            .generate()
            .unwrap_err();

        assert_eq!(
            err.context(),
            &RunContext {
                example: Some("example1.c".into()),
                target: Some("Python".into()),
                file: Some("src/example1-2.py".into()),
            }
        );
        match &err {
            DocError::CommandFailed {
                command, output, ..
            } => {
                assert_eq!(command, "bin/run src/example1-2.py");
                assert_eq!(output, "boom\n");
            }
            e => panic!("Unexpected error: {e:?}"),
        }
        assert!(err.to_string().contains("target 'Python'"));

        // Nothing runs after the failure.
        assert_eq!(runner.calls.last().unwrap(), "bin/run src/example1-2.py");
    }

    #[test]
    fn test_unknown_example_suffix() {
        let dir = project();
        let settings = Settings {
            examples: vec!["example1.f90".into()],
            ..Settings::default()
        };
        let normalizer = normalizer();
        let err = Generator::new(&settings, &normalizer, MockRunner::default(), dir.path())
            .generate()
            .unwrap_err();
        assert!(matches!(err, DocError::UnknownLanguage { ref label, .. } if label == "example1.f90"));
    }

    #[test]
    fn test_unknown_target_language() {
        let dir = project();
        let settings = Settings {
            examples: vec!["example1.c".into()],
            targets: vec![TargetSpec::new("Notes", "notes.txt", RunPolicy::Skip, None)],
            ..Settings::default()
        };
        let normalizer = normalizer();
        let err = Generator::new(&settings, &normalizer, MockRunner::default(), dir.path())
            .generate()
            .unwrap_err();
        assert_eq!(err.context().target.as_deref(), Some("Notes"));
    }

    #[test]
    fn test_resolve() {
        let spec = TargetSpec::new(
            "{lang} Main",
            "{basename}-native.{suffix}",
            RunPolicy::Command("target/native/{basename} {file}".into()),
            None,
        );
        let row = resolve(
            &spec,
            &[
                ("name", "polynomial.cc"),
                ("basename", "polynomial"),
                ("suffix", "cc"),
                ("lang", "C++"),
            ],
        );
        assert_eq!(row.kind, "C++ Main");
        assert_eq!(row.file, "polynomial-native.cc");
        assert_eq!(row.lang, "C++ Main");
        assert_eq!(
            row.run,
            RunPolicy::Command("target/native/polynomial {file}".into())
        );
    }
}
