//! Nested invocation through the build tool. Kept in its own test binary because it sets
//! a process-wide environment variable.

use indoc::indoc;
use osutils::{files::write_file_mode, shell::RECURSION_GUARD};

use swigdoc::{RenderMode, Settings};

#[test]
fn test_nested_generate_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_file_mode(
        root.join("bin/build"),
        indoc! {r#"
            #!/bin/sh
            touch "$(dirname "$0")/../built"
        "#},
        0o755,
    )
    .unwrap();
    write_file_mode(root.join("src/example1.c"), "int x;\n", 0o644).unwrap();

    let settings = Settings {
        examples: vec!["example1.c".into()],
        ..Settings::default()
    };

    std::env::set_var(RECURSION_GUARD, "1");
    assert!(swigdoc::recursion_guarded());

    let doc = swigdoc::generate_unless_nested(&settings, RenderMode::Markdown, root).unwrap();
    assert_eq!(doc, None);
    assert!(!root.join("built").exists(), "The build tool must not run");
    assert!(!root.join(&settings.scratch_file).exists());

    std::env::remove_var(RECURSION_GUARD);
    assert!(!swigdoc::recursion_guarded());
}
