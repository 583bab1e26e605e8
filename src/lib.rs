use std::path::Path;

use anyhow::{Context, Error};
use log::{info, warn};
use osutils::shell::{ShellRunner, RECURSION_GUARD};

pub mod annotate;
pub mod cli;
pub mod config;
pub mod context;
pub mod enumerate;
pub mod error;
pub mod language;
pub mod normalize;
pub mod render;
pub mod runner;

pub use config::Settings;
pub use enumerate::{Example, FileRecord, Generator, Target};
pub use error::DocError;
pub use render::{RenderMode, Renderer};

/// Whether this process was started by a build that another `generate` is driving.
pub fn recursion_guarded() -> bool {
    std::env::var_os(RECURSION_GUARD).is_some()
}

/// Like [`generate`], but returns `None` without running anything when invoked from
/// inside another generation run.
pub fn generate_unless_nested(
    settings: &Settings,
    mode: RenderMode,
    root: &Path,
) -> Result<Option<String>, Error> {
    if recursion_guarded() {
        warn!("{RECURSION_GUARD} is set, refusing to run recursively");
        return Ok(None);
    }
    generate(settings, mode, root).map(Some)
}

/// Build, run and document every example under `root`, returning the rendered document.
pub fn generate(settings: &Settings, mode: RenderMode, root: &Path) -> Result<String, Error> {
    runner::preflight(settings, root)?;

    let folding = settings.env_folding(root);
    info!(
        "Folding {} environment value(s) out of captured output",
        folding.vars().len()
    );
    let normalizer = normalize::Normalizer::new(settings.wrap_width, &folding)
        .context("Failed to set up output normalization")?;

    // Load the template before spending time on builds.
    let renderer = Renderer::new(mode, settings.template.as_deref())?;

    let runner = ShellRunner::new(root.join(&settings.scratch_file))
        .with_dir(root)
        .with_env(&settings.project_root_var, settings.project_root(root));
    let examples = Generator::new(settings, &normalizer, runner, root).generate()?;

    renderer.render(&examples)
}
