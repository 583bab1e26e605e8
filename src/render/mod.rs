use std::path::Path;

use anyhow::{Context, Error};
use log::debug;
use strum_macros::{Display, EnumString};
use tera::{Context as TeraCxt, Tera};

use crate::enumerate::Example;

mod tera_extensions;

const TEMPLATE_NAME: &str = "README.md";
const DEFAULT_TEMPLATE: &str = include_str!("templates/README.md.tera");

/// Output flavor of the generated document.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum RenderMode {
    /// Plain Markdown.
    #[default]
    Markdown,

    /// Markdown with the Markdeep prologue and script so it renders in a browser.
    Markdeep,
}

/// Renders collected examples into the final document.
pub struct Renderer {
    tera: Tera,
    mode: RenderMode,
}

impl Renderer {
    /// Use the template at `template`, or the built-in one when `None`.
    pub fn new(mode: RenderMode, template: Option<&Path>) -> Result<Self, Error> {
        let mut tera = Tera::default();
        // The output is Markdown, not HTML.
        tera.autoescape_on(vec![]);

        match template {
            Some(path) => {
                debug!("Loading template from '{}'", path.display());
                tera.add_template_file(path, Some(TEMPLATE_NAME))
                    .context(format!("Failed to load template '{}'", path.display()))?;
            }
            None => tera
                .add_raw_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)
                .context("Failed to load built-in template")?,
        }

        tera.register_filter("code_block", tera_extensions::code_block);
        tera.register_filter("anchor", tera_extensions::anchor);

        Ok(Self { tera, mode })
    }

    pub fn render(&self, examples: &[Example]) -> Result<String, Error> {
        let mut context = TeraCxt::new();
        context.insert("examples", examples);
        context.insert("markdeep", &(self.mode == RenderMode::Markdeep));
        context.insert(
            "generated_by",
            concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
        );

        self.tera
            .render(TEMPLATE_NAME, &context)
            .context(format!("Failed to render {} document", self.mode))
    }
}
