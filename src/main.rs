use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Error};
use clap::Parser;
use log::info;

use osutils::files;
use swigdoc::{
    annotate::annotate,
    cli::{Cli, Commands, GenerateOpts},
    language::Language,
    normalize::Normalizer,
    Settings,
};

fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(cli.verbosity)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Generate(opts) => generate(opts).context("Failed to generate document"),
        Commands::Normalize { input, config } => {
            normalize(input, config).context("Failed to normalize output")
        }
        Commands::Annotate { file, lang } => {
            print_listing(&file, lang).context("Failed to annotate source")
        }
        Commands::Config { config } => {
            let settings = Settings::load(config.as_deref())?;
            print!("{}", serde_yaml::to_string(&settings)?);
            Ok(())
        }
    }
}

fn generate(opts: GenerateOpts) -> Result<(), Error> {
    let mut settings = Settings::load(opts.config.as_deref())?;
    if opts.template.is_some() {
        settings.template = opts.template;
    }

    let root = std::env::current_dir().context("Failed to get current directory")?;
    info!("Generating {} document from '{}'", opts.mode, root.display());
    match swigdoc::generate_unless_nested(&settings, opts.mode, &root)? {
        Some(doc) => write_output(opts.output.as_deref(), &doc),
        // The build tool invoked us again while documenting itself.
        None => Ok(()),
    }
}

fn normalize(input: Option<PathBuf>, config: Option<PathBuf>) -> Result<(), Error> {
    let settings = Settings::load(config.as_deref())?;
    let root = std::env::current_dir().context("Failed to get current directory")?;
    let normalizer = Normalizer::new(settings.wrap_width, &settings.env_folding(&root))?;

    let raw = match input {
        Some(path) => {
            let bytes = std::fs::read(&path)
                .context(format!("Failed to read '{}'", path.display()))?;
            files::decode_captured(&bytes)
        }
        None => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("Failed to read stdin")?;
            files::decode_captured(&bytes)
        }
    };

    write_output(None, &normalizer.normalize(&raw))
}

fn print_listing(file: &Path, lang: Option<Language>) -> Result<(), Error> {
    let lang = match lang {
        Some(lang) => lang,
        None => match file
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Language::from_suffix)
        {
            Some(lang) => lang,
            None => bail!(
                "Cannot tell the language of '{}', use --lang",
                file.display()
            ),
        },
    };

    let bytes = std::fs::read(file).context(format!("Failed to read '{}'", file.display()))?;
    write_output(None, &annotate(&String::from_utf8_lossy(&bytes), lang))
}

/// Write `doc` to `output`, or to stdout when no file is given.
fn write_output(output: Option<&Path>, doc: &str) -> Result<(), Error> {
    match output {
        Some(path) => {
            let mut file = files::create_file(path)?;
            file.write_all(doc.as_bytes())
                .context(format!("Failed to write '{}'", path.display()))?;
            info!("Wrote '{}'", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(doc.as_bytes())?;
            if !doc.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}
