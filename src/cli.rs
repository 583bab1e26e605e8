use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::{language::Language, render::RenderMode};

#[derive(Parser, Debug)]
#[clap(version, about = "Generate the SWIG 101 README from live example runs")]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(
        global = true,
        short,
        long,
        env = "SWIGDOC_VERBOSITY",
        default_value_t = LevelFilter::Info
    )]
    pub verbosity: LevelFilter,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and run every example, then render the document
    Generate(GenerateOpts),

    /// Normalize a captured build log
    ///
    /// Reads from stdin when no file is given.
    Normalize {
        /// Captured log
        input: Option<PathBuf>,

        /// Configuration file
        #[clap(short, long)]
        config: Option<PathBuf>,
    },

    /// Print a line-numbered listing of a source file
    Annotate {
        /// Source file
        file: PathBuf,

        /// Language of the file, when it cannot be told from the suffix
        #[clap(short, long)]
        lang: Option<Language>,
    },

    /// Print the effective configuration as YAML
    Config {
        /// Configuration file
        #[clap(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct GenerateOpts {
    /// Configuration file
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Optional output file
    ///
    /// If not specified, will print to stdout.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Template to render instead of the configured or built-in one
    #[clap(short, long)]
    pub template: Option<PathBuf>,

    /// Output flavor
    #[clap(long, value_enum, env = "SWIGDOC_MODE", default_value_t = RenderMode::Markdown)]
    pub mode: RenderMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "swigdoc",
            "-v",
            "debug",
            "generate",
            "--mode",
            "markdeep",
            "-o",
            "README.md",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, LevelFilter::Debug);
        match cli.command {
            Commands::Generate(opts) => {
                assert_eq!(opts.mode, RenderMode::Markdeep);
                assert_eq!(opts.output, Some(PathBuf::from("README.md")));
                assert_eq!(opts.config, None);
            }
            c => panic!("Unexpected command: {c:?}"),
        }
    }

    #[test]
    fn test_parse_annotate_lang() {
        let cli = Cli::try_parse_from(["swigdoc", "annotate", "x.i", "--lang", "C++"]).unwrap();
        match cli.command {
            Commands::Annotate { file, lang } => {
                assert_eq!(file, PathBuf::from("x.i"));
                assert_eq!(lang, Some(Language::Cpp));
            }
            c => panic!("Unexpected command: {c:?}"),
        }

        Cli::try_parse_from(["swigdoc", "annotate", "x.i", "--lang", "cobol"]).unwrap_err();
    }
}
