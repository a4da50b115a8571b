// src/main.rs
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use whatsnu::changelog::{self, Options};
use whatsnu::extractors::{MatchConfig, Pattern};
use whatsnu::markdown::Field;
use whatsnu::render::{ColorMode, RendererOptions};

/// Show what changed in the current version of a package
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print recent changes to terminal
    WhatsNew(WhatsNewArgs),
}

#[derive(clap::Args, Debug)]
struct WhatsNewArgs {
    /// Directory (or file) inside the package; defaults to the current directory
    #[arg(long, env = "WHATSNU_DIR")]
    dir: Option<PathBuf>,

    /// Changelog path, relative to the package descriptor
    #[arg(long, env = "WHATSNU_CHANGELOG", default_value = changelog::DEFAULT_CHANGELOG)]
    changelog: PathBuf,

    /// Field a version heading must have, as KEY=VALUE (repeatable or comma-separated; replaces type=heading, depth=2)
    #[arg(long = "match", value_name = "KEY=VALUE", env = "WHATSNU_MATCH", value_delimiter = ',')]
    matches: Vec<String>,

    /// Block field searched for the version
    #[arg(long, env = "WHATSNU_VERSION_FIELD", default_value = "text")]
    version_field: Field,

    /// Markdown printed before the changes
    #[arg(long, env = "WHATSNU_HEADER")]
    header: Option<String>,

    /// Markdown printed after the changes
    #[arg(long, env = "WHATSNU_FOOTER")]
    footer: Option<String>,

    /// Spaces per indentation level
    #[arg(long, env = "WHATSNU_TAB", default_value = "2")]
    tab: usize,

    /// Width for rules and reflowed text
    #[arg(long, env = "WHATSNU_WIDTH", default_value = "80")]
    width: usize,

    /// Re-wrap paragraphs to --width
    #[arg(long, env = "WHATSNU_REFLOW")]
    reflow: bool,

    /// When to emit ANSI colors
    #[arg(long, value_enum, env = "WHATSNU_COLOR", default_value_t = ColorArg::Auto)]
    color: ColorArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorMode {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => ColorMode::Auto,
            ColorArg::Always => ColorMode::Always,
            ColorArg::Never => ColorMode::Never,
        }
    }
}

impl WhatsNewArgs {
    /// Turns flags into library options; bad `--match` entries become usage errors.
    fn options(&self) -> Result<Options, clap::Error> {
        let pattern = if self.matches.is_empty() {
            Pattern::default()
        } else {
            Pattern::from_entries(&self.matches).map_err(|e| {
                clap::Error::raw(clap::error::ErrorKind::ValueValidation, format!("{}\n", e))
            })?
        };

        Ok(Options {
            changelog: self.changelog.clone(),
            matching: MatchConfig {
                pattern,
                version_field: self.version_field,
                header: self.header.clone(),
                footer: self.footer.clone(),
            },
            renderer: RendererOptions {
                tab: self.tab,
                width: self.width,
                reflow: self.reflow,
                colors: self.color.into(),
            },
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Setup Logging (reads RUST_LOG env var)
    whatsnu::utils::logging::setup_logging("warn");

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::debug!("Parsed args: {:?}", cli);

    match cli.command {
        Command::WhatsNew(args) => {
            let options = match args.options() {
                Ok(options) => options,
                Err(e) => e.exit(),
            };
            let start = args.dir.clone().unwrap_or_else(|| PathBuf::from("."));

            // 3. Resolve, read, extract, render
            match changelog::run(&start, &options).await {
                Ok(whats_new) => {
                    tracing::debug!(
                        "Rendered changes for {} from {} (section found: {})",
                        whats_new.version,
                        whats_new.changelog.display(),
                        whats_new.section_found
                    );
                    println!("{}", whats_new.changes);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
