use andw_lightbox::{config, output};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "andw-lightbox")]
#[command(about = "Lightbox settings and stylesheet tooling")]
#[command(long_about = "\
Lightbox settings and stylesheet tooling

The lightbox engine reads a settings snapshot the host injects as JSON.
Site operators can keep the same settings as TOML, validate them, and
generate the CSS fragment the overlay and trigger thumbnails need.

Settings files (TOML or .json):

  defaultAnimation = \"zoom\"     # slide | fade | zoom | none
  galleryAnimation = \"slide\"
  observer = false
  [hover]
  effect = \"darken\"             # none | darken | lighten | transparent
  strength = 30                  # 0-100
  [design]
  maxWidth = \"90vw\"
  overlayColor = \"#000000\"
  overlayOpacity = \"0.85\"

Run 'andw-lightbox gen-config' to generate a documented settings file.")]
#[command(version)]
struct Cli {
    /// Diagnostic log level
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock settings file with all options documented
    GenConfig,
    /// Validate a settings file and print the normalized snapshot
    Check {
        /// TOML or JSON settings file
        file: PathBuf,
    },
    /// Print the CSS generated from a settings file
    Css {
        /// TOML or JSON settings file
        file: PathBuf,
    },
    /// Print the overlay class contract and markup skeleton
    Classes,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Check { file } => {
            println!("==> Checking {}", file.display());
            let settings = config::load_settings(&file)?;
            settings.validate()?;
            output::print_settings(&settings);
            println!("==> Settings are valid");
        }
        Command::Css { file } => {
            let settings = config::load_settings(&file)?.normalized();
            println!("{}", config::generate_hover_css(&settings));
            let design = config::generate_design_css(&settings.design);
            if !design.is_empty() {
                println!();
                println!("{design}");
            }
        }
        Command::Classes => {
            output::print_class_contract();
        }
    }

    Ok(())
}
