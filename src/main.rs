use clap::Parser;
use colored::Colorize;
use env_logger::Builder;
use env_logger::Env;
use log::{error, info, Level};
use std::io::Write;

use pinna::color_utils::init_color_config;
use pinna::config::{ExportCommand, ExportConfig, GlobalArgs, IdsCommand, IdsConfig};
use pinna::export_processing::run_export;
use pinna::onnx_session::MODEL_PATH_ENV_VAR;
use pinna::translation::run_identity_export;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Segment ear regions, crop them and save them under recognition filenames
    Export(ExportCommand),

    /// Generate the identity CSV from a translation table
    Ids(IdsCommand),

    /// Show version information
    Version,
}

#[derive(Parser)]
#[command(name = "pinna")]
#[command(about = "Ear segmentation export toolkit")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn get_log_level_from_verbosity(
    verbosity: clap_verbosity_flag::Verbosity<clap_verbosity_flag::ErrorLevel>,
) -> log::LevelFilter {
    let base_level = verbosity.log_level_filter();
    let adjusted_level = match base_level {
        log::LevelFilter::Off => log::LevelFilter::Off, // -qq -> OFF
        log::LevelFilter::Error => log::LevelFilter::Warn, // default -> WARN
        log::LevelFilter::Warn => log::LevelFilter::Info, // -v -> INFO
        log::LevelFilter::Info => log::LevelFilter::Debug, // -vv -> DEBUG
        log::LevelFilter::Debug => log::LevelFilter::Trace, // -vvv -> TRACE
        log::LevelFilter::Trace => log::LevelFilter::Trace, // -vvvv -> TRACE (max)
    };

    // -q maps to ERROR, which clap-verbosity-flag reports as silent
    if verbosity.is_silent() {
        log::LevelFilter::Error
    } else {
        adjusted_level
    }
}

fn main() {
    let cli = Cli::parse();

    init_color_config(cli.global.no_color);

    // If user didn't pass -v/-q and RUST_LOG is set, honor the env var.
    let use_env = !cli.global.verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();

    let mut logger = if use_env {
        Builder::from_env(Env::default())
    } else {
        let level_filter = get_log_level_from_verbosity(cli.global.verbosity.clone());

        let mut b = Builder::new();
        b.filter_level(level_filter);
        b
    };

    logger
        .format(|buf, record| {
            let level_str = match record.level() {
                Level::Error => "ERROR".red().bold().to_string(),
                Level::Warn => "WARN".yellow().to_string(),
                Level::Info => "INFO".green().to_string(),
                Level::Debug => "DEBUG".blue().to_string(),
                Level::Trace => "TRACE".magenta().to_string(),
            };
            writeln!(buf, "[{}] {}", level_str, record.args())
        })
        .init();

    match cli.command {
        Some(Commands::Export(export_cmd)) => {
            let sources_desc = if export_cmd.sources.len() == 1 {
                export_cmd.sources[0].clone()
            } else {
                format!("{} inputs", export_cmd.sources.len())
            };

            info!(
                "{} Ear export: {} | margin: {} | device: {}",
                pinna::color_utils::symbols::export_start(),
                sources_desc,
                export_cmd.margin,
                cli.global.device
            );

            // Build outputs list
            let mut outputs = vec!["cutouts"];
            if export_cmd.save_mask {
                outputs.push("masks");
            }
            info!("   Outputs: {}", outputs.join(", "));

            let internal_config = ExportConfig::from_args(cli.global, export_cmd);
            match run_export(internal_config) {
                Ok(_) => {}
                Err(e) => {
                    error!("❌ Export failed: {e:#}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Ids(ids_cmd)) => {
            info!(
                "📇 Identity CSV: {} → {}",
                ids_cmd.translation.display(),
                ids_cmd.output.display()
            );

            let internal_config = IdsConfig::from_args(ids_cmd);
            match run_identity_export(&internal_config) {
                Ok(_) => {}
                Err(e) => {
                    error!("❌ Identity CSV generation failed: {e:#}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Version) => {
            println!("pinna v{}", env!("CARGO_PKG_VERSION"));
            println!("Model path env var: {MODEL_PATH_ENV_VAR}");
        }
        None => {
            // Show help if no command specified
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().unwrap();
        }
    }
}
