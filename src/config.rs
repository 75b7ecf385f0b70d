//! Configuration layer separating CLI arguments from internal run configurations.
//!
//! CLI concerns (argument parsing, help text, validation) live in the command
//! structs; the batch driver and identity export consume the internal configs:
//! - `BaseConfig`: options shared by every command
//! - `ExportConfig`: segmentation export run
//! - `IdsConfig`: identity CSV generation run

use clap::Parser;
use clap_verbosity_flag::Verbosity;
use std::path::PathBuf;

/// Margin in pixels added around the mask extent when cropping.
pub const DEFAULT_MARGIN: u32 = 5;

/// Parse a crop margin value (bounded to keep boxes sane on small images)
pub fn parse_margin(s: &str) -> Result<u32, String> {
    let val = s
        .parse::<u32>()
        .map_err(|_| format!("Invalid margin: '{s}'"))?;
    if val > 1000 {
        return Err(format!("Margin must be at most 1000 pixels, got {val}"));
    }
    Ok(val)
}

/// Global CLI arguments that apply to all pinna commands
#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    /// Verbosity level (-q/--quiet, -v/-vv/-vvv/-vvvv for info/debug/trace)
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Use permissive mode for input validation (warn instead of error for unsupported files)
    #[arg(long, global = true)]
    pub permissive: bool,

    /// Device to use for inference (auto, cpu, coreml)
    #[arg(long, default_value = "auto", global = true)]
    pub device: String,

    /// Disable colored output (also respects NO_COLOR and PINNA_NO_COLOR env vars)
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Base configuration common to all commands
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// Input sources (images, directories, or glob patterns)
    pub sources: Vec<String>,
    /// Device for inference
    pub device: String,
    /// Fail on unsupported or missing input files. Opposite of `--permissive`.
    pub strict: bool,
}

impl From<GlobalArgs> for BaseConfig {
    fn from(global: GlobalArgs) -> Self {
        Self {
            sources: Vec::new(), // Sources come from the command, not global args
            device: global.device,
            strict: !global.permissive,
        }
    }
}

/// CLI command for the segmentation export pass
#[derive(Parser, Debug, Clone)]
pub struct ExportCommand {
    /// Path(s) to input images or directories. Supports glob patterns like *.jpg
    #[arg(value_name = "IMAGES_OR_DIRS", required = true)]
    pub sources: Vec<String>,

    /// CSV translation table mapping detection filenames to recognition filenames
    #[arg(long, value_name = "CSV")]
    pub translation: PathBuf,

    /// Directory to save cropped results to (created if absent)
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Margin in pixels added around the detected mask extent
    #[arg(long, default_value_t = DEFAULT_MARGIN, value_parser = parse_margin)]
    pub margin: u32,

    /// Save the binary segmentation mask next to each cropped result
    #[arg(long)]
    pub save_mask: bool,

    /// Path to the segmentation model file (overrides PINNA_MODEL_PATH)
    #[arg(long)]
    pub model_path: Option<String>,
}

/// CLI command for identity CSV generation
#[derive(Parser, Debug, Clone)]
pub struct IdsCommand {
    /// CSV translation table mapping detection filenames to recognition filenames
    #[arg(long, value_name = "CSV")]
    pub translation: PathBuf,

    /// Path of the identity CSV to write
    #[arg(long, value_name = "CSV")]
    pub output: PathBuf,
}

/// Internal configuration for the export run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub base: BaseConfig,
    pub translation: PathBuf,
    pub output_dir: PathBuf,
    pub margin: u32,
    pub save_mask: bool,
    /// CLI-provided model path override
    pub model_path: Option<String>,
}

impl ExportConfig {
    /// Create configuration from global args and command-specific args
    pub fn from_args(global: GlobalArgs, cmd: ExportCommand) -> Self {
        let mut base: BaseConfig = global.into();
        base.sources = cmd.sources;

        Self {
            base,
            translation: cmd.translation,
            output_dir: cmd.output_dir,
            margin: cmd.margin,
            save_mask: cmd.save_mask,
            model_path: cmd.model_path,
        }
    }
}

/// Internal configuration for identity CSV generation
#[derive(Debug, Clone)]
pub struct IdsConfig {
    pub translation: PathBuf,
    pub output: PathBuf,
}

impl IdsConfig {
    pub fn from_args(cmd: IdsCommand) -> Self {
        Self {
            translation: cmd.translation,
            output: cmd.output,
        }
    }
}
