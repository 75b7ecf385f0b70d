//! Color and styling utilities with support for NO_COLOR and TERM environment variables.
//!
//! Conditional colored output based on:
//! - `--no-color` CLI flag
//! - `NO_COLOR` environment variable (https://no-color.org/)
//! - `PINNA_NO_COLOR` environment variable (application-specific)
//! - `TERM=dumb` environment variable
//! - TTY detection for stderr

use colored::ColoredString;
use std::io::{stderr, IsTerminal};
use std::sync::OnceLock;

/// Global color configuration state
static COLOR_CONFIG: OnceLock<ColorConfig> = OnceLock::new();

/// Check environment variables and TTY state for color support
fn should_disable_colors_from_env() -> bool {
    // Check NO_COLOR standard (https://no-color.org/)
    !std::env::var("NO_COLOR").unwrap_or_default().is_empty()
        // Check application-specific override
        || !std::env::var("PINNA_NO_COLOR").unwrap_or_default().is_empty()
        // Check for dumb terminal
        || std::env::var("TERM").unwrap_or_default() == "dumb"
        // Check if stderr is not a TTY (log messages go to stderr)
        || !stderr().is_terminal()
}

#[derive(Debug, Clone)]
struct ColorConfig {
    colors_enabled: bool,
}

impl ColorConfig {
    fn new(no_color_flag: bool) -> Self {
        let colors_enabled = !no_color_flag && !should_disable_colors_from_env();
        Self { colors_enabled }
    }

    fn is_enabled(&self) -> bool {
        self.colors_enabled
    }
}

/// Initialize the color configuration with the CLI flag state.
/// This should be called once at application startup after parsing CLI arguments.
pub fn init_color_config(no_color_flag: bool) {
    let config = ColorConfig::new(no_color_flag);
    COLOR_CONFIG.set(config).unwrap_or_else(|_| {
        eprintln!("Warning: Color configuration already initialized");
    });
}

/// Check if colors are enabled based on configuration
fn colors_enabled() -> bool {
    COLOR_CONFIG
        .get()
        .map(|config| config.is_enabled())
        .unwrap_or_else(|| {
            // Fallback if not initialized - check env vars and TTY only
            !should_disable_colors_from_env()
        })
}

/// Apply color to a string only if colors are enabled for stderr output
pub fn maybe_color_stderr<F>(text: &str, color_fn: F) -> String
where
    F: FnOnce(&str) -> ColoredString,
{
    if colors_enabled() {
        color_fn(text).to_string()
    } else {
        text.to_string()
    }
}

/// Semantic color functions for different message types
pub mod colors {
    use super::maybe_color_stderr;
    use colored::Colorize;

    /// Color for error-level messages (critical failures)
    pub fn error_level(text: &str) -> String {
        maybe_color_stderr(text, |s| s.red().bold())
    }

    /// Color for warning-level messages
    pub fn warning_level(text: &str) -> String {
        maybe_color_stderr(text, |s| s.yellow())
    }
}

/// Semantic symbols for different operation types and states
pub mod symbols {
    use super::colors_enabled;

    /// Symbol for starting a segmentation export operation
    pub fn export_start() -> &'static str {
        if colors_enabled() {
            "✂️ "
        } else {
            "[EXPORT]"
        }
    }

    /// Symbol for finding/targeting resources
    pub fn resources_found() -> &'static str {
        if colors_enabled() {
            "🎯"
        } else {
            ""
        }
    }

    /// Symbol for technical setup and configuration
    pub fn system_setup() -> &'static str {
        if colors_enabled() {
            "⚙️ "
        } else {
            ""
        }
    }

    /// Symbol for successful completion
    pub fn completed_successfully() -> &'static str {
        if colors_enabled() {
            "✅"
        } else {
            "[SUCCESS]"
        }
    }

    /// Symbol for operation failures
    pub fn operation_failed() -> &'static str {
        if colors_enabled() {
            "❌"
        } else {
            "[FAILED]"
        }
    }

    /// Symbol for warnings
    pub fn warning() -> &'static str {
        if colors_enabled() {
            "⚠️ "
        } else {
            ""
        }
    }
}

/// Progress bar utilities that respect TTY state
pub mod progress {
    use super::colors_enabled;
    use indicatif::{ProgressBar, ProgressStyle};
    use std::io::{stderr, IsTerminal};

    /// Create a progress bar for batch processing, only if stderr is interactive
    pub fn create_batch_progress_bar(total: usize) -> Option<ProgressBar> {
        // Only show a progress bar when processing more than one item on an
        // interactive terminal; log lines carry progress otherwise.
        if total > 1 && stderr().is_terminal() {
            let pb = ProgressBar::new(total as u64);
            let style = if colors_enabled() {
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:30.green/black}] ({percent}%) {msg}")
                    .unwrap()
                    .progress_chars("█▓▒░")
            } else {
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:30}] ({percent}%) {msg}")
                    .unwrap()
                    .progress_chars("#> ")
            };

            pb.set_style(style);

            Some(pb)
        } else {
            None
        }
    }
}
