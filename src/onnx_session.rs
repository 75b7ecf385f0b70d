use crate::color_utils::symbols;
use anyhow::Result;
use log::Level;
use ort::{
    execution_providers::{CPUExecutionProvider, CoreMLExecutionProvider, ExecutionProvider},
    logging::LogLevel,
    session::Session,
};
use std::fs;
use std::path::Path;

/// Environment variable consulted for the model path when `--model-path` is absent
pub const MODEL_PATH_ENV_VAR: &str = "PINNA_MODEL_PATH";

fn log_level_from_ort(level: LogLevel) -> Level {
    match level {
        LogLevel::Verbose => Level::Trace,
        LogLevel::Info => Level::Trace,
        LogLevel::Warning => Level::Debug,
        LogLevel::Error => Level::Info,
        LogLevel::Fatal => Level::Error,
    }
}

fn ort_level_from_log(level: Level) -> LogLevel {
    match level {
        // we skip mapping to info because ONNX's info is so verbose
        // that it is more like debug or trace
        Level::Trace => LogLevel::Verbose,
        Level::Debug => LogLevel::Warning,
        Level::Info => LogLevel::Error,
        Level::Warn => LogLevel::Error,
        Level::Error => LogLevel::Fatal,
    }
}

/// Configuration for creating ONNX sessions
pub struct SessionConfig<'a> {
    pub device: &'a str,
}

/// Model source for loading ONNX models
pub enum ModelSource {
    FilePath(String),
}

/// Resolve the segmentation model source from the CLI override or the
/// environment. There is no embedded or downloadable default: the
/// checkpoint is an external collaborator.
pub fn resolve_model_source(cli_path: Option<&str>) -> Result<ModelSource> {
    let path = match cli_path {
        Some(path) => path.to_string(),
        None => std::env::var(MODEL_PATH_ENV_VAR).map_err(|_| {
            anyhow::anyhow!(
                "No segmentation model specified: pass --model-path or set {MODEL_PATH_ENV_VAR}"
            )
        })?,
    };

    if !Path::new(&path).exists() {
        return Err(anyhow::anyhow!("Model file does not exist: {path}"));
    }

    Ok(ModelSource::FilePath(path))
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub model_path: String,
    pub model_size_bytes: usize,
    pub execution_providers: Vec<String>,
}

/// Device selection result
#[derive(Debug, Clone)]
pub struct DeviceSelection {
    pub device: String,
    pub reason: String,
}

/// Determine optimal device based on user preference
pub fn determine_optimal_device(requested_device: &str) -> DeviceSelection {
    match requested_device {
        "auto" => {
            // For auto, prefer CoreML if available, otherwise CPU
            let coreml = CoreMLExecutionProvider::default();
            match coreml.is_available() {
                Ok(true) => DeviceSelection {
                    device: "coreml".to_string(),
                    reason: "Auto-selected CoreML (available)".to_string(),
                },
                _ => DeviceSelection {
                    device: "cpu".to_string(),
                    reason: "Auto-selected CPU (CoreML not available)".to_string(),
                },
            }
        }
        other => DeviceSelection {
            device: other.to_string(),
            reason: format!("User explicitly chose {other}"),
        },
    }
}

/// Create an ONNX Runtime session with the specified configuration
pub fn create_onnx_session(
    model_source: ModelSource,
    config: &SessionConfig,
) -> Result<(Session, ModelInfo)> {
    let ModelSource::FilePath(path) = model_source;
    let bytes = fs::read(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read model file {path}: {e}"))?;

    let execution_providers = match config.device {
        "coreml" => match CoreMLExecutionProvider::default().is_available() {
            Ok(true) => {
                vec![
                    CoreMLExecutionProvider::default().build(),
                    CPUExecutionProvider::default().build(),
                ]
            }
            _ => {
                log::warn!(
                    "{}CoreML not available, falling back to CPU",
                    symbols::warning()
                );
                vec![CPUExecutionProvider::default().build()]
            }
        },
        "cpu" => {
            log::info!("🖥️  Using CPU execution provider");
            vec![CPUExecutionProvider::default().build()]
        }
        _ => {
            log::warn!(
                "{}Unknown device '{}', using CPU",
                symbols::warning(),
                config.device
            );
            vec![CPUExecutionProvider::default().build()]
        }
    };

    // Store EP info for logging before moving the vector
    let ep_names: Vec<String> = execution_providers
        .iter()
        .map(|ep| format!("{ep:?}"))
        .collect();

    // Choose the ORT log level based on what is enabled for us
    let ort_log_level = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ]
    .into_iter()
    .find(|&lvl| log::log_enabled!(lvl))
    .map(ort_level_from_log)
    .unwrap_or(LogLevel::Fatal);

    let session = Session::builder()
        .map_err(|e| anyhow::anyhow!("Failed to create session builder: {}", e))?
        .with_logger(Box::new(|level, _, _, _, msg| {
            // relog to our standard logger with the appropriate log level
            let log_level = log_level_from_ort(level);
            log::log!(log_level, "[onnx] {msg}")
        }))
        .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?
        .with_log_level(ort_log_level)
        .map_err(|e| anyhow::anyhow!("Failed to set log level: {}", e))?
        .with_execution_providers(execution_providers)
        .map_err(|e| anyhow::anyhow!("Failed to set execution providers: {}", e))?
        .commit_from_memory(&bytes)
        .map_err(|e| anyhow::anyhow!("Failed to load model from {path}: {}", e))?;

    let model_info = ModelInfo {
        model_path: path,
        model_size_bytes: bytes.len(),
        execution_providers: ep_names,
    };

    log::debug!(
        "{} Execution providers registered: {}",
        symbols::system_setup(),
        model_info.execution_providers.join(" -> ")
    );

    Ok((session, model_info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_optimal_device_explicit() {
        let selection = determine_optimal_device("cpu");
        assert_eq!(selection.device, "cpu");
        assert!(selection.reason.contains("explicitly"));
    }

    #[test]
    fn test_determine_optimal_device_auto() {
        let selection = determine_optimal_device("auto");
        // Either CoreML or CPU depending on the host, but never "auto" itself
        assert_ne!(selection.device, "auto");
        assert!(selection.reason.contains("Auto-selected"));
    }

    #[test]
    fn test_resolve_model_source_missing_file() {
        let result = resolve_model_source(Some("/non/existent/unet.onnx"));
        assert!(result.is_err());
        assert!(result
            .err()
            .unwrap()
            .to_string()
            .contains("does not exist"));
    }

    #[test]
    fn test_resolve_model_source_cli_path() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().to_str().unwrap();

        let source = resolve_model_source(Some(temp_path)).unwrap();
        let ModelSource::FilePath(path) = source;
        assert_eq!(path, temp_path);
    }
}
