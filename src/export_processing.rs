//! Batch export driver: runs the segmentation network over a directory of
//! images, composites the cropped cutouts, and saves them under their
//! recognition filenames.

use anyhow::{Context, Result};
use image::GrayImage;
use log::debug;
use ort::{session::Session, value::Value};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::color_utils::symbols;
use crate::config::ExportConfig;
use crate::crop_compositing::compose_cutout;
use crate::image_input::{collect_images_from_sources, ImageInputConfig};
use crate::mask_extraction::extract_mask;
use crate::onnx_session::{
    create_onnx_session, determine_optimal_device, resolve_model_source, SessionConfig,
};
use crate::preprocessing::prepare_image;
use crate::translation::{flatten_separators, TranslationTable};

/// Per-image result of the export pipeline
pub struct ExportResult {
    pub output_path: PathBuf,
    pub mask_path: Option<PathBuf>,
    pub processing_time_ms: f64,
}

/// Translation-table key for an image: `{directory-basename}/{filename}`,
/// matching how detection filenames are recorded in the table.
pub fn detection_key(image_path: &Path) -> String {
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match image_path.parent().and_then(|p| p.file_name()) {
        Some(dir) => format!("{}/{}", dir.to_string_lossy(), file_name),
        None => file_name,
    }
}

/// Auxiliary mask path next to a cutout: `<stem>_mask.png`
fn mask_output_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output_path.with_file_name(format!("{stem}_mask.png"))
}

/// Process the whole batch sequentially. The first failure aborts the run:
/// a missing translation entry or an unreadable image signals a dataset
/// consistency problem, not something to skip past.
pub fn run_export(config: ExportConfig) -> Result<usize> {
    let framework_start = Instant::now();

    let image_config = ImageInputConfig::from_strict_flag(config.base.strict);
    let image_files = collect_images_from_sources(&config.base.sources, &image_config)?;

    if image_files.is_empty() {
        log::warn!("No valid images found to process");
        return Ok(0);
    }

    log::info!(
        "{} Found {} image(s) to process",
        symbols::resources_found(),
        image_files.len()
    );

    let table = TranslationTable::load(&config.translation)?;
    log::info!(
        "📇 Loaded {} translation row(s) from {}",
        table.len(),
        config.translation.display()
    );

    let device_selection = determine_optimal_device(&config.base.device);
    debug!(
        "{} Device: {} ({})",
        symbols::system_setup(),
        device_selection.device,
        device_selection.reason
    );

    let model_source = resolve_model_source(config.model_path.as_deref())?;
    let session_config = SessionConfig {
        device: &device_selection.device,
    };
    let session_start = Instant::now();
    let (mut session, model_info) = create_onnx_session(model_source, &session_config)?;
    debug!(
        "{} Loaded model {} ({} bytes) in {:.1}ms",
        symbols::system_setup(),
        model_info.model_path,
        model_info.model_size_bytes,
        session_start.elapsed().as_secs_f64() * 1000.0
    );

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let progress = crate::color_utils::progress::create_batch_progress_bar(image_files.len());

    let mut successful_count = 0;
    for (index, image_path) in image_files.iter().enumerate() {
        if let Some(pb) = &progress {
            pb.set_message(image_path.display().to_string());
        }

        let result = process_single_image(&mut session, image_path, &table, &config)
            .with_context(|| format!("failed to process {}", image_path.display()))?;

        successful_count += 1;
        log::info!(
            "{} Processed {} ({}/{}) in {:.1}ms → {}",
            symbols::completed_successfully(),
            image_path.display(),
            index + 1,
            image_files.len(),
            result.processing_time_ms,
            result.output_path.display()
        );

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    log::info!(
        "{} Exported {} image(s) in {:.1}s",
        symbols::completed_successfully(),
        successful_count,
        framework_start.elapsed().as_secs_f64()
    );

    Ok(successful_count)
}

/// Run one image through the complete pipeline:
/// load → equalize/tensorize → inference → mask → composite → lookup → save.
fn process_single_image(
    session: &mut Session,
    image_path: &Path,
    table: &TranslationTable,
    config: &ExportConfig,
) -> Result<ExportResult> {
    let start_time = Instant::now();

    debug!("🖼️  Processing: {}", image_path.display());

    let img = image::open(image_path)?;
    let (equalized, input_array) = prepare_image(&img)?;

    // Prepare input for the model
    let input_name = session.inputs[0].name.clone();
    let output_name = session.outputs[0].name.clone();
    let input_value = Value::from_array(input_array)
        .map_err(|e| anyhow::anyhow!("Failed to create input value: {}", e))?;

    // Run inference
    let inference_start = Instant::now();
    let outputs = session
        .run(ort::inputs![input_name.as_str() => &input_value])
        .map_err(|e| anyhow::anyhow!("Failed to run inference: {}", e))?;
    debug!(
        "⚡ Inference completed in {:.1}ms",
        inference_start.elapsed().as_secs_f64() * 1000.0
    );

    // Extract the per-pixel class scores (shape (1, 2, H, W))
    let output_view = outputs[output_name.as_str()]
        .try_extract_array::<f32>()
        .map_err(|e| anyhow::anyhow!("Failed to extract output array: {}", e))?;

    let mask: GrayImage = extract_mask(&output_view)?;

    let cutout = compose_cutout(&equalized, &mask, config.margin)?;

    // Resolve the recognition filename through the translation table
    let key = detection_key(image_path);
    let row = table.recognition_for(&key)?;
    let output_path = config
        .output_dir
        .join(flatten_separators(&row.recognition_filename));

    cutout.save(&output_path)?;
    debug!(
        "{} Cutout saved to: {}",
        symbols::completed_successfully(),
        output_path.display()
    );

    let mask_path = if config.save_mask {
        let mask_path = mask_output_path(&output_path);
        mask.save(&mask_path)?;
        debug!(
            "{} Mask saved to: {}",
            symbols::completed_successfully(),
            mask_path.display()
        );
        Some(mask_path)
    } else {
        None
    };

    Ok(ExportResult {
        output_path,
        mask_path,
        processing_time_ms: start_time.elapsed().as_secs_f64() * 1000.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_key_uses_directory_basename() {
        assert_eq!(
            detection_key(Path::new("data/ears/test/0501.png")),
            "test/0501.png"
        );
        assert_eq!(detection_key(Path::new("test/0501.png")), "test/0501.png");
    }

    #[test]
    fn test_detection_key_bare_filename() {
        assert_eq!(detection_key(Path::new("0501.png")), "0501.png");
    }

    #[test]
    fn test_mask_output_path() {
        assert_eq!(
            mask_output_path(Path::new("out/bank_10_01.png")),
            PathBuf::from("out/bank_10_01_mask.png")
        );
    }
}
