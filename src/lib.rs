pub mod color_utils;
pub mod config;
pub mod crop_compositing;
pub mod export_processing;
pub mod image_input;
pub mod mask_extraction;
pub mod onnx_session;
pub mod preprocessing;
pub mod translation;
