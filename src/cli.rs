use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ONNX model path
    #[arg(long, required = true)]
    pub model: PathBuf,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Confidence threshold applied while decoding model output
    #[arg(long, default_value_t = 0.25)]
    pub confidence: f32,

    /// Confidence threshold applied when bucketing detections for the verdict
    #[arg(long, default_value_t = 0.5)]
    pub bucket_threshold: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// Model input size (square)
    #[arg(long, default_value_t = 640)]
    pub input_size: u32,

    /// Use the CUDA execution provider
    #[arg(long, default_value_t = false)]
    pub cuda: bool,
}
