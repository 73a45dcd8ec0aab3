//! Inference gateway around ONNX Runtime.
//!
//! The session is loaded once at startup and shared read-only afterwards;
//! requests serialize on a mutex around the session and are otherwise
//! independent. Nothing is cached between calls.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::DynamicImage;
use ndarray::CowArray;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::Session;
use ort::session::builder::SessionBuilder;

use crate::detection::RawDetection;
use crate::error::DetectError;
use crate::postprocess::{decode_predictions, non_max_suppression};
use crate::preprocess::{PreprocessConfig, Processor};

/// Detection engine interface.
///
/// One capability: given an image and a confidence threshold, return raw
/// detections. Service handlers depend on this, not on the concrete engine,
/// so tests can substitute a stub.
pub trait InferenceBackend: Send + Sync {
    fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, DetectError>;

    fn model_name(&self) -> String;

    fn input_size(&self) -> u32;
}

/// YOLOv8 detector backed by an `ort` session.
pub struct Detector {
    session: Mutex<Session>,
    processor: Processor,
    model_path: PathBuf,
    iou_threshold: f32,
}

impl Detector {
    /// Load the ONNX model. Called exactly once, at startup; failure is
    /// fatal to the service.
    pub fn load(
        model_path: &Path,
        input_size: u32,
        iou_threshold: f32,
        cuda: bool,
    ) -> Result<Self, DetectError> {
        if !model_path.exists() {
            return Err(DetectError::ModelLoad(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let provider = if cuda {
            [CUDAExecutionProvider::default().build().error_on_failure()]
        } else {
            [CPUExecutionProvider::default().build()]
        };
        let session = SessionBuilder::new()
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .with_execution_providers(provider)
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| DetectError::ModelLoad(e.to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            processor: Processor::new(PreprocessConfig {
                size: input_size,
                ..PreprocessConfig::default()
            }),
            model_path: model_path.to_path_buf(),
            iou_threshold,
        })
    }
}

impl InferenceBackend for Detector {
    fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, DetectError> {
        let (tensor, letterbox) = self
            .processor
            .preprocess(image)
            .map_err(|e| DetectError::Preprocess(e.to_string()))?;
        let tensor = CowArray::from(tensor);
        let inputs =
            ort::inputs![tensor.view()].map_err(|e| DetectError::Inference(e.to_string()))?;

        let session = self
            .session
            .lock()
            .map_err(|_| DetectError::Inference("model session lock poisoned".to_string()))?;
        let outputs = session
            .run(inputs)
            .map_err(|e| DetectError::Inference(e.to_string()))?;
        let predictions = outputs
            .iter()
            .map(|(_name, value)| value.try_extract_tensor::<f32>().map(|t| t.into_owned()))
            .next()
            .ok_or_else(|| DetectError::Output("model produced no outputs".to_string()))?
            .map_err(|e| DetectError::Output(e.to_string()))?;

        let raw = decode_predictions(
            &predictions,
            confidence_threshold,
            &letterbox,
            image.width(),
            image.height(),
        )?;
        Ok(non_max_suppression(raw, self.iou_threshold))
    }

    fn model_name(&self) -> String {
        self.model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model_path.display().to_string())
    }

    fn input_size(&self) -> u32 {
        self.processor.size()
    }
}
