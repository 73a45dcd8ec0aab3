pub mod analysis;
pub mod cli;
pub mod detection;
pub mod error;
pub mod mapping;
pub mod model;
pub mod postprocess;
pub mod preprocess;
pub mod service;

pub use crate::analysis::{Verdict, VerdictStatus, analyze};
pub use crate::cli::Args;
pub use crate::detection::{Detection, RawDetection, normalize};
pub use crate::error::{ApiError, DetectError};
pub use crate::mapping::correct;
pub use crate::model::{Detector, InferenceBackend};
pub use crate::postprocess::{decode_predictions, non_max_suppression};
pub use crate::preprocess::{PreprocessConfig, Processor};
pub use crate::service::{AppState, router};
