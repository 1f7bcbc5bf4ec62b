use std::path::Path;

use ocrs::{DecodeMethod, OcrEngine, OcrEngineParams};
use rten::Model;

use crate::error::{Error, Result};

/// Load a model from a local file path.
pub fn load_model(path: &Path) -> Result<Model> {
    Model::load_file(path).map_err(|e| Error::Model {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Build an OCR engine from detection and recognition model files.
pub fn load_ocr_engine(detection: &Path, recognition: &Path) -> Result<OcrEngine> {
    let detection_model = load_model(detection)?;
    let recognition_model = load_model(recognition)?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        decode_method: DecodeMethod::BeamSearch { width: 5 },
        ..Default::default()
    })
    .map_err(|e| Error::Model {
        path: recognition.to_path_buf(),
        message: format!("failed to initialize OCR engine: {e}"),
    })
}
