use std::path::Path;

use crate::detection::domain::detector::DetectionError;

use super::tensor::TensorLayout;

/// A model output copied out of the session, flattened in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Return the preferred ONNX execution providers for the current platform.
///
/// Falls back to CPU if the platform-specific provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

pub fn load_session(model_path: &Path) -> Result<ort::session::Session, DetectionError> {
    log::debug!("Loading ONNX model {}", model_path.display());
    ort::session::Session::builder()
        .map_err(DetectionError::inference)?
        .with_execution_providers(preferred_execution_providers())
        .map_err(DetectionError::inference)?
        .commit_from_file(model_path)
        .map_err(DetectionError::inference)
}

/// Reads the image layout from the first input's shape.
///
/// Falls back to NCHW if the shape is dynamic or unreadable.
pub fn input_layout(session: &ort::session::Session) -> TensorLayout {
    session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() == 4 && shape[3] == 3 && shape[1] != 3 {
                    Some(TensorLayout::Nhwc)
                } else {
                    None
                }
            } else {
                None
            }
        })
        .unwrap_or(TensorLayout::Nchw)
}

/// Runs a single-input model and copies every output out as `f32`.
pub fn run(
    session: &mut ort::session::Session,
    input: ndarray::Array4<f32>,
) -> Result<Vec<OutputTensor>, DetectionError> {
    let input_value = ort::value::Tensor::from_array(input).map_err(DetectionError::inference)?;
    let outputs = session
        .run(ort::inputs![input_value])
        .map_err(DetectionError::inference)?;

    let mut tensors = Vec::with_capacity(outputs.len());
    for i in 0..outputs.len() {
        let array = outputs[i]
            .try_extract_array::<f32>()
            .map_err(|e| DetectionError::ModelOutput(e.to_string()))?;
        tensors.push(OutputTensor {
            shape: array.shape().to_vec(),
            data: array.iter().copied().collect(),
        });
    }
    Ok(tensors)
}
