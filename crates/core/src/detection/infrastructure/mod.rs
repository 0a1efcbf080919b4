pub mod anchors;
pub mod math;
pub mod model_resolver;
pub mod onnx_blazeface_detector;
pub mod onnx_hand_detector;
pub mod onnx_session;
pub mod tensor;
