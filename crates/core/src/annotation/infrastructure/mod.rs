pub mod canvas;
pub mod landmark_annotator;
