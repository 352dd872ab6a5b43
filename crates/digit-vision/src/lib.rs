//! Handwritten digit recognition for camera frames.
//!
//! A pretrained ONNX classifier with a fixed `f32[1, 28, 28, 1]` input and a
//! 10-way output is loaded once with [`DigitModel::load`]. Frames go through
//! [`preprocess`] (decode, grayscale, resize, scale to `[0, 1]`) and then
//! [`DigitModel::predict`], which returns the arg-max class and its probability.

mod error;
mod model;
mod preprocess;

pub use error::VisionError;
pub use model::{DigitModel, arg_max, to_probabilities};
pub use preprocess::{DigitTensor, INPUT_SHAPE, INPUT_SIDE, preprocess, preprocess_image};
