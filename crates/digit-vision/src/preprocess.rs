use crate::error::VisionError;
use image::DynamicImage;
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

pub const INPUT_SIDE: usize = 28;
/// Batch, height, width, channel.
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIDE, INPUT_SIDE, 1];

/// One preprocessed frame: 28×28 luma values in `[0, 1]`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitTensor {
    values: Vec<f32>,
}

impl DigitTensor {
    pub fn shape(&self) -> [usize; 4] {
        INPUT_SHAPE
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn to_tensor(&self) -> TractResult<Tensor> {
        Tensor::from_shape(&INPUT_SHAPE, self.values.as_slice())
    }
}

/// Decodes an encoded frame (JPEG or PNG) and prepares it for the model.
pub fn preprocess(bytes: &[u8]) -> Result<DigitTensor, VisionError> {
    let image = image::load_from_memory(bytes)?;
    Ok(preprocess_image(&image))
}

/// Grayscale, resize to 28×28 and scale to `[0, 1]`. Deterministic.
pub fn preprocess_image(image: &DynamicImage) -> DigitTensor {
    let gray = image.to_luma8();
    let side = INPUT_SIDE as u32;
    let resized = imageops::resize(&gray, side, side, FilterType::Triangle);
    let values = resized
        .pixels()
        .map(|p| f32::from(p.0[0]) / 255.0)
        .collect();
    DigitTensor { values }
}
