use crate::error::VisionError;
use crate::preprocess::{DigitTensor, INPUT_SHAPE, preprocess};
use guess_core::types::NUM_CLASSES;
use guess_core::{Classifier, Frame, Prediction};
use std::path::Path;
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::infer::{GenericFactoid, ShapeFactoid};

/// A loaded digit classifier. Stateless across calls: `predict` only reads the plan.
pub struct DigitModel {
    plan: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
}

impl DigitModel {
    /// Loads and optimises the ONNX artifact at `path`.
    ///
    /// The model must declare an `f32[1, 28, 28, 1]` input (a symbolic batch
    /// is accepted) and ten outputs. Anything else fails here rather than on
    /// the first frame.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(VisionError::ModelNotFound(path.to_path_buf()));
        }

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| load_error(path, e))?;
        let loaded = Self::from_inference(model, path)?;
        tracing::info!("Loaded digit model from {}", path.display());
        Ok(loaded)
    }

    pub(crate) fn from_inference(model: InferenceModel, path: &Path) -> Result<Self, VisionError> {
        let load_err = |e: TractError| load_error(path, e);

        let declared = &model.input_fact(0).map_err(load_err)?.shape;
        if !declared_input_fits(declared) {
            return Err(VisionError::ModelLoad {
                path: path.to_path_buf(),
                reason: format!(
                    "model expects input [{}], frames are {:?}",
                    describe(declared),
                    INPUT_SHAPE
                ),
            });
        }

        let model = model
            .with_input_fact(0, f32::fact(INPUT_SHAPE).into())
            .and_then(|m| m.into_optimized())
            .map_err(load_err)?;

        let found = output_volume(&model).map_err(load_err)?;
        if found != NUM_CLASSES {
            return Err(VisionError::ShapeMismatch {
                expected: NUM_CLASSES,
                found,
            });
        }

        let plan = model.into_runnable().map_err(load_err)?;
        Ok(Self { plan })
    }

    /// One forward pass. Returns the most likely class and its probability.
    pub fn predict(&self, input: &DigitTensor) -> Result<Prediction, VisionError> {
        let tensor = input.to_tensor().map_err(inference_err)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(inference_err)?;
        let output = outputs
            .first()
            .ok_or_else(|| VisionError::Inference("model produced no output".to_string()))?;
        let scores: Vec<f32> = output
            .to_array_view::<f32>()
            .map_err(inference_err)?
            .iter()
            .copied()
            .collect();

        let probabilities = to_probabilities(&scores);
        let (class, confidence) = arg_max(&probabilities)
            .ok_or_else(|| VisionError::Inference("model produced no scores".to_string()))?;
        Ok(Prediction::new(class as u8, confidence))
    }
}

impl Classifier for DigitModel {
    fn classify(&self, frame: &Frame) -> anyhow::Result<Prediction> {
        let input = preprocess(&frame.data)?;
        Ok(self.predict(&input)?)
    }
}

fn load_error(path: &Path, e: TractError) -> VisionError {
    VisionError::ModelLoad {
        path: path.to_path_buf(),
        reason: format!("{e:#}"),
    }
}

fn inference_err(e: TractError) -> VisionError {
    VisionError::Inference(format!("{e:#}"))
}

// Unknown and symbolic dims are left to the pinned fact; fixed ones must agree.
fn declared_input_fits(shape: &ShapeFactoid) -> bool {
    if shape.is_open() {
        return true;
    }
    let dims: Vec<&GenericFactoid<TDim>> = shape.dims().collect();
    dims.len() == INPUT_SHAPE.len()
        && dims.iter().zip(INPUT_SHAPE).all(|(dim, want)| match dim {
            GenericFactoid::Only(d) => d.as_i64().is_none_or(|v| v == want as i64),
            GenericFactoid::Any => true,
        })
}

fn describe(shape: &ShapeFactoid) -> String {
    shape
        .dims()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn output_volume(model: &TypedModel) -> TractResult<usize> {
    let fact = model.output_fact(0)?;
    match fact.shape.as_concrete() {
        Some(dims) => Ok(dims.iter().product()),
        None => anyhow::bail!("output shape is not fixed: {:?}", fact.shape),
    }
}

/// Passes a probability vector through unchanged, otherwise applies softmax.
///
/// Exported classifiers differ on whether the final softmax is baked in.
pub fn to_probabilities(scores: &[f32]) -> Vec<f32> {
    let in_unit_range = scores.iter().all(|s| (0.0..=1.0).contains(s));
    let sum: f32 = scores.iter().sum();
    if in_unit_range && (sum - 1.0).abs() <= 1e-3 {
        return scores.to_vec();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Index and value of the largest entry. Ties go to the lowest index.
pub fn arg_max(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}
