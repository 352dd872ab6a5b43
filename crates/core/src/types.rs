use std::fmt;

/// Predictions below this confidence are treated as "no usable answer".
pub const CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Number of classes the digit classifier distinguishes (0 through 9).
pub const NUM_CLASSES: usize = 10;

/// One still image captured from the device camera.
///
/// A frame lives for a single tick: it is classified, handed to the render
/// sink and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Classifier output for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class: u8,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(class: u8, confidence: f32) -> Self {
        Self { class, confidence }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.0}%)", self.class, self.confidence * 100.0)
    }
}

/// Confidence gate applied on top of the classifier. The boundary is inclusive.
pub fn accept(confidence: f32, threshold: f32) -> bool {
    confidence >= threshold
}
