use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use serde::Serialize;

use super::error::ScoringError;

/// Ordered relevance scores, one per input pair.
///
/// The length is fixed when the sequence is allocated and always equals the
/// number of pairs scored. A single-pair batch yields a length-1 sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreSequence(Vec<f32>);

impl ScoreSequence {
    /// Allocates `len` zeroed slots.
    pub(crate) fn zeroed(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Writes `values` into the slots by index.
    pub(crate) fn fill(&mut self, values: &[f32]) -> Result<(), ScoringError> {
        if values.len() != self.0.len() {
            return Err(ScoringError::ShapeMismatch {
                expected: self.0.len(),
                actual: vec![values.len()],
            });
        }
        self.0.copy_from_slice(values);
        Ok(())
    }

    pub(crate) fn map_in_place(&mut self, f: impl Fn(f32) -> f32) {
        for score in &mut self.0 {
            *score = f(*score);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.0.get(index).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    /// Index of the highest score (first one on ties).
    pub fn argmax(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (idx, &score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((idx, score)),
            })
            .map(|(idx, _)| idx)
    }
}

impl Index<usize> for ScoreSequence {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a ScoreSequence {
    type Item = &'a f32;
    type IntoIter = std::slice::Iter<'a, f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ScoreSequence {
    type Item = f32;
    type IntoIter = std::vec::IntoIter<f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Post-processing applied to raw model logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreActivation {
    /// Model logits as-is.
    #[default]
    Raw,
    /// Logistic squash into `(0, 1)`.
    Sigmoid,
}

impl ScoreActivation {
    pub fn apply(&self, logit: f32) -> f32 {
        match self {
            ScoreActivation::Raw => logit,
            ScoreActivation::Sigmoid => 1.0 / (1.0 + (-logit).exp()),
        }
    }
}

impl FromStr for ScoreActivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "" => Ok(ScoreActivation::Raw),
            "sigmoid" => Ok(ScoreActivation::Sigmoid),
            other => Err(format!("expected 'raw' or 'sigmoid', got '{other}'")),
        }
    }
}

impl fmt::Display for ScoreActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreActivation::Raw => write!(f, "raw"),
            ScoreActivation::Sigmoid => write!(f, "sigmoid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Scores for one query against its documents, plus input accounting.
pub struct RerankOutput {
    /// Scores aligned with the input document order.
    pub scores: ScoreSequence,
    /// Input units consumed by the backend (tokens for model backends).
    pub consumed_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A document annotated with its score and original position.
pub struct RankedDocument<'a> {
    /// Position of the document in the caller's input.
    pub index: usize,
    pub document: &'a str,
    pub score: f32,
}

impl RankedDocument<'_> {
    /// Returns `true` if `score` exceeds `threshold`.
    pub fn exceeds_threshold(&self, threshold: f32) -> bool {
        self.score > threshold
    }
}
