//! Detector that replays recorded frames.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::traits::Detector;
use crate::geometry::BoundingBox;
use crate::Result;

/// Replays a fixed sequence of detection frames, then reports nothing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptedDetector {
    frames: VecDeque<Option<Vec<BoundingBox>>>,
}

impl ScriptedDetector {
    pub fn new(frames: impl IntoIterator<Item = Option<Vec<BoundingBox>>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Frames not yet replayed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self) -> Result<Option<Vec<BoundingBox>>> {
        Ok(self.frames.pop_front().flatten())
    }
}
