//! Bounded sliding window of timestamped person observations.

use std::collections::VecDeque;

use crate::geometry::PersonState;
use crate::{Error, Result};

/// One observation: where the person was and when (seconds).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedPersonState {
    pub state: PersonState,
    pub timestamp: f64,
}

/// Fixed-capacity FIFO of observations, oldest first.
///
/// Pushing onto a full history evicts the oldest sample.
#[derive(Clone, Debug)]
pub struct PredictorHistory {
    samples: VecDeque<TimedPersonState>,
    capacity: usize,
}

impl PredictorHistory {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(
                "predictor history capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        })
    }

    pub fn push(&mut self, state: PersonState, timestamp: f64) {
        self.samples.push_back(TimedPersonState { state, timestamp });
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn oldest(&self) -> Option<&TimedPersonState> {
        self.samples.front()
    }

    pub fn newest(&self) -> Option<&TimedPersonState> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedPersonState> {
        self.samples.iter()
    }

    /// Time between the oldest and newest sample.
    pub fn elapsed(&self) -> f64 {
        match (self.oldest(), self.newest()) {
            (Some(o), Some(n)) => n.timestamp - o.timestamp,
            _ => 0.0,
        }
    }

    /// Sum of Euclidean distances between consecutive samples.
    pub fn path_length(&self) -> f64 {
        self.samples
            .iter()
            .zip(self.samples.iter().skip(1))
            .map(|(a, b)| a.state.distance_to(&b.state))
            .sum()
    }

    /// Mean speed along the sampled path, zero when no time has elapsed.
    pub fn mean_speed(&self) -> f64 {
        let elapsed = self.elapsed();
        if elapsed > 0.0 {
            self.path_length() / elapsed
        } else {
            0.0
        }
    }

    /// Direction of travel along x: the sign of the last x step, +1 when it is zero.
    pub fn x_direction(&self) -> f64 {
        let n = self.samples.len();
        if n < 2 {
            return 1.0;
        }
        let dx = self.samples[n - 1].state.x - self.samples[n - 2].state.x;
        if dx < 0.0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Sample positions as parallel x and y vectors, oldest first.
    pub fn xy(&self) -> (Vec<f64>, Vec<f64>) {
        self.samples.iter().map(|s| (s.state.x, s.state.y)).unzip()
    }
}
