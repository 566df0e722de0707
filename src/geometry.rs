//! Value types shared by the tracking, prediction and planning stages.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Detected or smoothed person region in an image.
///
/// Dimensions are `(width, height)` in pixels and the centroid is the `(x, y)`
/// center of the box in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundingBox")]
pub struct BoundingBox {
    dimensions: (f64, f64),
    centroid: (f64, f64),
}

/// Unvalidated wire form of [`BoundingBox`].
#[derive(Deserialize)]
struct RawBoundingBox {
    dimensions: (f64, f64),
    centroid: (f64, f64),
}

impl TryFrom<RawBoundingBox> for BoundingBox {
    type Error = Error;

    fn try_from(raw: RawBoundingBox) -> Result<Self> {
        Self::new(raw.dimensions, raw.centroid)
    }
}

impl BoundingBox {
    /// Create a bounding box from `(width, height)` and `(x, y)` centroid.
    ///
    /// Dimensions must be finite and non-negative, the centroid must be finite.
    pub fn new(dimensions: (f64, f64), centroid: (f64, f64)) -> Result<Self> {
        let (width, height) = dimensions;
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(Error::InvalidBoundingBox(format!(
                "dimensions must be finite and non-negative, got ({}, {})",
                width, height
            )));
        }
        if !(centroid.0.is_finite() && centroid.1.is_finite()) {
            return Err(Error::InvalidBoundingBox(format!(
                "centroid must be finite, got ({}, {})",
                centroid.0, centroid.1
            )));
        }
        Ok(Self { dimensions, centroid })
    }

    /// Unchecked constructor for compile-time known boxes.
    pub(crate) const fn from_parts(width: f64, height: f64, x: f64, y: f64) -> Self {
        Self {
            dimensions: (width, height),
            centroid: (x, y),
        }
    }

    pub fn dimensions(&self) -> (f64, f64) {
        self.dimensions
    }

    pub fn centroid(&self) -> (f64, f64) {
        self.centroid
    }

    pub fn width(&self) -> f64 {
        self.dimensions.0
    }

    pub fn height(&self) -> f64 {
        self.dimensions.1
    }

    pub fn area(&self) -> f64 {
        self.dimensions.0 * self.dimensions.1
    }
}

/// Vehicle state in a local frame.
///
/// Yaw 0 faces along +x and increasing yaw turns towards +y. Angles are radians,
/// z is altitude (up positive).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehiclePose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub x_dot: f64,
    pub y_dot: f64,
    pub z_dot: f64,
    pub roll_dot: f64,
    pub pitch_dot: f64,
    pub yaw_dot: f64,
}

/// A target pose the vehicle should fly to. Velocities are typically zero.
pub type Waypoint = VehiclePose;

impl VehiclePose {
    /// Create a pose with the given position and attitude and zero velocities.
    pub fn new(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            x,
            y,
            z,
            roll,
            pitch,
            yaw,
            ..Self::default()
        }
    }

    /// Level pose (zero roll and pitch) at rest.
    pub fn level(x: f64, y: f64, z: f64, yaw: f64) -> Self {
        Self::new(x, y, z, 0.0, 0.0, yaw)
    }

    /// Set linear and angular velocities.
    pub fn with_velocities(mut self, linear: (f64, f64, f64), angular: (f64, f64, f64)) -> Self {
        (self.x_dot, self.y_dot, self.z_dot) = linear;
        (self.roll_dot, self.pitch_dot, self.yaw_dot) = angular;
        self
    }

    pub fn position(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    pub fn attitude(&self) -> (f64, f64, f64) {
        (self.roll, self.pitch, self.yaw)
    }

    pub fn linear_velocities(&self) -> (f64, f64, f64) {
        (self.x_dot, self.y_dot, self.z_dot)
    }

    pub fn angular_velocities(&self) -> (f64, f64, f64) {
        (self.roll_dot, self.pitch_dot, self.yaw_dot)
    }
}

/// How far away a person is, estimated from the apparent size of their bounding box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeModel {
    /// `distance = scale / area²`.
    InverseSquareArea { scale: f64 },
    /// Pinhole camera: `distance = person_height * focal_length / box_height`.
    PinholeHeight { person_height: f64, focal_length: f64 },
}

impl Default for RangeModel {
    fn default() -> Self {
        RangeModel::InverseSquareArea { scale: 1.0 }
    }
}

impl RangeModel {
    /// Every model parameter must be finite and positive.
    pub fn validate(&self) -> Result<()> {
        let parameters = match *self {
            RangeModel::InverseSquareArea { scale } => vec![("scale", scale)],
            RangeModel::PinholeHeight {
                person_height,
                focal_length,
            } => vec![("person_height", person_height), ("focal_length", focal_length)],
        };
        for (name, value) in parameters {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "range model {} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Estimated distance to a person framed by `bounding_box`.
    ///
    /// Degenerate boxes (zero area or height) map to zero distance.
    pub fn distance(&self, bounding_box: &BoundingBox) -> f64 {
        match *self {
            RangeModel::InverseSquareArea { scale } => {
                let area = bounding_box.area();
                if area <= 0.0 {
                    0.0
                } else {
                    scale / (area * area)
                }
            }
            RangeModel::PinholeHeight {
                person_height,
                focal_length,
            } => {
                let height = bounding_box.height();
                if height <= 0.0 {
                    0.0
                } else {
                    person_height * focal_length / height
                }
            }
        }
    }
}

/// Default display radius of a person marker.
pub const DEFAULT_PERSON_RADIUS: f64 = 0.25;

/// Estimated ground position of the tracked person.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonState {
    pub x: f64,
    pub y: f64,
    /// Display radius (used by consumers drawing the person).
    pub radius: f64,
}

impl PersonState {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            radius: DEFAULT_PERSON_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Estimate a ground position from the vehicle pose and the person's bounding box.
    ///
    /// The range comes from `range_model` and is projected along the vehicle heading.
    pub fn from_bounding_box(
        pose: &VehiclePose,
        bounding_box: &BoundingBox,
        range_model: &RangeModel,
    ) -> Self {
        let distance = range_model.distance(bounding_box);
        Self::new(
            pose.x + pose.yaw.cos() * distance,
            pose.y + pose.yaw.sin() * distance,
        )
    }

    /// Euclidean distance to another person state.
    pub fn distance_to(&self, other: &PersonState) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
