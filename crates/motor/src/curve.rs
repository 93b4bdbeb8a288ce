use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A single control point of a [`SpeedCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Slope angle in degrees (negative = downhill).
    pub angle: f32,
    /// Speed multiplier at that angle.
    pub multiplier: f32,
}

impl Keyframe {
    pub const fn new(angle: f32, multiplier: f32) -> Self {
        Self { angle, multiplier }
    }
}

/// Piecewise-linear curve mapping travel slope angle to a speed multiplier.
///
/// Outside the first and last keys the curve holds the end values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct SpeedCurve {
    keys: Vec<Keyframe>,
}

impl SpeedCurve {
    /// Build a curve from keys sorted by strictly increasing angle.
    pub fn new(keys: Vec<Keyframe>) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::EmptyCurve);
        }
        for (index, key) in keys.iter().enumerate() {
            if !key.angle.is_finite() || !key.multiplier.is_finite() {
                return Err(ConfigError::NonFiniteKey { index });
            }
        }
        if let Some(index) = keys.windows(2).position(|w| w[1].angle <= w[0].angle) {
            return Err(ConfigError::UnsortedCurve { index: index + 1 });
        }
        Ok(Self { keys })
    }

    /// A curve that always evaluates to `multiplier`.
    pub fn constant(multiplier: f32) -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, multiplier)],
        }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn evaluate(&self, angle: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 1.0,
        };
        if angle.is_nan() || angle <= first.angle {
            return first.multiplier;
        }
        if angle >= last.angle {
            return last.multiplier;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if angle <= b.angle {
                let t = (angle - a.angle) / (b.angle - a.angle);
                return a.multiplier + (b.multiplier - a.multiplier) * t;
            }
        }
        last.multiplier
    }
}

impl Default for SpeedCurve {
    /// Full speed on flat ground and downhill, fading to zero on a vertical climb.
    fn default() -> Self {
        Self {
            keys: vec![
                Keyframe::new(-90.0, 1.0),
                Keyframe::new(0.0, 1.0),
                Keyframe::new(90.0, 0.0),
            ],
        }
    }
}

impl TryFrom<Vec<Keyframe>> for SpeedCurve {
    type Error = ConfigError;

    fn try_from(keys: Vec<Keyframe>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<SpeedCurve> for Vec<Keyframe> {
    fn from(curve: SpeedCurve) -> Self {
        curve.keys
    }
}
