//! Motion regime classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MotionThresholds;

/// Speed band of an object, used to scale heading tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionRegime {
    /// Effectively stationary.
    Static,
    /// Creeping or maneuvering.
    LowSpeed,
    /// Travelling.
    NormalSpeed,
}

impl MotionRegime {
    /// All regimes, slowest first.
    pub const ALL: [Self; 3] = [Self::Static, Self::LowSpeed, Self::NormalSpeed];

    /// Classifies a speed in m/s.
    ///
    /// Bands are half-open: a speed equal to `static_speed_max` is already
    /// low speed, one equal to `low_speed_max` is already normal speed.
    ///
    /// # Example
    ///
    /// ```
    /// use annotation_audit::{MotionRegime, MotionThresholds};
    ///
    /// let t = MotionThresholds::default();
    /// assert_eq!(MotionRegime::classify(0.05, &t), MotionRegime::Static);
    /// assert_eq!(MotionRegime::classify(0.1, &t), MotionRegime::LowSpeed);
    /// assert_eq!(MotionRegime::classify(0.5, &t), MotionRegime::NormalSpeed);
    /// ```
    #[must_use]
    pub fn classify(speed: f64, thresholds: &MotionThresholds) -> Self {
        if speed < thresholds.static_speed_max {
            Self::Static
        } else if speed < thresholds.low_speed_max {
            Self::LowSpeed
        } else {
            Self::NormalSpeed
        }
    }

    /// Returns the snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::LowSpeed => "low_speed",
            Self::NormalSpeed => "normal_speed",
        }
    }
}

impl fmt::Display for MotionRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
