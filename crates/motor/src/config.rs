//! Motor tuning.
//!
//! All values use metric units (meters, seconds). The defaults reproduce the
//! classic first-person motor tuning: 10 m/s in every direction, gravity of
//! 10 m/s² and a one meter base jump with two meters of extra height.

use serde::{Deserialize, Serialize};

use crate::curve::SpeedCurve;

/// Errors from validating motor configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be a finite value greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be a finite, non-negative value, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },
    #[error("slope speed curve needs at least one key")]
    EmptyCurve,
    #[error("slope speed curve key {index} is not finite")]
    NonFiniteKey { index: usize },
    #[error("slope speed curve key {index} is not after the previous key")]
    UnsortedCurve { index: usize },
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

/// Horizontal speed limits, accelerations and gravity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Maximum speed walking forward (m/s).
    pub max_forward_speed: f32,
    /// Maximum speed strafing (m/s).
    pub max_sideways_speed: f32,
    /// Maximum speed walking backwards (m/s).
    pub max_backwards_speed: f32,
    /// Speed multiplier by travel slope angle (negative = downhill).
    pub slope_speed_multiplier: SpeedCurve,
    /// How fast the velocity may change on the ground (m/s²).
    pub max_ground_acceleration: f32,
    /// How fast the velocity may change in the air (m/s²).
    pub max_air_acceleration: f32,
    /// Gravity magnitude (m/s²).
    pub gravity: f32,
    /// Terminal fall speed magnitude (m/s).
    pub max_fall_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_forward_speed: 10.0,
            max_sideways_speed: 10.0,
            max_backwards_speed: 10.0,
            slope_speed_multiplier: SpeedCurve::default(),
            max_ground_acceleration: 30.0,
            max_air_acceleration: 20.0,
            gravity: 10.0,
            max_fall_speed: 20.0,
        }
    }
}

impl MovementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_forward_speed", self.max_forward_speed)?;
        positive("max_sideways_speed", self.max_sideways_speed)?;
        positive("max_backwards_speed", self.max_backwards_speed)?;
        non_negative("max_ground_acceleration", self.max_ground_acceleration)?;
        non_negative("max_air_acceleration", self.max_air_acceleration)?;
        non_negative("gravity", self.gravity)?;
        non_negative("max_fall_speed", self.max_fall_speed)?;
        SpeedCurve::new(self.slope_speed_multiplier.keys().to_vec()).map(|_| ())
    }
}

/// Jump heights and takeoff direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpingConfig {
    pub enabled: bool,
    /// Apex height of a tap jump (m).
    pub base_height: f32,
    /// Additional height reached while the button stays held (m).
    pub extra_height: f32,
    /// Takeoff blend toward the ground normal on walkable ground. 0 = straight up.
    pub perp_amount: f32,
    /// Takeoff blend toward the ground normal on too-steep ground.
    pub steep_perp_amount: f32,
}

impl Default for JumpingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_height: 1.0,
            extra_height: 2.0,
            perp_amount: 0.0,
            steep_perp_amount: 0.5,
        }
    }
}

impl JumpingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("base_height", self.base_height)?;
        non_negative("extra_height", self.extra_height)?;
        unit("perp_amount", self.perp_amount)?;
        unit("steep_perp_amount", self.steep_perp_amount)
    }
}

/// How much of a moving platform's velocity a jump inherits, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementTransfer {
    /// Jumps ignore the platform entirely.
    None,
    /// The jump starts with the platform's velocity, then air control takes over.
    InitTransfer,
    /// The jump keeps the platform's velocity until landing.
    #[default]
    PermaTransfer,
    /// The character keeps riding the last platform even while airborne.
    PermaLocked,
}

impl MovementTransfer {
    /// Whether leaving a platform adds its velocity to the character.
    pub fn inherits_velocity(self) -> bool {
        match self {
            MovementTransfer::InitTransfer | MovementTransfer::PermaTransfer => true,
            MovementTransfer::None | MovementTransfer::PermaLocked => false,
        }
    }

    /// Whether inherited velocity is folded into the desired velocity every tick.
    pub fn carries_frame_velocity(self) -> bool {
        match self {
            MovementTransfer::PermaTransfer => true,
            MovementTransfer::None | MovementTransfer::InitTransfer | MovementTransfer::PermaLocked => {
                false
            }
        }
    }

    /// Whether the platform keeps carrying the character while airborne.
    pub fn locks_to_platform(self) -> bool {
        match self {
            MovementTransfer::PermaLocked => true,
            MovementTransfer::None | MovementTransfer::InitTransfer | MovementTransfer::PermaTransfer => {
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingPlatformConfig {
    pub enabled: bool,
    pub movement_transfer: MovementTransfer,
}

impl Default for MovingPlatformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            movement_transfer: MovementTransfer::PermaTransfer,
        }
    }
}

/// Behavior on surfaces steeper than the mover's slope limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlidingConfig {
    pub enabled: bool,
    /// Down-slope speed (m/s).
    pub sliding_speed: f32,
    /// 0.5 lets the player slide sideways at half the sliding speed.
    pub sideways_control: f32,
    /// 0.5 lets the player speed the slide up to 150% or slow it to 50%.
    pub speed_control: f32,
}

impl Default for SlidingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sliding_speed: 15.0,
            sideways_control: 1.0,
            speed_control: 0.4,
        }
    }
}

impl SlidingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("sliding_speed", self.sliding_speed)?;
        unit("sideways_control", self.sideways_control)?;
        unit("speed_control", self.speed_control)
    }
}

/// Complete motor configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub movement: MovementConfig,
    pub jumping: JumpingConfig,
    pub moving_platform: MovingPlatformConfig,
    pub sliding: SlidingConfig,
}

impl MotorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.movement.validate()?;
        self.jumping.validate()?;
        self.sliding.validate()
    }

    pub fn transfer(&self) -> MovementTransfer {
        self.moving_platform.movement_transfer
    }
}
