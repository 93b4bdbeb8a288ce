//! The character motor: per-tick orchestration and the public surface.

use std::collections::VecDeque;

use glam::Vec3;
use locomotor_common::{BodyId, horizontal};

use crate::config::{ConfigError, MotorConfig};
use crate::events::MotorEvent;
use crate::flags::CollisionFlags;
use crate::grounding::is_too_steep;
use crate::host::{CharacterHost, MoveOutcome};
use crate::jump::jump_vertical_speed;
use crate::speed::max_speed_in_direction;
use crate::state::{
    CharacterRuntimeState, JumpingState, MovementState, MovingPlatformState, PendingSubtraction,
};

/// Undershoot of the realized vertical velocity that counts as external interference.
const VERTICAL_UNDERSHOOT_EPSILON: f32 = 0.001;

/// Events kept when nobody drains the queue.
const MAX_QUEUED_EVENTS: usize = 64;

/// Character locomotion integrator.
///
/// Turns move/jump intent plus collision feedback from a [`CharacterHost`]
/// into velocity and displacement once per tick, tracking ground contact,
/// slope sliding, variable-height jumps and moving platforms.
///
/// # Example
///
/// ```ignore
/// let mut motor = CharacterMotor::new(MotorConfig::default())?;
///
/// // Each simulation step:
/// motor.set_input(move_direction, jump_held);
/// motor.tick(&mut host, dt);
/// ```
#[derive(Debug, Clone)]
pub struct CharacterMotor {
    pub(crate) config: MotorConfig,
    pub(crate) movement: MovementState,
    pub(crate) jumping: JumpingState,
    pub(crate) platform: MovingPlatformState,
    pub(crate) runtime: CharacterRuntimeState,
    pub(crate) pending_subtraction: Option<PendingSubtraction>,
    /// Simulation time accumulated from tick deltas (s).
    pub(crate) time: f64,
    /// Slope limit sampled from the mover at the start of the tick (degrees).
    pub(crate) slope_limit: f32,
    events: VecDeque<MotorEvent>,
}

impl CharacterMotor {
    /// Create a motor with validated configuration.
    pub fn new(config: MotorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            movement: MovementState::default(),
            jumping: JumpingState::default(),
            platform: MovingPlatformState::default(),
            runtime: CharacterRuntimeState::default(),
            pending_subtraction: None,
            time: 0.0,
            slope_limit: 45.0,
            events: VecDeque::new(),
        })
    }

    /// Replace the configuration between ticks.
    pub fn reconfigure(&mut self, config: MotorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if !config.moving_platform.enabled {
            self.platform.active_platform = None;
            self.platform.platform_velocity = Vec3::ZERO;
            self.cancel_pending_subtraction("platforms disabled");
        }
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Set this tick's intent. Call once before [`CharacterMotor::tick`].
    pub fn set_input(&mut self, move_direction: Vec3, jump: bool) {
        self.runtime.input_move_direction = if move_direction.is_finite() {
            move_direction
        } else {
            Vec3::ZERO
        };
        self.runtime.input_jump = jump;
    }

    pub fn set_controllable(&mut self, controllable: bool) {
        self.runtime.can_control = controllable;
    }

    /// Override the velocity (knockback, launch pads). Forces the character airborne.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.runtime.grounded = false;
        self.movement.velocity = velocity;
        self.movement.frame_velocity = Vec3::ZERO;
        self.push_event(MotorEvent::ExternalVelocity { velocity });
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the motor by `dt` seconds.
    ///
    /// `dt` must be positive and finite. Debug builds panic on anything else;
    /// release builds log a warning and leave every piece of state untouched.
    pub fn tick<H: CharacterHost + ?Sized>(&mut self, host: &mut H, dt: f32) {
        let valid_dt = dt.is_finite() && dt > 0.0;
        debug_assert!(valid_dt, "invalid time step {dt}");
        if !valid_dt {
            tracing::warn!(dt, "ignoring tick with invalid time step");
            return;
        }
        let _span = tracing::trace_span!("motor_tick").entered();

        self.time += f64::from(dt);
        self.slope_limit = host.slope_limit();
        let step_offset = host.step_offset();

        self.update_platform_velocity(&*host, dt);
        self.advance_pending_subtraction();

        let mut velocity = self.movement.velocity;
        velocity = self.apply_input_velocity_change(velocity, host.rotation(), dt);
        velocity = self.apply_gravity_and_jumping(velocity, dt);

        self.platform.ride_flags = CollisionFlags::NONE;
        if self.move_with_platform() {
            self.ride_platform(host);
        }

        let last_position = host.position();

        let mut offset = velocity * dt;
        // Push toward the ground so walking down steps or over a crest keeps contact.
        let push_down = step_offset.max(horizontal(offset).length());
        if self.runtime.grounded {
            offset -= Vec3::Y * push_down;
        }

        self.platform.hit_platform = None;
        self.runtime.ground_normal = Vec3::ZERO;

        let outcome = host.move_by(offset).unwrap_or_else(|err| {
            tracing::warn!(%err, "mover failed, treating tick as stationary");
            MoveOutcome::default()
        });
        self.movement.collision_flags = outcome.flags;
        for contact in &outcome.contacts {
            self.classify_contact(contact);
        }
        self.movement.last_hit_point = self.movement.hit_point;
        self.runtime.last_ground_normal = self.runtime.ground_normal;

        self.switch_platform(&*host);

        self.movement.velocity = self.realized_velocity(velocity, host.position() - last_position, dt);

        self.apply_ground_transitions(host, push_down);
        if !self.runtime.grounded {
            self.release_platform_if_unlocked();
        }

        if self.move_with_platform() {
            self.record_platform_anchor(&*host);
        }

        tracing::trace!(
            velocity = ?self.movement.velocity,
            grounded = self.runtime.grounded,
            flags = self.movement.collision_flags.0,
            "tick complete"
        );
    }

    /// Velocity implied by the displacement the mover actually performed.
    fn realized_velocity(&mut self, intended: Vec3, displacement: Vec3, dt: f32) -> Vec3 {
        let raw = displacement / dt;
        let old_h = horizontal(intended);

        // Collision sliding may push the character sideways; only keep the
        // part of the new horizontal motion along the intended direction.
        let mut realized = if old_h == Vec3::ZERO {
            Vec3::new(0.0, raw.y, 0.0)
        } else {
            let projected = horizontal(raw).dot(old_h) / old_h.length_squared();
            old_h * projected.clamp(0.0, 1.0) + Vec3::Y * raw.y
        };

        if realized.y < intended.y - VERTICAL_UNDERSHOOT_EPSILON {
            if realized.y < 0.0 {
                // Forced down faster than expected: ignored.
                realized.y = intended.y;
            } else {
                // Upward motion blocked: a ceiling ends the extra jump force.
                if self.jumping.holding_jump_button {
                    self.push_event(MotorEvent::HitCeiling);
                }
                self.jumping.holding_jump_button = false;
            }
        }
        realized
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn is_grounded(&self) -> bool {
        self.runtime.grounded
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping.jumping
    }

    pub fn is_sliding(&self) -> bool {
        self.runtime.grounded && self.config.sliding.enabled && self.too_steep()
    }

    pub fn is_touching_ceiling(&self) -> bool {
        self.movement.collision_flags.contains(CollisionFlags::ABOVE)
    }

    /// Whether the current ground is steeper than the mover's slope limit.
    pub fn too_steep(&self) -> bool {
        is_too_steep(self.runtime.ground_normal, self.slope_limit)
    }

    pub fn velocity(&self) -> Vec3 {
        self.movement.velocity
    }

    pub fn frame_velocity(&self) -> Vec3 {
        self.movement.frame_velocity
    }

    pub fn platform_velocity(&self) -> Vec3 {
        self.platform.platform_velocity
    }

    pub fn active_platform(&self) -> Option<BodyId> {
        self.platform.active_platform
    }

    pub fn ground_normal(&self) -> Vec3 {
        self.runtime.ground_normal
    }

    /// Current world-space move intent.
    pub fn direction(&self) -> Vec3 {
        self.runtime.input_move_direction
    }

    pub fn collision_flags(&self) -> CollisionFlags {
        self.movement.collision_flags
    }

    pub fn has_pending_platform_subtraction(&self) -> bool {
        self.pending_subtraction.is_some()
    }

    /// Simulation time accumulated by the motor (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn movement(&self) -> &MovementState {
        &self.movement
    }

    pub fn jumping(&self) -> &JumpingState {
        &self.jumping
    }

    pub fn platform(&self) -> &MovingPlatformState {
        &self.platform
    }

    pub fn runtime(&self) -> &CharacterRuntimeState {
        &self.runtime
    }

    pub fn max_acceleration(&self, grounded: bool) -> f32 {
        if grounded {
            self.config.movement.max_ground_acceleration
        } else {
            self.config.movement.max_air_acceleration
        }
    }

    pub fn calculate_jump_vertical_speed(&self, target_height: f32) -> f32 {
        jump_vertical_speed(target_height, self.config.movement.gravity)
    }

    /// Speed cap for a direction in the character's local frame.
    pub fn max_speed_in_direction(&self, direction: Vec3) -> f32 {
        max_speed_in_direction(&self.config.movement, direction)
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub(crate) fn push_event(&mut self, event: MotorEvent) {
        if self.events.len() == MAX_QUEUED_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Drain queued notifications (jumps, landings, falls, external velocity).
    pub fn drain_events(&mut self) -> Vec<MotorEvent> {
        self.events.drain(..).collect()
    }

    pub fn events(&self) -> impl Iterator<Item = &MotorEvent> {
        self.events.iter()
    }
}
