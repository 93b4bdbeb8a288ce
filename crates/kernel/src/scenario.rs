//! YAML scenarios: world layout, motor tuning and a scripted input timeline,
//! plus the loop that runs them.
//!
//! ```yaml
//! name: ride
//! dt: 0.02
//! duration: 3.0
//! character:
//!   position: [0.0, 1.0, 0.0]
//! bodies:
//!   - name: lift
//!     shape: { kind: slab, half_extents: [3.0, 0.25, 3.0] }
//!     position: [0.0, -0.25, 0.0]
//!     motion: { kind: linear, velocity: [1.0, 0.0, 0.0] }
//! inputs:
//!   - { at: 1.0, move: [0.0, 0.0, 1.0] }
//!   - { at: 2.0, jump: true }
//! ```

use std::collections::HashSet;
use std::path::Path;

use glam::{EulerRot, Quat, Vec3};
use locomotor_common::{BodyId, Transform};
use locomotor_motor::{
    CharacterMotor, ConfigError, InputSource, MotorConfig, MotorEvent, MotorInput, TransformProvider,
};
use serde::{Deserialize, Serialize};

use crate::world::{Body, BodyMotion, Capsule, Shape, World, WorldError};

/// Errors from loading or running a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("motor configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("world: {0}")]
    World(#[from] WorldError),
    #[error("invalid scenario: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSpec {
    /// Capsule centre.
    pub position: Vec3,
    pub yaw_deg: f32,
    pub capsule: Capsule,
}

impl Default for CharacterSpec {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 0.0),
            yaw_deg: 0.0,
            capsule: Capsule::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub name: String,
    pub shape: Shape,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles (degrees), applied X then Y then Z.
    #[serde(default)]
    pub rotation_deg: Vec3,
    #[serde(default)]
    pub motion: BodyMotion,
    /// Remove the body at this time (s).
    #[serde(default)]
    pub despawn_at: Option<f64>,
}

impl BodySpec {
    fn to_body(&self) -> Body {
        let r = self.rotation_deg;
        let rotation = Quat::from_euler(EulerRot::XYZ, r.x.to_radians(), r.y.to_radians(), r.z.to_radians());
        let transform = Transform {
            position: self.position,
            rotation,
            ..Transform::default()
        };
        Body::new(self.name.clone(), self.shape, transform).with_motion(self.motion)
    }
}

/// Input held from `at` until the next key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputKey {
    pub at: f64,
    #[serde(default, rename = "move")]
    pub move_direction: Vec3,
    #[serde(default)]
    pub jump: bool,
}

/// External velocity override at a given time (launch pads, knockback).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    pub at: f64,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    /// Fixed time step (s).
    pub dt: f32,
    /// Simulated time (s).
    pub duration: f32,
    pub motor: MotorConfig,
    pub character: CharacterSpec,
    pub bodies: Vec<BodySpec>,
    pub inputs: Vec<InputKey>,
    pub launches: Vec<Launch>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "untitled".into(),
            dt: 0.02,
            duration: 5.0,
            motor: MotorConfig::default(),
            character: CharacterSpec::default(),
            bodies: Vec::new(),
            inputs: Vec::new(),
            launches: Vec::new(),
        }
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn to_yaml(&self) -> Result<String, ScenarioError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ScenarioError::Invalid(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(ScenarioError::Invalid(format!(
                "duration must be non-negative, got {}",
                self.duration
            )));
        }
        self.motor.validate()?;
        self.character.capsule.validate()?;

        let mut names = HashSet::new();
        for body in &self.bodies {
            if !names.insert(body.name.as_str()) {
                return Err(ScenarioError::Invalid(format!("duplicate body name `{}`", body.name)));
            }
        }
        if self.inputs.windows(2).any(|w| w[1].at < w[0].at) {
            return Err(ScenarioError::Invalid("input keys must be sorted by time".into()));
        }
        Ok(())
    }

    /// Number of ticks needed to cover `duration`.
    pub fn ticks(&self) -> u64 {
        (f64::from(self.duration) / f64::from(self.dt)).round() as u64
    }
}

/// Replays [`InputKey`]s against a fixed-step clock.
#[derive(Debug, Clone)]
pub struct InputScript {
    keys: Vec<InputKey>,
    dt: f64,
    time: f64,
}

impl InputScript {
    /// `keys` must be sorted by time.
    pub fn new(keys: Vec<InputKey>, dt: f32) -> Self {
        Self {
            keys,
            dt: f64::from(dt),
            time: 0.0,
        }
    }

    /// Input in effect at `time`.
    pub fn sample(&self, time: f64) -> MotorInput {
        self.keys
            .iter()
            .take_while(|key| key.at <= time)
            .last()
            .map(|key| MotorInput {
                move_direction: key.move_direction,
                jump: key.jump,
            })
            .unwrap_or_default()
    }
}

impl InputSource for InputScript {
    fn next_input(&mut self) -> MotorInput {
        let input = self.sample(self.time);
        self.time += self.dt;
        input
    }
}

/// State recorded after each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub tick: u64,
    pub time: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    pub jumping: bool,
    pub sliding: bool,
    pub platform: Option<String>,
    pub events: Vec<MotorEvent>,
}

/// A running scenario: world, motor and the timeline driving them.
#[derive(Debug)]
pub struct Simulation {
    pub world: World,
    pub motor: CharacterMotor,
    input: InputScript,
    launches: Vec<Launch>,
    despawns: Vec<(f64, BodyId)>,
    dt: f32,
    total_ticks: u64,
}

impl Simulation {
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let spec = &scenario.character;
        let mut world = World::with_character(spec.position, spec.capsule)?;
        world.rotate_yaw(spec.yaw_deg.to_radians());

        let mut despawns = Vec::new();
        for body in &scenario.bodies {
            let id = world.spawn(body.to_body())?;
            if let Some(at) = body.despawn_at {
                despawns.push((at, id));
            }
        }

        let mut launches = scenario.launches.clone();
        launches.sort_by(|a, b| a.at.total_cmp(&b.at));

        tracing::info!(
            scenario = %scenario.name,
            bodies = world.body_count(),
            ticks = scenario.ticks(),
            "scenario loaded"
        );
        Ok(Self {
            world,
            motor: CharacterMotor::new(scenario.motor.clone())?,
            input: InputScript::new(scenario.inputs.clone(), scenario.dt),
            launches,
            despawns,
            dt: scenario.dt,
            total_ticks: scenario.ticks(),
        })
    }

    pub fn finished(&self) -> bool {
        self.world.tick() >= self.total_ticks
    }

    /// Apply due timeline actions, move the bodies, then tick the motor.
    pub fn step(&mut self) -> Sample {
        let now = self.world.time();

        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.despawns).into_iter().partition(|(at, _)| *at <= now);
        self.despawns = pending;
        for (_, id) in due {
            if let Err(err) = self.world.despawn(id) {
                tracing::warn!(%err, "scheduled despawn failed");
            }
        }

        let fired = self.launches.iter().take_while(|l| l.at <= now).count();
        for launch in self.launches.drain(..fired) {
            self.motor.set_velocity(launch.velocity);
        }

        self.world.step(self.dt);
        let input = self.input.next_input();
        self.motor.set_input(input.move_direction, input.jump);
        self.motor.tick(&mut self.world, self.dt);

        Sample {
            tick: self.world.tick(),
            time: self.world.time(),
            position: self.world.character().position,
            velocity: self.motor.velocity(),
            grounded: self.motor.is_grounded(),
            jumping: self.motor.is_jumping(),
            sliding: self.motor.is_sliding(),
            platform: self
                .motor
                .active_platform()
                .and_then(|id| self.world.body(id))
                .map(|body| body.name.clone()),
            events: self.motor.drain_events(),
        }
    }

    /// Run to the end of the scenario.
    pub fn run(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        while !self.finished() {
            samples.push(self.step());
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(yaml: &str) -> (Simulation, Vec<Sample>) {
        let scenario = Scenario::from_yaml(yaml).unwrap();
        let mut sim = Simulation::new(&scenario).unwrap();
        let samples = sim.run();
        (sim, samples)
    }

    fn all_events(samples: &[Sample]) -> Vec<MotorEvent> {
        samples.iter().flat_map(|s| s.events.clone()).collect()
    }

    const FLOOR: &str = "
bodies:
  - name: floor
    shape: { kind: plane }
";

    #[test]
    fn empty_document_uses_defaults() {
        let scenario = Scenario::from_yaml("{}").unwrap();
        assert_eq!(scenario, Scenario::default());
        assert_eq!(scenario.ticks(), 250);
    }

    #[test]
    fn partial_motor_config_fills_defaults() {
        let scenario = Scenario::from_yaml("motor: { jumping: { base_height: 2.0 } }").unwrap();
        assert_eq!(scenario.motor.jumping.base_height, 2.0);
        assert_eq!(scenario.motor.jumping.extra_height, 2.0);
        assert_eq!(scenario.motor.movement, MotorConfig::default().movement);
    }

    #[test]
    fn yaml_round_trips() {
        let scenario = Scenario::from_yaml(FLOOR).unwrap();
        let again = Scenario::from_yaml(&scenario.to_yaml().unwrap()).unwrap();
        assert_eq!(scenario, again);
    }

    #[test]
    fn rejects_invalid_scenarios() {
        assert!(matches!(Scenario::from_yaml("dt: 0.0"), Err(ScenarioError::Invalid(_))));
        assert!(matches!(
            Scenario::from_yaml("motor: { movement: { max_forward_speed: -1.0 } }"),
            Err(ScenarioError::Config(_))
        ));
        assert!(matches!(
            Scenario::from_yaml("character: { capsule: { radius: 0.0 } }"),
            Err(ScenarioError::World(_))
        ));
        assert!(matches!(
            Scenario::from_yaml("inputs: [{ at: 1.0 }, { at: 0.5 }]"),
            Err(ScenarioError::Invalid(_))
        ));
        assert!(matches!(Scenario::from_yaml("dt: [1, 2]"), Err(ScenarioError::Yaml(_))));

        let dup = "
bodies:
  - { name: a, shape: { kind: plane } }
  - { name: a, shape: { kind: plane } }
";
        assert!(matches!(Scenario::from_yaml(dup), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn input_script_holds_keys_until_the_next() {
        let keys = vec![
            InputKey {
                at: 0.1,
                move_direction: Vec3::Z,
                jump: false,
            },
            InputKey {
                at: 0.3,
                move_direction: Vec3::ZERO,
                jump: true,
            },
        ];
        let mut script = InputScript::new(keys, 0.1);
        assert_eq!(script.next_input(), MotorInput::default());
        assert_eq!(script.next_input().move_direction, Vec3::Z);
        assert_eq!(script.next_input().move_direction, Vec3::Z);
        let late = script.next_input();
        assert!(late.jump);
        assert_eq!(late.move_direction, Vec3::ZERO);
    }

    #[test]
    fn standing_on_floor_stays_put() {
        let (sim, samples) = run(&format!("duration: 2.0\n{FLOOR}"));
        let last = samples.last().unwrap();
        assert!(last.grounded);
        assert!(last.velocity.length() < 1e-3, "v={:?}", last.velocity);
        assert!((sim.world.character().position - Vec3::new(0.0, 1.0, 0.0)).length() < 2e-2);
        assert_eq!(last.platform.as_deref(), Some("floor"));
    }

    #[test]
    fn walking_forward_moves_along_z() {
        let yaml = format!(
            "duration: 2.0\ninputs:\n  - {{ at: 0.0, move: [0.0, 0.0, 1.0] }}\n{FLOOR}"
        );
        let (sim, samples) = run(&yaml);
        let last = samples.last().unwrap();
        assert!(last.grounded);
        assert!((last.velocity.z - 10.0).abs() < 0.1, "v={:?}", last.velocity);
        assert!(sim.world.character().position.z > 15.0);
    }

    #[test]
    fn rides_a_moving_platform() {
        let yaml = "
duration: 1.0
bodies:
  - name: lift
    shape: { kind: slab, half_extents: [3.0, 0.25, 3.0] }
    position: [0.0, -0.25, 0.0]
    motion: { kind: linear, velocity: [1.0, 0.0, 0.0] }
";
        let (sim, samples) = run(yaml);
        let lift = sim.world.find("lift").unwrap();
        let lift_x = sim.world.body(lift).unwrap().transform.position.x;
        let x = sim.world.character().position.x;

        assert!((lift_x - 1.0).abs() < 1e-3);
        assert!((x - lift_x).abs() < 0.1, "character x={x}, lift x={lift_x}");
        assert!(samples.iter().all(|s| s.grounded));
        assert_eq!(sim.motor.active_platform(), Some(lift));
        assert!((sim.motor.platform_velocity().x - 1.0).abs() < 1e-2);
    }

    #[test]
    fn jump_off_platform_carries_its_velocity() {
        let yaml = "
duration: 1.0
inputs:
  - { at: 0.5, jump: true }
  - { at: 0.52 }
bodies:
  - name: lift
    shape: { kind: slab, half_extents: [10.0, 0.25, 10.0] }
    position: [0.0, -0.25, 0.0]
    motion: { kind: linear, velocity: [2.0, 0.0, 0.0] }
";
        let (_, samples) = run(yaml);
        let airborne: Vec<_> = samples.iter().filter(|s| s.jumping && !s.grounded).collect();
        assert!(!airborne.is_empty());
        for s in airborne {
            assert!((s.velocity.x - 2.0).abs() < 0.05, "v={:?}", s.velocity);
        }
    }

    #[test]
    fn vanished_platform_drops_the_character() {
        let yaml = "
duration: 1.5
bodies:
  - name: trapdoor
    shape: { kind: slab, half_extents: [3.0, 0.25, 3.0] }
    position: [0.0, -0.25, 0.0]
    motion: { kind: linear, velocity: [0.5, 0.0, 0.0] }
    despawn_at: 0.5
";
        let (sim, samples) = run(yaml);
        assert!(sim.world.find("trapdoor").is_none());
        assert_eq!(sim.motor.active_platform(), None);
        assert!(!sim.motor.is_grounded());
        assert!(sim.world.character().position.y < 0.0);
        assert!(all_events(&samples).contains(&MotorEvent::Fell));
    }

    #[test]
    fn steep_slope_slides_down() {
        let yaml = "
duration: 2.0
character: { position: [0.0, 1.5, 0.0] }
bodies:
  - name: chute
    shape: { kind: plane }
    rotation_deg: [0.0, 0.0, -60.0]
";
        let (sim, samples) = run(yaml);
        assert!(samples.iter().any(|s| s.sliding));
        let p = sim.world.character().position;
        assert!(p.x > 2.0, "did not slide downhill: {p:?}");
        assert!(p.y < 0.0);
    }

    #[test]
    fn low_ceiling_cuts_the_jump() {
        let yaml = format!(
            "
duration: 1.0
inputs:
  - {{ at: 0.1, jump: true }}
{FLOOR}  - name: roof
    shape: {{ kind: slab, half_extents: [5.0, 0.25, 5.0] }}
    position: [0.0, 2.85, 0.0]
"
        );
        let (_, samples) = run(&yaml);
        let events = all_events(&samples);
        assert!(events.iter().any(|e| matches!(e, MotorEvent::Jumped { .. })));
        assert!(events.contains(&MotorEvent::HitCeiling));
        let top = samples.iter().map(|s| s.position.y).fold(f32::MIN, f32::max);
        assert!(top + 1.0 <= 2.6 + 1e-3, "went through the roof: {top}");
    }

    #[test]
    fn launch_overrides_velocity() {
        let yaml = format!(
            "duration: 0.5\nlaunches:\n  - {{ at: 0.1, velocity: [0.0, 6.0, 3.0] }}\n{FLOOR}"
        );
        let (_, samples) = run(&yaml);
        let events = all_events(&samples);
        assert!(events.contains(&MotorEvent::ExternalVelocity {
            velocity: Vec3::new(0.0, 6.0, 3.0)
        }));
        assert!(samples.iter().any(|s| !s.grounded && s.position.y > 1.2));
    }

    #[test]
    fn spinning_platform_turns_the_character() {
        let yaml = "
duration: 1.0
character: { position: [2.0, 1.0, 0.0] }
bodies:
  - name: carousel
    shape: { kind: slab, half_extents: [4.0, 0.25, 4.0] }
    position: [0.0, -0.25, 0.0]
    motion: { kind: spin, rate: 1.0 }
";
        let (sim, _) = run(yaml);
        let (yaw, _, _) = sim.world.character().rotation.to_euler(EulerRot::YXZ);
        assert!(yaw > 0.8 && yaw < 1.05, "yaw={yaw}");
        let p = sim.world.character().position;
        assert!((Vec3::new(p.x, 0.0, p.z).length() - 2.0).abs() < 0.1, "p={p:?}");
    }

    #[test]
    fn identical_scenarios_are_deterministic() {
        let yaml = "
duration: 2.0
inputs:
  - { at: 0.0, move: [1.0, 0.0, 1.0] }
  - { at: 1.0, jump: true }
bodies:
  - name: lift
    shape: { kind: slab, half_extents: [20.0, 0.25, 20.0] }
    position: [0.0, -0.25, 0.0]
    motion: { kind: oscillate, axis: [0.0, 1.0, 0.0], amplitude: 0.5, period: 2.0 }
";
        let (a, samples_a) = run(yaml);
        let (b, samples_b) = run(yaml);
        assert_eq!(a.world.state_hash(), b.world.state_hash());
        assert_eq!(samples_a, samples_b);
    }
}
