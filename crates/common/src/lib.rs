//! Shared value types and vector helpers used across the locomotor workspace.

mod math;
mod types;

pub use math::{horizontal, project_on, slerp_direction};
pub use types::{BodyId, Transform};
