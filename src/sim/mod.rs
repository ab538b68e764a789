//! Deterministic simulation module
//!
//! All ball logic lives here. This module must be pure and deterministic:
//! - One discrete step per `tick` call, no wall-clock time
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod boundary;
pub mod collision;
pub mod rules;
pub mod state;
pub mod tick;

pub use boundary::BoundaryPolicy;
pub use collision::{CollisionResult, WallContact, ball_containment_collision, ball_inside_circle};
pub use rules::{Reactions, Reversal};
pub use state::{Arena, Ball, Color, NoteCounter, SimState, TickReport};
pub use tick::tick;
