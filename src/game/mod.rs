//! Flappy Bird game core.
//!
//! The bird falls under gravity and flaps whenever the proximity sensor sees
//! something close. Pipes scroll in from the right; passing one scores a point,
//! touching one (or the top or bottom of the world) ends the run.

pub mod logic;
pub mod session;
pub mod types;

pub use logic::*;
pub use session::*;
pub use types::*;
