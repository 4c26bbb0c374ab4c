//! Sonic Flap - Flappy Bird steered by an ultrasonic proximity sensor.
//!
//! This module exposes the game logic for testing and for the binary.

pub mod build_info;
pub mod core;
pub mod game;
pub mod input;
pub mod sensor;
pub mod ui;
pub mod utils;

pub use crate::core::config::{CooldownMode, GameConfig};
pub use game::{ControlSignal, Phase, Session, Snapshot};
