//! Runtime configuration.
//!
//! Every field has a default matching the tuned constants, so a missing or
//! partial `config.json` still produces a playable game.

use super::constants::*;
use crate::sensor::SamplerConfig;
use crate::utils::persistence::load_json_or_default;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// World geometry and physics tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: u32,
    pub height: u32,
    pub gravity: f64,
    /// Velocity the bird is set to on a flap (negative = upward).
    pub flap_strength: f64,
    pub pipe_speed: f64,
    pub pipe_gap: f64,
    pub pipe_width: f64,
    pub pipe_margin: u32,
    pub bird_x: f64,
    pub bird_radius: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            gravity: GRAVITY,
            flap_strength: FLAP_STRENGTH,
            pipe_speed: PIPE_SPEED,
            pipe_gap: PIPE_GAP,
            pipe_width: PIPE_WIDTH,
            pipe_margin: PIPE_MARGIN,
            bird_x: BIRD_X,
            bird_radius: BIRD_RADIUS,
        }
    }
}

/// Where the "last flap" timestamp lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownMode {
    /// Owned by the play session, so the cooldown actually limits flap rate.
    #[default]
    Session,
    /// Reset at the start of every tick. The cooldown never blocks a flap;
    /// kept for comparing against recordings made with older builds.
    PerTick,
}

/// How sensor readings become flaps, plus game-over input timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// An object closer than this (cm) triggers a flap.
    pub flap_distance_threshold: f64,
    pub flap_cooldown_ms: u64,
    pub cooldown_mode: CooldownMode,
    /// Restart requests are ignored for this long after a crash.
    pub restart_delay_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            flap_distance_threshold: FLAP_DISTANCE_THRESHOLD_CM,
            flap_cooldown_ms: FLAP_COOLDOWN_MS,
            cooldown_mode: CooldownMode::Session,
            restart_delay_ms: RESTART_DELAY_MS,
        }
    }
}

impl InputConfig {
    pub fn flap_cooldown(&self) -> Duration {
        Duration::from_millis(self.flap_cooldown_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub sensor: SamplerConfig,
    pub input: InputConfig,
}

impl GameConfig {
    /// Load from a JSON file, falling back to defaults if it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        let config: Self = load_json_or_default(path);
        config.validated()
    }

    /// Replace any section whose values cannot produce a playable game with its
    /// defaults, logging what was rejected.
    pub fn validated(mut self) -> Self {
        let world = &self.world;
        let world_ok = world.width > 0
            && world.height > 0
            && world.bird_radius > 0.0
            && world.pipe_width > 0.0
            && world.pipe_gap > 2.0 * world.bird_radius
            && world.pipe_gap <= world.height as f64
            && world.bird_x > 0.0
            && world.bird_x < world.width as f64;
        if !world_ok {
            tracing::warn!(?world, "world config is not playable. Falling back to defaults.");
            self.world = WorldConfig::default();
        }

        if self.sensor.num_samples == 0 || self.sensor.outlier_threshold <= 0.0 {
            tracing::warn!(
                "sensor.num_samples ({}) and sensor.outlier_threshold ({}) must be positive. Falling back to defaults.",
                self.sensor.num_samples,
                self.sensor.outlier_threshold
            );
            self.sensor = SamplerConfig::default();
        }

        if self.input.flap_distance_threshold <= 0.0 {
            tracing::warn!(
                "input.flap_distance_threshold ({}) must be positive. Using {}.",
                self.input.flap_distance_threshold,
                FLAP_DISTANCE_THRESHOLD_CM
            );
            self.input.flap_distance_threshold = FLAP_DISTANCE_THRESHOLD_CM;
        }

        self
    }
}
