//! Bird, pipe, and world state.

use crate::core::config::WorldConfig;
use rand::Rng;

/// The player. `x` never changes during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Bird {
    pub x: f64,
    /// Vertical centre, growing downward from the top of the world.
    pub y: f64,
    /// Units per tick, positive = falling.
    pub velocity: f64,
    pub radius: f64,
}

impl Bird {
    /// A bird at rest, vertically centred.
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            x: config.bird_x,
            y: (config.height / 2) as f64,
            velocity: 0.0,
            radius: config.bird_radius,
        }
    }

    /// Set (not add) the upward impulse.
    pub fn flap(&mut self, impulse: f64) {
        self.velocity = impulse;
    }

    /// One tick of gravity: accelerate, then move.
    pub fn step(&mut self, gravity: f64) {
        self.velocity += gravity;
        self.y += self.velocity;
    }

    pub fn top(&self) -> f64 {
        self.y - self.radius
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.radius
    }

    pub fn left(&self) -> f64 {
        self.x - self.radius
    }

    pub fn right(&self) -> f64 {
        self.x + self.radius
    }
}

/// An upper and lower obstacle with a gap between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    /// Left edge.
    pub x: f64,
    /// Bottom of the upper segment.
    pub gap_top: f64,
    pub gap_size: f64,
    pub width: f64,
    /// Set once the bird has fully passed this pipe.
    pub scored: bool,
}

impl Pipe {
    pub fn new(x: f64, gap_top: f64, config: &WorldConfig) -> Self {
        Self {
            x,
            gap_top,
            gap_size: config.pipe_gap,
            width: config.pipe_width,
            scored: false,
        }
    }

    /// A pipe at `x` with a random gap at least `pipe_margin` away from the top
    /// and bottom of the world.
    pub fn random<R: Rng>(x: f64, config: &WorldConfig, rng: &mut R) -> Self {
        Self::new(x, random_gap_top(config, rng), config)
    }

    pub fn step(&mut self, speed: f64) {
        self.x -= speed;
    }

    pub fn right_edge(&self) -> f64 {
        self.x + self.width
    }

    pub fn gap_bottom(&self) -> f64 {
        self.gap_top + self.gap_size
    }

    /// Entirely past the left edge of the world.
    pub fn off_screen(&self) -> bool {
        self.x < -self.width
    }
}

/// Draw a gap top in `[margin, height - gap - margin]`. Worlds too short for
/// both margins shrink the margin so the gap still fits.
pub fn random_gap_top<R: Rng>(config: &WorldConfig, rng: &mut R) -> f64 {
    let room = (config.height as f64 - config.pipe_gap).max(0.0) as u32;
    let margin = config.pipe_margin.min(room / 2);
    let max_top = room - margin;
    rng.gen_range(margin..=max_top) as f64
}

/// Lifecycle of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    GameOver,
    Restarting,
    Terminated,
}

/// Everything that moves during a run.
#[derive(Debug, Clone)]
pub struct World {
    pub config: WorldConfig,
    pub bird: Bird,
    /// In spawn order, which is also left-to-right.
    pub pipes: Vec<Pipe>,
    pub score: u32,
}

impl World {
    /// A fresh run: centred bird, one pipe at the right edge, score 0.
    pub fn new<R: Rng>(config: WorldConfig, rng: &mut R) -> Self {
        let first_pipe = Pipe::random(config.width as f64, &config, rng);
        Self {
            bird: Bird::new(&config),
            pipes: vec![first_pipe],
            score: 0,
            config,
        }
    }

    pub fn width(&self) -> f64 {
        self.config.width as f64
    }

    pub fn height(&self) -> f64 {
        self.config.height as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_bird_is_centred_and_at_rest() {
        let bird = Bird::new(&WorldConfig::default());
        assert_eq!(bird.x, 500.0);
        assert_eq!(bird.y, 408.0);
        assert_eq!(bird.velocity, 0.0);
        assert_eq!(bird.radius, 20.0);
    }

    #[test]
    fn test_gravity_tick_from_rest() {
        let mut bird = Bird::new(&WorldConfig::default());
        bird.step(0.6);
        assert!((bird.velocity - 0.6).abs() < 1e-9);
        assert!((bird.y - 408.6).abs() < 1e-9);
    }

    #[test]
    fn test_flap_overrides_velocity() {
        let mut bird = Bird::new(&WorldConfig::default());
        bird.velocity = 2.0;
        bird.flap(-3.0);
        assert_eq!(bird.velocity, -3.0);
    }

    #[test]
    fn test_flap_twice_same_as_once() {
        let mut bird = Bird::new(&WorldConfig::default());
        bird.velocity = 5.0;
        bird.flap(-3.0);
        bird.flap(-3.0);
        assert_eq!(bird.velocity, -3.0);
    }

    #[test]
    fn test_pipe_off_screen_boundary() {
        let config = WorldConfig::default();
        assert!(Pipe::new(-51.0, 200.0, &config).off_screen());
        assert!(!Pipe::new(-50.0, 200.0, &config).off_screen());
        assert!(!Pipe::new(-49.0, 200.0, &config).off_screen());
    }

    #[test]
    fn test_pipe_step_moves_left() {
        let config = WorldConfig::default();
        let mut pipe = Pipe::new(100.0, 200.0, &config);
        pipe.step(3.0);
        assert_eq!(pipe.x, 97.0);
        assert_eq!(pipe.gap_top, 200.0);
    }

    #[test]
    fn test_random_gap_within_margins() {
        let config = WorldConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let top = random_gap_top(&config, &mut rng);
            assert!(top >= 100.0);
            assert!(top <= 816.0 - 150.0 - 100.0);
            assert!(top + config.pipe_gap <= config.height as f64);
        }
    }

    #[test]
    fn test_random_gap_in_short_world_still_fits() {
        let config = WorldConfig {
            height: 200,
            ..WorldConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            let top = random_gap_top(&config, &mut rng);
            assert!(top >= 0.0);
            assert!(top + config.pipe_gap <= 200.0);
        }
    }

    #[test]
    fn test_new_world_has_one_pipe_at_right_edge() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let world = World::new(WorldConfig::default(), &mut rng);
        assert_eq!(world.pipes.len(), 1);
        assert_eq!(world.pipes[0].x, 1518.0);
        assert!(!world.pipes[0].scored);
        assert_eq!(world.score, 0);
    }
}
