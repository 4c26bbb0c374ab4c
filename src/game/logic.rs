//! Per-tick physics, collision detection, and scoring.

use super::types::{Bird, Pipe, World};
use rand::Rng;

/// What ended a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Ceiling,
    Floor,
    /// Index into `World::pipes` at the time of the check.
    Pipe(usize),
}

/// Result of one world tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickResult {
    /// The bird flapped this tick.
    pub flapped: bool,
    /// Pipes that became scored this tick.
    pub pipes_scored: u32,
    /// A new pipe was appended at the right edge.
    pub pipe_spawned: bool,
    /// Pipes removed after leaving the screen.
    pub pipes_retired: usize,
    /// Set if the run ended this tick.
    pub collision: Option<Collision>,
}

/// Bird outside the world vertically.
pub fn check_bounds(bird: &Bird, world_height: f64) -> Option<Collision> {
    if bird.top() < 0.0 {
        Some(Collision::Ceiling)
    } else if bird.bottom() > world_height {
        Some(Collision::Floor)
    } else {
        None
    }
}

/// Bird overlaps the pipe horizontally and pokes out of its gap.
pub fn hits_pipe(bird: &Bird, pipe: &Pipe) -> bool {
    let overlaps = bird.right() > pipe.x && bird.left() < pipe.right_edge();
    overlaps && (bird.top() < pipe.gap_top || bird.bottom() > pipe.gap_bottom())
}

/// First collision found, bounds before pipes. Any hit ends the run, so which
/// one is reported only matters for logging.
pub fn check_collisions(world: &World) -> Option<Collision> {
    check_bounds(&world.bird, world.height()).or_else(|| {
        world
            .pipes
            .iter()
            .position(|pipe| hits_pipe(&world.bird, pipe))
            .map(Collision::Pipe)
    })
}

/// Mark every newly passed pipe as scored and add it to the score.
/// Returns how many pipes were scored.
pub fn update_score(world: &mut World) -> u32 {
    let bird_x = world.bird.x;
    let mut scored = 0;
    for pipe in &mut world.pipes {
        if !pipe.scored && pipe.right_edge() < bird_x {
            pipe.scored = true;
            scored += 1;
        }
    }
    world.score += scored;
    scored
}

/// Append a pipe at the right edge once the newest one is past mid-screen.
pub fn spawn_pipe_if_needed<R: Rng>(world: &mut World, rng: &mut R) -> bool {
    let half_width = (world.config.width / 2) as f64;
    let needs_pipe = world.pipes.last().map_or(true, |last| last.x < half_width);
    if needs_pipe {
        let pipe = Pipe::random(world.width(), &world.config, rng);
        world.pipes.push(pipe);
    }
    needs_pipe
}

/// Drop pipes that have scrolled past the left edge.
pub fn retire_pipes(world: &mut World) -> usize {
    let before = world.pipes.len();
    world.pipes.retain(|pipe| !pipe.off_screen());
    before - world.pipes.len()
}

/// Move every pipe, then spawn and retire.
pub fn advance_pipes<R: Rng>(world: &mut World, rng: &mut R) -> (bool, usize) {
    let speed = world.config.pipe_speed;
    for pipe in &mut world.pipes {
        pipe.step(speed);
    }
    let spawned = spawn_pipe_if_needed(world, rng);
    let retired = retire_pipes(world);
    (spawned, retired)
}

/// Advance the world by one tick: flap, gravity, pipes, collisions, score.
///
/// Scoring runs even on the tick the bird crashes, so a pipe cleared on the
/// same tick still counts.
pub fn process_tick<R: Rng>(world: &mut World, flap: bool, rng: &mut R) -> TickResult {
    if flap {
        world.bird.flap(world.config.flap_strength);
    }
    world.bird.step(world.config.gravity);

    let (pipe_spawned, pipes_retired) = advance_pipes(world, rng);
    let collision = check_collisions(world);
    let pipes_scored = update_score(world);

    TickResult {
        flapped: flap,
        pipes_scored,
        pipe_spawned,
        pipes_retired,
        collision,
    }
}
