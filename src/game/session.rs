//! The play session: turns sensor readings into flaps, runs world ticks, and
//! owns the Playing → GameOver → Restarting/Terminated state machine.
//!
//! Time is passed in as "elapsed since the session started" so the loop in
//! `main` and the tests drive the session the same way.

use super::logic::{process_tick, Collision, TickResult};
use super::types::{Bird, Phase, Pipe, World};
use crate::core::config::{CooldownMode, GameConfig};
use crate::core::constants::NO_READING;
use crate::sensor::DistanceSource;
use crate::utils::persistence::ScoreStore;
use rand::Rng;
use std::time::Duration;

/// Requests coming from outside the core (keyboard, window close).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Restart,
    Quit,
}

/// Rate limiter between proximity readings and flaps.
#[derive(Debug, Clone)]
pub struct FlapCooldown {
    mode: CooldownMode,
    cooldown: Duration,
    last_flap: Option<Duration>,
}

impl FlapCooldown {
    pub fn new(mode: CooldownMode, cooldown: Duration) -> Self {
        Self {
            mode,
            cooldown,
            last_flap: None,
        }
    }

    /// Called once at the start of every tick.
    pub fn begin_tick(&mut self) {
        if self.mode == CooldownMode::PerTick {
            self.last_flap = None;
        }
    }

    /// True if a flap is allowed at `now`; records it as the last flap if so.
    pub fn try_fire(&mut self, now: Duration) -> bool {
        let ready = self
            .last_flap
            .map_or(true, |last| now.saturating_sub(last) >= self.cooldown);
        if ready {
            self.last_flap = Some(now);
        }
        ready
    }

    pub fn reset(&mut self) {
        self.last_flap = None;
    }
}

/// Counters for the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub flaps: u32,
    /// Proximity readings that would have flapped but hit the cooldown.
    pub suppressed_flaps: u32,
    /// Ticks where the sensor produced no valid reading.
    pub sensor_dropouts: u32,
}

/// What the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: Phase,
    pub world_width: f64,
    pub world_height: f64,
    pub bird: Bird,
    pub pipes: Vec<Pipe>,
    pub score: u32,
    /// Known once the run has ended.
    pub high_score: Option<u32>,
    /// The run that just ended beat the stored record.
    pub new_record: bool,
    /// Stable distance (cm) read this tick; 0 means no reading.
    pub distance: f64,
    pub stats: RunStats,
    /// A restart request would be accepted now.
    pub can_restart: bool,
}

pub struct Session {
    pub config: GameConfig,
    pub world: World,
    pub phase: Phase,
    pub distance: f64,
    pub high_score: Option<u32>,
    pub new_record: bool,
    pub stats: RunStats,
    cooldown: FlapCooldown,
    ended_at: Option<Duration>,
    last_now: Duration,
}

impl Session {
    pub fn new<R: Rng>(config: GameConfig, rng: &mut R) -> Self {
        let world = World::new(config.world.clone(), rng);
        let cooldown = FlapCooldown::new(config.input.cooldown_mode, config.input.flap_cooldown());
        Self {
            config,
            world,
            phase: Phase::Playing,
            distance: NO_READING,
            high_score: None,
            new_record: false,
            stats: RunStats::default(),
            cooldown,
            ended_at: None,
            last_now: Duration::ZERO,
        }
    }

    /// Whether a proximity reading is close enough to flap. The no-reading
    /// sentinel never counts as close.
    pub fn is_flap_distance(&self, distance: f64) -> bool {
        distance > NO_READING && distance < self.config.input.flap_distance_threshold
    }

    /// Run one fixed-rate tick at `now`.
    ///
    /// Only `Playing` and `Restarting` do work; a `GameOver` session just waits
    /// for a [`ControlSignal`].
    pub fn tick<S, R>(
        &mut self,
        source: &mut S,
        store: &mut dyn ScoreStore,
        now: Duration,
        rng: &mut R,
    ) -> Option<TickResult>
    where
        S: DistanceSource + ?Sized,
        R: Rng,
    {
        self.last_now = now;
        match self.phase {
            Phase::Playing => Some(self.play_tick(source, store, now, rng)),
            Phase::Restarting => {
                self.restart(rng);
                None
            }
            Phase::GameOver | Phase::Terminated => None,
        }
    }

    fn play_tick<S, R>(
        &mut self,
        source: &mut S,
        store: &mut dyn ScoreStore,
        now: Duration,
        rng: &mut R,
    ) -> TickResult
    where
        S: DistanceSource + ?Sized,
        R: Rng,
    {
        self.cooldown.begin_tick();

        let distance = source.stable_distance();
        self.distance = distance;
        tracing::debug!(distance, "stable distance");
        if distance == NO_READING {
            self.stats.sensor_dropouts += 1;
        }

        let flap = if self.is_flap_distance(distance) {
            let fired = self.cooldown.try_fire(now);
            if !fired {
                self.stats.suppressed_flaps += 1;
            }
            fired
        } else {
            false
        };

        let result = process_tick(&mut self.world, flap, rng);
        self.stats.ticks += 1;
        if flap {
            self.stats.flaps += 1;
        }
        if result.pipes_scored > 0 {
            tracing::debug!(score = self.world.score, "pipe passed");
        }

        if let Some(collision) = result.collision {
            self.end_run(collision, store, now);
        }
        result
    }

    fn end_run(&mut self, collision: Collision, store: &mut dyn ScoreStore, now: Duration) {
        let score = self.world.score;
        let previous = store.load();
        self.new_record = score > previous;
        let best = if self.new_record {
            store.save(score);
            score
        } else {
            previous
        };
        self.high_score = Some(best);
        self.ended_at = Some(now);
        self.phase = Phase::GameOver;
        tracing::info!(
            ?collision,
            score,
            high_score = best,
            new_record = self.new_record,
            ticks = self.stats.ticks,
            flaps = self.stats.flaps,
            suppressed_flaps = self.stats.suppressed_flaps,
            sensor_dropouts = self.stats.sensor_dropouts,
            "game over"
        );
    }

    /// True once the post-crash delay has passed.
    pub fn can_restart(&self, now: Duration) -> bool {
        self.phase == Phase::GameOver
            && self
                .ended_at
                .is_some_and(|ended| now.saturating_sub(ended) >= self.config.input.restart_delay())
    }

    /// Apply a restart or quit request.
    ///
    /// Quitting mid-run still records the score, the same as crashing would.
    pub fn handle_signal(&mut self, signal: ControlSignal, store: &mut dyn ScoreStore, now: Duration) {
        match (self.phase, signal) {
            (Phase::Playing, ControlSignal::Quit) => {
                self.end_run_on_quit(store, now);
                self.phase = Phase::Terminated;
            }
            (Phase::GameOver, ControlSignal::Quit) | (Phase::Restarting, ControlSignal::Quit) => {
                self.phase = Phase::Terminated;
            }
            (Phase::GameOver, ControlSignal::Restart) => {
                if self.can_restart(now) {
                    tracing::info!("restart requested");
                    self.phase = Phase::Restarting;
                }
            }
            _ => {}
        }
        if self.phase == Phase::Terminated {
            tracing::info!("session terminated");
        }
    }

    fn end_run_on_quit(&mut self, store: &mut dyn ScoreStore, now: Duration) {
        let score = self.world.score;
        if score > store.load() {
            store.save(score);
        }
        self.ended_at = Some(now);
        tracing::info!(score, "quit during play");
    }

    fn restart<R: Rng>(&mut self, rng: &mut R) {
        self.world = World::new(self.config.world.clone(), rng);
        self.cooldown.reset();
        self.stats = RunStats::default();
        self.distance = NO_READING;
        self.new_record = false;
        self.ended_at = None;
        self.phase = Phase::Playing;
        tracing::info!("new run started");
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            world_width: self.world.width(),
            world_height: self.world.height(),
            bird: self.world.bird.clone(),
            pipes: self.world.pipes.clone(),
            score: self.world.score,
            high_score: self.high_score,
            new_record: self.new_record,
            distance: self.distance,
            stats: self.stats,
            can_restart: self.can_restart(self.last_now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::FixedDistance;
    use crate::utils::persistence::MemoryScoreStore;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn session(mode: CooldownMode) -> (Session, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut config = GameConfig::default();
        config.input.cooldown_mode = mode;
        (Session::new(config, &mut rng), rng)
    }

    #[test]
    fn test_cooldown_blocks_second_flap_within_window() {
        let mut cooldown = FlapCooldown::new(CooldownMode::Session, ms(300));
        cooldown.begin_tick();
        assert!(cooldown.try_fire(ms(0)));
        cooldown.begin_tick();
        assert!(!cooldown.try_fire(ms(299)));
        cooldown.begin_tick();
        assert!(cooldown.try_fire(ms(300)));
    }

    #[test]
    fn test_per_tick_cooldown_never_blocks() {
        let mut cooldown = FlapCooldown::new(CooldownMode::PerTick, ms(300));
        for t in 0..10 {
            cooldown.begin_tick();
            assert!(cooldown.try_fire(ms(t * 16)));
        }
    }

    #[test]
    fn test_sentinel_never_flaps() {
        let (session, _) = session(CooldownMode::Session);
        assert!(!session.is_flap_distance(0.0));
        assert!(session.is_flap_distance(10.0));
        assert!(!session.is_flap_distance(16.0));
    }

    #[test]
    fn test_close_object_flaps_at_most_once_per_cooldown() {
        let (mut session, mut rng) = session(CooldownMode::Session);
        let mut store = MemoryScoreStore::default();
        let mut near = FixedDistance(5.0);
        // 10 ticks at ~16ms: only the first is outside the cooldown
        for i in 0..10 {
            session.tick(&mut near, &mut store, ms(i * 16), &mut rng);
        }
        assert_eq!(session.stats.flaps, 1);
        assert_eq!(session.stats.suppressed_flaps, 9);
    }

    #[test]
    fn test_legacy_mode_flaps_every_close_tick() {
        let (mut session, mut rng) = session(CooldownMode::PerTick);
        let mut store = MemoryScoreStore::default();
        let mut near = FixedDistance(5.0);
        for i in 0..10 {
            session.tick(&mut near, &mut store, ms(i * 16), &mut rng);
        }
        assert_eq!(session.stats.flaps, 10);
        assert_eq!(session.stats.suppressed_flaps, 0);
    }

    #[test]
    fn test_dropouts_are_counted() {
        let (mut session, mut rng) = session(CooldownMode::Session);
        let mut store = MemoryScoreStore::default();
        let mut nothing = FixedDistance(NO_READING);
        session.tick(&mut nothing, &mut store, ms(0), &mut rng);
        session.tick(&mut nothing, &mut store, ms(16), &mut rng);
        assert_eq!(session.stats.sensor_dropouts, 2);
        assert_eq!(session.stats.flaps, 0);
    }

    #[test]
    fn test_restart_is_delayed_after_crash() {
        let (mut session, mut rng) = session(CooldownMode::Session);
        let mut store = MemoryScoreStore::default();
        session.world.bird.y = 800.0;
        session.world.bird.velocity = 10.0;
        session.tick(&mut FixedDistance(100.0), &mut store, ms(1000), &mut rng);
        assert_eq!(session.phase, Phase::GameOver);

        session.handle_signal(ControlSignal::Restart, &mut store, ms(1500));
        assert_eq!(session.phase, Phase::GameOver);

        session.handle_signal(ControlSignal::Restart, &mut store, ms(2000));
        assert_eq!(session.phase, Phase::Restarting);
    }

    #[test]
    fn test_new_record_only_when_beaten() {
        let (mut session, mut rng) = session(CooldownMode::Session);
        let mut store = MemoryScoreStore { best: 5, saves: 0 };
        session.world.score = 5;
        session.world.bird.y = 900.0;
        session.tick(&mut FixedDistance(100.0), &mut store, ms(0), &mut rng);
        assert_eq!(session.phase, Phase::GameOver);
        assert!(!session.snapshot().new_record);
        assert_eq!(store.saves, 0);

        session.handle_signal(ControlSignal::Restart, &mut store, ms(2000));
        session.tick(&mut FixedDistance(100.0), &mut store, ms(2000), &mut rng);
        session.world.score = 6;
        session.world.bird.y = 900.0;
        session.tick(&mut FixedDistance(100.0), &mut store, ms(2016), &mut rng);
        assert!(session.snapshot().new_record);
        assert_eq!(store.best, 6);

        session.handle_signal(ControlSignal::Restart, &mut store, ms(4000));
        session.tick(&mut FixedDistance(100.0), &mut store, ms(4000), &mut rng);
        assert!(!session.new_record);
    }

    #[test]
    fn test_restart_ignored_while_playing() {
        let (mut session, _) = session(CooldownMode::Session);
        let mut store = MemoryScoreStore::default();
        session.handle_signal(ControlSignal::Restart, &mut store, ms(5000));
        assert_eq!(session.phase, Phase::Playing);
    }

    #[test]
    fn test_quit_during_play_saves_record() {
        let (mut session, _) = session(CooldownMode::Session);
        let mut store = MemoryScoreStore::default();
        session.world.score = 4;
        session.handle_signal(ControlSignal::Quit, &mut store, ms(100));
        assert_eq!(session.phase, Phase::Terminated);
        assert_eq!(store.best, 4);
    }

    #[test]
    fn test_snapshot_reflects_world() {
        let (mut session, mut rng) = session(CooldownMode::Session);
        let mut store = MemoryScoreStore::default();
        session.tick(&mut FixedDistance(42.0), &mut store, ms(0), &mut rng);
        let snap = session.snapshot();
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.distance, 42.0);
        assert_eq!(snap.pipes.len(), session.world.pipes.len());
        assert_eq!(snap.bird, session.world.bird);
        assert_eq!(snap.world_height, 816.0);
        assert!(snap.high_score.is_none());
        assert!(!snap.new_record);
        assert!(!snap.can_restart);
    }
}
