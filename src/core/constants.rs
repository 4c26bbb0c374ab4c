use std::time::Duration;

// World geometry (pixel units of the original background image)
pub const WORLD_WIDTH: u32 = 1518;
pub const WORLD_HEIGHT: u32 = 816;

// Game timing
pub const TICKS_PER_SECOND: u64 = 60;
pub const TICK_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / TICKS_PER_SECOND);

// Bird physics (units per tick)
pub const GRAVITY: f64 = 0.6;
pub const FLAP_STRENGTH: f64 = -3.0;
pub const BIRD_X: f64 = 500.0;
pub const BIRD_RADIUS: f64 = 20.0;

// Pipes
pub const PIPE_SPEED: f64 = 3.0;
pub const PIPE_GAP: f64 = 150.0;
pub const PIPE_WIDTH: f64 = 50.0;
/// Minimum distance between a gap and the top or bottom of the world.
pub const PIPE_MARGIN: u32 = 100;

// Proximity input
pub const FLAP_DISTANCE_THRESHOLD_CM: f64 = 16.0;
pub const FLAP_COOLDOWN_MS: u64 = 300;

// Sensor sampling
pub const DEFAULT_NUM_SAMPLES: usize = 3;
pub const DEFAULT_OUTLIER_THRESHOLD_CM: f64 = 5.0;
/// Returned by the sampler when no valid reading was collected.
pub const NO_READING: f64 = 0.0;

// Serial protocol
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const SENSOR_TRIGGER_BYTE: u8 = b'R';
pub const SENSOR_READ_TIMEOUT: Duration = Duration::from_millis(10);
pub const SENSOR_SETTLE_DELAY: Duration = Duration::from_millis(5);
/// The rangefinder board resets when the port opens.
pub const SENSOR_WARMUP: Duration = Duration::from_secs(1);
/// Longest line accepted from the sensor before it is treated as malformed.
pub const SENSOR_MAX_LINE_BYTES: usize = 16;

// Keyboard stand-in for the sensor
pub const KEYBOARD_NEAR_CM: u32 = 5;
pub const KEYBOARD_FAR_CM: u32 = 100;
pub const KEYBOARD_HOLD: Duration = Duration::from_millis(120);

// Game over screen
pub const RESTART_DELAY_MS: u64 = 1000;

// Files under the data directory
pub const DATA_DIR_NAME: &str = ".sonic-flap";
pub const HIGH_SCORE_FILE: &str = "high_score.txt";
pub const CONFIG_FILE: &str = "config.json";
pub const LOG_FILE: &str = "sonic-flap.log";
pub const LOG_ENV_VAR: &str = "SONIC_FLAP_LOG";
