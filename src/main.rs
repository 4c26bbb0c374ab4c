use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use sonic_flap::build_info;
use sonic_flap::core::constants::{
    CONFIG_FILE, DEFAULT_BAUD_RATE, HIGH_SCORE_FILE, LOG_FILE, SENSOR_WARMUP, TICK_INTERVAL,
};
use sonic_flap::input::{map_key, KeyAction};
use sonic_flap::sensor::{
    DistanceSource, KeyboardChannel, ProximityHandle, Sampler, SamplerConfig, SensorChannel,
    SensorPoller, SerialChannel,
};
use sonic_flap::ui::draw_ui;
use sonic_flap::utils::logging::init_file_logging;
use sonic_flap::utils::persistence::{data_dir, HighScoreFile, ScoreStore};
use sonic_flap::{CooldownMode, GameConfig, Phase, Session};
use std::io;
use std::path::PathBuf;
use std::time::Instant;

/// Flappy Bird controlled by an ultrasonic rangefinder: hold a hand near the
/// sensor to flap.
#[derive(Debug, Parser)]
#[command(name = "sonic-flap", disable_version_flag = true)]
struct Cli {
    /// Serial port the rangefinder is attached to (e.g. /dev/ttyUSB0, COM6)
    #[arg(long, conflicts_with = "keyboard")]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Play without hardware: Space stands in for a hand over the sensor
    #[arg(long)]
    keyboard: bool,

    /// Sample the sensor on a background thread instead of inside each tick
    #[arg(long)]
    threaded_sensor: bool,

    /// Config file (default: ~/.sonic-flap/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// High score file (default: ~/.sonic-flap/high_score.txt)
    #[arg(long)]
    high_score_file: Option<PathBuf>,

    /// Reset the flap cooldown every tick, like older builds did
    #[arg(long)]
    legacy_cooldown: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Show version information
    #[arg(short = 'v', long)]
    version: bool,
}

/// The distance source the loop reads each tick, plus the keyboard handle when
/// the sensor is simulated.
struct GameInput {
    source: Box<dyn DistanceSource>,
    proximity: Option<ProximityHandle>,
}

fn open_input(cli: &Cli, sampler_config: SamplerConfig) -> Result<GameInput> {
    let (channel, proximity): (Box<dyn SensorChannel + Send>, Option<ProximityHandle>) =
        if cli.keyboard {
            let (channel, handle) = KeyboardChannel::new();
            (Box::new(channel), Some(handle))
        } else {
            let port = cli
                .port
                .as_deref()
                .context("no sensor port given. Use --port <PATH>, or --keyboard to play without one")?;
            let channel = SerialChannel::open(port, cli.baud)?;
            tracing::info!(port = channel.name(), "waiting for sensor to start");
            std::thread::sleep(SENSOR_WARMUP);
            (Box::new(channel), None)
        };

    let sampler = Sampler::new(channel, sampler_config);
    let source: Box<dyn DistanceSource> = if cli.threaded_sensor {
        Box::new(
            SensorPoller::spawn(sampler, TICK_INTERVAL)
                .context("failed to start sensor poller thread")?,
        )
    } else {
        Box::new(sampler)
    };

    Ok(GameInput { source, proximity })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", build_info::version_line());
        return Ok(());
    }

    let data_dir = data_dir();
    match &data_dir {
        Ok(dir) => {
            if let Err(e) = init_file_logging(&dir.join(LOG_FILE)) {
                eprintln!("Warning: logging disabled: {e:#}");
            }
        }
        Err(e) => eprintln!("Warning: no data directory ({e}); logging disabled"),
    }
    tracing::info!("{}", build_info::version_line());

    let config_path = cli
        .config
        .clone()
        .or_else(|| data_dir.as_ref().ok().map(|dir| dir.join(CONFIG_FILE)));
    let mut config = config_path
        .as_deref()
        .map(GameConfig::load)
        .unwrap_or_default();
    if cli.legacy_cooldown {
        config.input.cooldown_mode = CooldownMode::PerTick;
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let high_score_path = cli
        .high_score_file
        .clone()
        .or_else(|| data_dir.as_ref().ok().map(|dir| dir.join(HIGH_SCORE_FILE)))
        .unwrap_or_else(|| PathBuf::from(HIGH_SCORE_FILE));
    let mut store = HighScoreFile::new(high_score_path);
    tracing::debug!(path = %store.path().display(), "high score file");

    // Without an input source there is no game: report and bail before the
    // terminal leaves the normal screen.
    let mut input = match open_input(&cli, config.sensor) {
        Ok(input) => input,
        Err(e) => {
            tracing::error!("sensor unavailable: {e:#}");
            eprintln!("Could not open sensor: {e:#}");
            std::process::exit(1);
        }
    };

    let mut rng = rand::thread_rng();
    let mut session = Session::new(config, &mut rng);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_game(&mut terminal, &mut session, &mut input, &mut store, cli.keyboard);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Fixed-rate loop: handle keys between ticks, tick and redraw every
/// `TICK_INTERVAL` until the session terminates.
fn run_game<B: Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
    input: &mut GameInput,
    store: &mut dyn ScoreStore,
    keyboard_mode: bool,
) -> Result<()> {
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    let mut next_tick = start;

    while session.phase != Phase::Terminated {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match map_key(key) {
                    KeyAction::Control(signal) => {
                        session.handle_signal(signal, store, start.elapsed())
                    }
                    KeyAction::Proximity => {
                        if let Some(handle) = &input.proximity {
                            handle.press();
                        }
                    }
                    KeyAction::None => {}
                }
            }
            continue;
        }

        let now = Instant::now();
        session.tick(input.source.as_mut(), store, now - start, &mut rng);
        let snap = session.snapshot();
        terminal.draw(|f| draw_ui(f, &snap, keyboard_mode))?;

        next_tick += TICK_INTERVAL;
        if next_tick < now {
            // Fell behind (slow sensor or terminal); skip the missed ticks.
            next_tick = now + TICK_INTERVAL;
        }
    }

    Ok(())
}
