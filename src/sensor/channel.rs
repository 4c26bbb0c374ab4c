//! Distance channels: the request/response link to the rangefinder.
//!
//! The wire protocol is a single trigger byte followed by a newline-terminated
//! ASCII integer (centimetres). Any read that doesn't produce one is an error
//! the sampler drops.

use crate::core::constants::{
    KEYBOARD_FAR_CM, KEYBOARD_HOLD, KEYBOARD_NEAR_CM, SENSOR_MAX_LINE_BYTES,
    SENSOR_READ_TIMEOUT, SENSOR_SETTLE_DELAY, SENSOR_TRIGGER_BYTE,
};
use serialport::{ClearBuffer, SerialPort};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug)]
pub enum SensorError {
    /// No complete response arrived within the read timeout.
    Timeout,
    /// The response was not a non-negative integer.
    Malformed(String),
    /// The board answered 0, its way of saying the ping never came back.
    NoEcho,
    Io(io::Error),
    /// The device went away after it was opened.
    Disconnected,
    /// The device could not be opened at all.
    Unavailable { port: String, reason: String },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor read timed out"),
            Self::Malformed(raw) => write!(f, "malformed sensor reading: {raw:?}"),
            Self::NoEcho => write!(f, "sensor reported no echo"),
            Self::Io(e) => write!(f, "sensor I/O error: {e}"),
            Self::Disconnected => write!(f, "sensor disconnected"),
            Self::Unavailable { port, reason } => {
                write!(f, "could not open sensor port {port}: {reason}")
            }
        }
    }
}

impl std::error::Error for SensorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SensorError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected => Self::Disconnected,
            _ => Self::Io(e),
        }
    }
}

impl From<serialport::Error> for SensorError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::NoDevice => Self::Disconnected,
            serialport::ErrorKind::Io(kind) => Self::from(io::Error::new(kind, e.description)),
            _ => Self::Io(io::Error::new(io::ErrorKind::Other, e.description)),
        }
    }
}

/// Parse one response line into centimetres. A reply of `0` is not a
/// distance and comes back as [`SensorError::NoEcho`].
pub fn parse_distance(line: &str) -> Result<u32, SensorError> {
    let trimmed = line.trim();
    match trimmed.parse::<u32>() {
        Ok(0) => Err(SensorError::NoEcho),
        Ok(distance) => Ok(distance),
        Err(_) => Err(SensorError::Malformed(trimmed.to_string())),
    }
}

/// Read bytes up to a newline. Lines longer than [`SENSOR_MAX_LINE_BYTES`] and
/// lines that aren't UTF-8 are malformed; end of stream means the device is gone.
pub fn read_response_line<R: Read + ?Sized>(reader: &mut R) -> Result<String, SensorError> {
    let mut line = Vec::with_capacity(SENSOR_MAX_LINE_BYTES);
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Err(SensorError::Disconnected),
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => {
                line.push(byte[0]);
                if line.len() > SENSOR_MAX_LINE_BYTES {
                    return Err(SensorError::Malformed(
                        String::from_utf8_lossy(&line).into_owned(),
                    ));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    String::from_utf8(line)
        .map_err(|e| SensorError::Malformed(String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

/// A source of raw distance readings.
pub trait SensorChannel {
    /// Discard anything buffered from earlier requests.
    fn clear_input(&mut self) -> Result<(), SensorError>;

    /// Ask the device for a fresh measurement.
    fn request(&mut self) -> Result<(), SensorError>;

    /// Read the response to the last request.
    fn read_distance(&mut self) -> Result<u32, SensorError>;
}

impl<C: SensorChannel + ?Sized> SensorChannel for Box<C> {
    fn clear_input(&mut self) -> Result<(), SensorError> {
        (**self).clear_input()
    }

    fn request(&mut self) -> Result<(), SensorError> {
        (**self).request()
    }

    fn read_distance(&mut self) -> Result<u32, SensorError> {
        (**self).read_distance()
    }
}

/// Rangefinder attached over a serial port.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialChannel {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, SensorError> {
        let port = serialport::new(path, baud_rate)
            .timeout(SENSOR_READ_TIMEOUT)
            .open()
            .map_err(|e| SensorError::Unavailable {
                port: path.to_string(),
                reason: e.description,
            })?;
        tracing::info!(port = path, baud_rate, "opened sensor port");
        Ok(Self {
            port,
            name: path.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SensorChannel for SerialChannel {
    fn clear_input(&mut self) -> Result<(), SensorError> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn request(&mut self) -> Result<(), SensorError> {
        self.port.write_all(&[SENSOR_TRIGGER_BYTE])?;
        self.port.flush()?;
        Ok(())
    }

    fn read_distance(&mut self) -> Result<u32, SensorError> {
        // Give the board time to ping and answer before checking the buffer.
        std::thread::sleep(SENSOR_SETTLE_DELAY);
        if self.port.bytes_to_read()? == 0 {
            return Err(SensorError::Timeout);
        }
        let line = read_response_line(&mut self.port)?;
        parse_distance(&line)
    }
}

/// Shared handle the terminal layer uses to "wave a hand" at a [`KeyboardChannel`].
#[derive(Debug, Clone, Default)]
pub struct ProximityHandle {
    held_until: Arc<Mutex<Option<Instant>>>,
}

impl ProximityHandle {
    /// Report an object near the sensor for the next [`KEYBOARD_HOLD`].
    pub fn press(&self) {
        let mut held = self.held_until.lock().unwrap_or_else(|e| e.into_inner());
        *held = Some(Instant::now() + KEYBOARD_HOLD);
    }

    fn is_near(&self) -> bool {
        let held = self.held_until.lock().unwrap_or_else(|e| e.into_inner());
        held.is_some_and(|until| Instant::now() < until)
    }
}

/// Sensor stand-in for playing without hardware: reads "near" briefly after
/// each key press and "far" otherwise.
#[derive(Debug, Clone, Default)]
pub struct KeyboardChannel {
    handle: ProximityHandle,
}

impl KeyboardChannel {
    pub fn new() -> (Self, ProximityHandle) {
        let handle = ProximityHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl SensorChannel for KeyboardChannel {
    fn clear_input(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn request(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read_distance(&mut self) -> Result<u32, SensorError> {
        Ok(if self.handle.is_near() {
            KEYBOARD_NEAR_CM
        } else {
            KEYBOARD_FAR_CM
        })
    }
}

/// Replays a fixed list of responses. Once exhausted every read times out.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    responses: VecDeque<Result<u32, SensorError>>,
    /// Number of times the input buffer was cleared.
    pub clears: usize,
    /// Number of trigger requests written.
    pub requests: usize,
    pending: bool,
}

impl ScriptedChannel {
    pub fn new(responses: impl IntoIterator<Item = Result<u32, SensorError>>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            ..Self::default()
        }
    }

    /// A channel that answers every request with the given readings, in order.
    pub fn from_readings(readings: &[u32]) -> Self {
        Self::new(readings.iter().map(|&d| Ok(d)))
    }

    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl SensorChannel for ScriptedChannel {
    fn clear_input(&mut self) -> Result<(), SensorError> {
        self.clears += 1;
        self.pending = false;
        Ok(())
    }

    fn request(&mut self) -> Result<(), SensorError> {
        self.requests += 1;
        self.pending = true;
        Ok(())
    }

    fn read_distance(&mut self) -> Result<u32, SensorError> {
        if !self.pending {
            return Err(SensorError::Timeout);
        }
        self.pending = false;
        self.responses.pop_front().unwrap_or(Err(SensorError::Timeout))
    }
}
