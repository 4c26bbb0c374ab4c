//! Outlier-filtered distance sampling.

use super::channel::{SensorChannel, SensorError};
use crate::core::constants::{DEFAULT_NUM_SAMPLES, DEFAULT_OUTLIER_THRESHOLD_CM, NO_READING};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Raw reads taken per stable reading.
    pub num_samples: usize,
    /// Readings at least this far (cm) from the raw mean are discarded.
    pub outlier_threshold: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_samples: DEFAULT_NUM_SAMPLES,
            outlier_threshold: DEFAULT_OUTLIER_THRESHOLD_CM,
        }
    }
}

/// Average `samples`, ignoring any sample whose distance from the raw mean is
/// not strictly below `threshold`.
///
/// If every sample is an outlier the raw mean is returned instead. An empty
/// slice yields [`NO_READING`].
pub fn filter_samples(samples: &[u32], threshold: f64) -> f64 {
    if samples.is_empty() {
        return NO_READING;
    }

    let mean = samples.iter().map(|&d| d as f64).sum::<f64>() / samples.len() as f64;

    let (sum, count) = samples
        .iter()
        .map(|&d| d as f64)
        .filter(|d| (d - mean).abs() < threshold)
        .fold((0.0, 0usize), |(sum, count), d| (sum + d, count + 1));

    if count == 0 {
        mean
    } else {
        sum / count as f64
    }
}

/// Take `num_samples` readings from `channel` and return their filtered mean.
///
/// Failed reads are skipped without retrying, and so is a reading of 0, which
/// would otherwise be indistinguishable from [`NO_READING`]. The input buffer is cleared before
/// every request so a reply left over from an earlier request can't be read as
/// this one. Returns [`NO_READING`] when nothing valid came back, including when
/// the device has disconnected.
pub fn sample_stable_distance<C: SensorChannel + ?Sized>(
    channel: &mut C,
    num_samples: usize,
    outlier_threshold: f64,
) -> f64 {
    let mut samples = Vec::with_capacity(num_samples);

    for _ in 0..num_samples {
        match read_once(channel) {
            Ok(distance) => samples.push(distance),
            Err(SensorError::Disconnected) => {
                tracing::warn!("sensor disconnected while sampling");
                break;
            }
            Err(e) => tracing::trace!(error = %e, "dropped sensor sample"),
        }
    }

    filter_samples(&samples, outlier_threshold)
}

fn read_once<C: SensorChannel + ?Sized>(channel: &mut C) -> Result<u32, SensorError> {
    channel.clear_input()?;
    channel.request()?;
    match channel.read_distance()? {
        0 => Err(SensorError::NoEcho),
        distance => Ok(distance),
    }
}

/// Anything the game loop can ask for "the distance right now".
pub trait DistanceSource {
    fn stable_distance(&mut self) -> f64;
}

/// Samples a channel synchronously, once per call.
pub struct Sampler<C> {
    channel: C,
    config: SamplerConfig,
}

impl<C: SensorChannel> Sampler<C> {
    pub fn new(channel: C, config: SamplerConfig) -> Self {
        Self { channel, config }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<C: SensorChannel> DistanceSource for Sampler<C> {
    fn stable_distance(&mut self) -> f64 {
        sample_stable_distance(
            &mut self.channel,
            self.config.num_samples,
            self.config.outlier_threshold,
        )
    }
}

/// A source that always reports the same distance.
#[derive(Debug, Clone, Copy)]
pub struct FixedDistance(pub f64);

impl DistanceSource for FixedDistance {
    fn stable_distance(&mut self) -> f64 {
        self.0
    }
}
