//! Proximity sensor input: raw channels, outlier filtering, and background polling.

pub mod channel;
pub mod poller;
pub mod sampler;

pub use channel::{
    KeyboardChannel, ProximityHandle, ScriptedChannel, SensorChannel, SensorError, SerialChannel,
};
pub use poller::{LatestDistance, SensorPoller};
pub use sampler::{
    filter_samples, sample_stable_distance, DistanceSource, FixedDistance, Sampler, SamplerConfig,
};
