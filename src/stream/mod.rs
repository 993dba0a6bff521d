//! Stream adapters over received telemetry frames

mod decode;

pub use decode::{DecodeFrames, DecodeFramesExt};
