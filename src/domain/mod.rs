// Domain layer - channel catalog, waveforms, profiles, samples, buffers
pub mod buffer;
pub mod channel;
pub mod pattern;
pub mod profile;
pub mod sample;
