pub mod backend;
pub mod file;

pub use backend::{
    stereo_to_mono, downsample, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame,
    AudioSource,
};
pub use file::{AudioFile, FileBackend};
