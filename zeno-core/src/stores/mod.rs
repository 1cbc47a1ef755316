//! Application stores built on the registry.

pub mod video;

pub use video::{define_video_store, Video, VideoFile, VideoStore, VideoUpdate, VIDEO_STORE};
