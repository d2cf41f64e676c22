//! CYBERPULSE library - audio-reactive particle and spectrum visualizer

pub mod audio;
pub mod driver;
pub mod params;
pub mod rendering;
pub mod visual;
