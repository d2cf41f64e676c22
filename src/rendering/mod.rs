//! Rasterization and presentation.
//!
//! `surface` turns draw lists into pixels on the CPU; `gpu` shows those
//! pixels in the window.

pub mod gpu;
pub mod surface;

use thiserror::Error;

pub use gpu::Presenter;
pub use surface::SkiaSurface;

/// Canvas or presenter setup failure
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot create a {width}x{height} canvas")]
    EmptySurface { width: u32, height: u32 },

    #[error("Failed to create surface: {0}")]
    CreateSurface(String),

    #[error("Failed to find suitable GPU adapter")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    Device(String),

    #[error("surface reports no supported formats")]
    UnsupportedSurface,
}
