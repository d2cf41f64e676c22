//! Window and presentation configuration.

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Initial window width (pixels)
    pub window_width: u32,

    /// Initial window height (pixels)
    pub window_height: u32,

    /// Window title while no error is shown
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            title: "CYBERPULSE".to_string(),
        }
    }
}
