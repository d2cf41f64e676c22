//! Colors and per-mood palettes.

use crate::params::Mood;

/// Straight-alpha color: 8-bit channels, alpha in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha (clamped)
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// From hue in degrees, saturation and lightness in percent
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let l = (lightness / 100.0).clamp(0.0, 1.0);

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f32| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };

        Self::rgb(
            channel(h + 1.0 / 3.0),
            channel(h),
            channel(h - 1.0 / 3.0),
        )
    }
}

/// Canvas background `rgb(13, 2, 33)`
pub const BACKGROUND: Rgba = Rgba::rgb(13, 2, 33);

/// Network link color before the vibe-scaled alpha is applied
pub const LINK: Rgba = Rgba::rgb(220, 220, 220);

/// Colors used for one mood
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub primary: Rgba,
    pub secondary: Rgba,
    /// Third bar color; `None` means bars cycle hue instead
    pub tertiary: Option<Rgba>,
    pub particle: Rgba,
}

impl Palette {
    pub fn for_mood(mood: Mood) -> Self {
        match mood {
            Mood::Cool => Self {
                primary: Rgba::rgb(0x4A, 0x90, 0xE2),
                secondary: Rgba::rgb(0x50, 0xE3, 0xC2),
                tertiary: Some(Rgba::rgb(0x63, 0xD1, 0xF4)),
                particle: Rgba::rgba(74, 144, 226, 0.7),
            },
            Mood::Warm => Self {
                primary: Rgba::rgb(0xF5, 0xA6, 0x23),
                secondary: Rgba::rgb(0xFF, 0xD7, 0x00),
                tertiary: Some(Rgba::rgb(0xFF, 0xB3, 0x47)),
                particle: Rgba::rgba(245, 166, 35, 0.7),
            },
            Mood::FullSpectrum => Self {
                primary: Rgba::rgb(0x2D, 0xE2, 0xE6),
                secondary: Rgba::rgb(0xF7, 0x06, 0xCF),
                tertiary: None,
                particle: Rgba::rgba(45, 226, 230, 0.7),
            },
        }
    }

    /// Bar color for bin `index` of `len` at boosted energy `value`.
    ///
    /// Hue-cycling palettes rotate with position and `time_s`; the others
    /// alternate primary, secondary and tertiary by `index % 3`.
    pub fn bar_color(&self, index: usize, len: usize, value: f32, time_s: f64) -> Rgba {
        match self.tertiary {
            Some(tertiary) => match index % 3 {
                0 => self.primary,
                1 => self.secondary,
                _ => tertiary,
            },
            None => {
                let position = index as f64 / len.max(1) as f64 * 360.0;
                let hue = (position + time_s * 10.0).rem_euclid(360.0) as f32;
                Rgba::from_hsl(hue, 100.0, 60.0 + value / 255.0 * 20.0)
            }
        }
    }
}
