//! User-facing control parameters: punch, vibe and mood.

/// Color palette selection derived from the signed mood slider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Cool,
    FullSpectrum,
    Warm,
}

impl Mood {
    /// Raw slider value at or below which the mood is cool
    pub const COOL_THRESHOLD: i8 = -17;

    /// Raw slider value at or above which the mood is warm
    pub const WARM_THRESHOLD: i8 = 17;

    /// Classify a raw mood slider value
    pub fn from_raw(mood_raw: i8) -> Self {
        if mood_raw <= Self::COOL_THRESHOLD {
            Mood::Cool
        } else if mood_raw >= Self::WARM_THRESHOLD {
            Mood::Warm
        } else {
            Mood::FullSpectrum
        }
    }
}

/// Snapshot of the three user controls, read once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlParams {
    /// Frequency emphasis, 0..=100
    pub punch: u8,

    /// Particle density and bar chaos, 0..=100
    pub vibe: u8,

    /// Raw mood slider, -50..=50
    pub mood_raw: i8,
}

impl ControlParams {
    pub const MAX_PUNCH: u8 = 100;
    pub const MAX_VIBE: u8 = 100;
    pub const MOOD_RANGE: i8 = 50;

    /// Build a snapshot, clamping every value into its range
    pub fn new(punch: i32, vibe: i32, mood_raw: i32) -> Self {
        Self {
            punch: punch.clamp(0, Self::MAX_PUNCH as i32) as u8,
            vibe: vibe.clamp(0, Self::MAX_VIBE as i32) as u8,
            mood_raw: mood_raw.clamp(-(Self::MOOD_RANGE as i32), Self::MOOD_RANGE as i32) as i8,
        }
    }

    /// Derived palette; recomputed from `mood_raw` on every call
    pub fn mood(&self) -> Mood {
        Mood::from_raw(self.mood_raw)
    }

    pub fn adjust_punch(self, delta: i32) -> Self {
        Self::new(self.punch as i32 + delta, self.vibe as i32, self.mood_raw as i32)
    }

    pub fn adjust_vibe(self, delta: i32) -> Self {
        Self::new(self.punch as i32, self.vibe as i32 + delta, self.mood_raw as i32)
    }

    pub fn adjust_mood(self, delta: i32) -> Self {
        Self::new(self.punch as i32, self.vibe as i32, self.mood_raw as i32 + delta)
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            punch: 50,
            vibe: 50,
            mood_raw: 0,
        }
    }
}
