//! Spectrum frame: one capture tick of per-bin energies.

use crate::params::audio_constants::BIN_COUNT;

/// Per-frequency-bin energies (0-255), index increasing with frequency.
///
/// Only the latest frame is kept; producers overwrite it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumFrame {
    bins: Vec<u8>,
}

impl SpectrumFrame {
    /// All-zero frame with the standard bin count
    pub fn silent() -> Self {
        Self::zeroed(BIN_COUNT)
    }

    pub fn zeroed(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    /// Frame with no bins (capture not warmed up)
    pub fn empty() -> Self {
        Self { bins: Vec::new() }
    }

    pub fn from_bins(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Replace the contents with `bins`, reusing the allocation
    pub fn overwrite(&mut self, bins: &[u8]) {
        self.bins.clear();
        self.bins.extend_from_slice(bins);
    }

    /// Zero every bin, keeping the bin count
    pub fn clear(&mut self) {
        self.bins.fill(0);
    }

    /// Mean energy over all bins (0.0 for an empty frame)
    pub fn average(&self) -> f32 {
        mean(&self.bins)
    }

    /// Mean energy over the lowest `fraction` of bins (at least one bin)
    pub fn band_average(&self, fraction: f32) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let count = ((self.bins.len() as f32 * fraction).floor() as usize).clamp(1, self.bins.len());
        mean(&self.bins[..count])
    }

    /// True when every bin is below `threshold`
    pub fn is_silent(&self, threshold: u8) -> bool {
        self.bins.iter().all(|&bin| bin < threshold)
    }
}

impl Default for SpectrumFrame {
    fn default() -> Self {
        Self::silent()
    }
}

fn mean(values: &[u8]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as u32).sum::<u32>() as f32 / values.len() as f32
}
