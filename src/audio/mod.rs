//! Audio input: capture, spectrum analysis and automatic gain control.
//!
//! Two sources publish `SpectrumFrame`s: the microphone (with AGC) and a
//! synthetic demo oscillator. Both run their analysis on the caller's tick.

pub mod analyzer;
pub mod capture;
pub mod error;
pub mod frame;
pub mod gain;
pub mod source;
pub mod synthesis;

pub use analyzer::SpectrumAnalyzer;
pub use capture::{CaptureBackend, CaptureStream, CpalBackend, SampleSink};
pub use error::{CaptureError, SynthesisError};
pub use frame::SpectrumFrame;
pub use gain::{GainAction, GainController};
pub use source::{MicrophoneSource, PermissionStatus, SourceState, SpectrumSource};
pub use synthesis::DemoSource;
