//! Spectrum sources and the microphone capture state machine.
//!
//! The microphone is opened on a background thread so the render loop never
//! waits on the device. The thread reports back over a channel, tagged with
//! the request id it was started for. A resolution for a request that is no
//! longer current is dropped, so a slow open can never revive a source that
//! was deactivated in the meantime.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::analyzer::SpectrumAnalyzer;
use super::capture::{CaptureBackend, SampleSink};
use super::error::CaptureError;
use super::frame::SpectrumFrame;
use super::gain::GainController;
use crate::params::{AnalyzerConfig, ConfigError, GainConfig};

/// Samples kept per capture session, as a multiple of the FFT size
const RING_FFT_MULTIPLE: usize = 16;

/// Anything that publishes spectrum frames once per tick
pub trait SpectrumSource {
    /// Begin producing frames (may resolve asynchronously)
    fn start(&mut self);

    /// Stop producing frames; a no-op when already inactive
    fn stop(&mut self);

    /// True while frames reflect live input
    fn is_active(&self) -> bool;

    /// Latest published frame
    fn current_frame(&self) -> &SpectrumFrame;

    /// Advance by `dt` of wall-clock time
    fn tick(&mut self, dt: Duration);
}

/// Microphone lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Idle,
    Requesting,
    Listening,
    Stopped,
    Errored,
}

/// What the UI should assume about device access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Prompt,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Prompt => "prompt",
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
        }
    }
}

/// Outcome of one open attempt, sent by the capture thread
struct Resolution {
    request_id: u64,
    outcome: Result<u32, CaptureError>,
}

/// One activation. Dropping it drops `_stop`, which tells the capture thread
/// to release the device.
struct Session {
    request_id: u64,
    sink: SampleSink,
    _stop: Sender<()>,
}

/// Microphone-backed spectrum source with automatic gain control
pub struct MicrophoneSource {
    backend: Arc<dyn CaptureBackend>,
    analyzer: SpectrumAnalyzer,
    gain: GainController,
    frame: SpectrumFrame,
    state: SourceState,
    permission: PermissionStatus,
    error: Option<CaptureError>,
    session: Option<Session>,
    next_request_id: u64,
    sample_rate: Option<u32>,
    resolution_tx: Sender<Resolution>,
    resolution_rx: Receiver<Resolution>,
    scratch: Vec<f32>,
}

impl MicrophoneSource {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        analyzer_config: AnalyzerConfig,
        gain_config: GainConfig,
    ) -> Result<Self, ConfigError> {
        gain_config.validate()?;
        let analyzer = SpectrumAnalyzer::new(analyzer_config)?;
        let frame = SpectrumFrame::zeroed(analyzer.config().bin_count());
        let (resolution_tx, resolution_rx) = unbounded();

        Ok(Self {
            backend,
            analyzer,
            gain: GainController::new(gain_config),
            frame,
            state: SourceState::Idle,
            permission: PermissionStatus::Prompt,
            error: None,
            session: None,
            next_request_id: 0,
            sample_rate: None,
            resolution_tx,
            resolution_rx,
            scratch: Vec::new(),
        })
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn permission_status(&self) -> PermissionStatus {
        self.permission
    }

    pub fn error(&self) -> Option<&CaptureError> {
        self.error.as_ref()
    }

    /// Human-readable error for display outside the canvas
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    pub fn is_listening(&self) -> bool {
        self.state == SourceState::Listening
    }

    pub fn current_gain(&self) -> f32 {
        self.gain.current_gain()
    }

    /// Device sample rate of the running session
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Label for the microphone toggle, given whether the microphone is the
    /// selected source
    pub fn button_label(&self, selected: bool) -> &'static str {
        if !selected {
            return "Use Microphone";
        }
        if self.is_listening() {
            "Stop Microphone"
        } else if self.error.is_some() {
            "Mic Error"
        } else if self.permission == PermissionStatus::Denied {
            "Mic Denied"
        } else {
            "Connecting Mic..."
        }
    }

    /// Request the microphone.
    ///
    /// After a denial this fails immediately with the stored error and does
    /// not touch the device again.
    pub fn activate(&mut self) {
        match self.state {
            SourceState::Requesting | SourceState::Listening => return,
            _ => {}
        }

        if self.permission == PermissionStatus::Denied {
            if self.error.is_none() {
                self.error = Some(CaptureError::PermissionDenied);
            }
            self.state = SourceState::Errored;
            tracing::debug!("microphone previously denied; not prompting again");
            return;
        }

        self.gain.reset();
        self.analyzer.reset();
        self.frame.clear();
        self.error = None;

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let sink = SampleSink::new(self.analyzer.config().fft_size * RING_FFT_MULTIPLE);
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let backend = Arc::clone(&self.backend);
        let thread_sink = sink.clone();
        let tx = self.resolution_tx.clone();

        let spawned = thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || match backend.open(thread_sink) {
                Ok(stream) => {
                    let resolution = Resolution {
                        request_id,
                        outcome: Ok(stream.sample_rate()),
                    };
                    if tx.send(resolution).is_ok() {
                        // Returns once the session's stop sender is dropped
                        let _ = stop_rx.recv();
                    }
                    drop(stream);
                    tracing::debug!(request_id, "microphone stream released");
                }
                Err(err) => {
                    let _ = tx.send(Resolution {
                        request_id,
                        outcome: Err(err),
                    });
                }
            });

        match spawned {
            Ok(_) => {
                tracing::info!(request_id, "requesting microphone");
                self.session = Some(Session {
                    request_id,
                    sink,
                    _stop: stop_tx,
                });
                self.state = SourceState::Requesting;
            }
            Err(err) => {
                self.fail(CaptureError::DeviceUnavailable(err.to_string()));
            }
        }
    }

    /// Forget a previous denial so the next `activate` asks the device again.
    /// No-op unless access is currently denied.
    pub fn retry_permission(&mut self) {
        if self.permission != PermissionStatus::Denied {
            return;
        }
        if self.state == SourceState::Errored {
            self.state = SourceState::Idle;
        }
        self.permission = PermissionStatus::Prompt;
        self.error = None;
    }

    /// Stop capturing and release the device. No-op unless requesting or
    /// listening.
    pub fn deactivate(&mut self) {
        match self.state {
            SourceState::Requesting | SourceState::Listening => {}
            _ => return,
        }

        self.session = None;
        self.sample_rate = None;
        self.frame.clear();
        self.state = SourceState::Stopped;
        tracing::info!("microphone stopped");
    }

    /// Apply any open results that have arrived, without blocking
    pub fn poll(&mut self) {
        while let Ok(resolution) = self.resolution_rx.try_recv() {
            self.resolve(resolution);
        }
    }

    /// Block until the pending request resolves or `timeout` passes.
    ///
    /// Returns false on timeout or when nothing is pending.
    pub fn wait_for_resolution(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.state == SourceState::Requesting {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.resolution_rx.recv_timeout(remaining) {
                Ok(resolution) => self.resolve(resolution),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false
                }
            }
        }
        true
    }

    fn resolve(&mut self, resolution: Resolution) {
        let current = self.session.as_ref().map(|s| s.request_id);
        if self.state != SourceState::Requesting || current != Some(resolution.request_id) {
            tracing::debug!(
                request_id = resolution.request_id,
                "discarding stale microphone resolution"
            );
            return;
        }

        match resolution.outcome {
            Ok(sample_rate) => {
                tracing::info!(sample_rate, "microphone listening");
                self.sample_rate = Some(sample_rate);
                self.permission = PermissionStatus::Granted;
                self.state = SourceState::Listening;
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: CaptureError) {
        tracing::warn!("{}", err);
        self.session = None;
        self.sample_rate = None;
        self.frame.clear();
        self.permission = PermissionStatus::Denied;
        self.error = Some(err);
        self.state = SourceState::Errored;
    }
}

impl SpectrumSource for MicrophoneSource {
    fn start(&mut self) {
        self.activate();
    }

    fn stop(&mut self) {
        self.deactivate();
    }

    fn is_active(&self) -> bool {
        self.is_listening()
    }

    fn current_frame(&self) -> &SpectrumFrame {
        &self.frame
    }

    fn tick(&mut self, dt: Duration) {
        self.poll();
        if self.state != SourceState::Listening {
            return;
        }

        let Some(sink) = self.session.as_ref().map(|s| s.sink.clone()) else {
            return;
        };
        if let Some(fault) = sink.take_fault() {
            self.fail(CaptureError::DeviceUnavailable(fault));
            return;
        }
        sink.snapshot_into(&mut self.scratch);

        self.analyzer
            .analyze(&self.scratch, self.gain.current_gain(), &mut self.frame);
        let action = self.gain.update(&self.frame, dt);
        tracing::trace!(gain = self.gain.current_gain(), ?action, "agc step");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::CaptureStream;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(5);
    const TICK: Duration = Duration::from_millis(16);

    struct FakeStream;

    impl CaptureStream for FakeStream {
        fn sample_rate(&self) -> u32 {
            48_000
        }
    }

    /// Resolves every open immediately with a fixed outcome
    struct ScriptedBackend {
        outcome: Result<(), CaptureError>,
        tone: Option<f32>,
        opens: AtomicUsize,
    }

    impl ScriptedBackend {
        fn granting() -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(()),
                tone: None,
                opens: AtomicUsize::new(0),
            })
        }

        fn with_tone(amplitude: f32) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(()),
                tone: Some(amplitude),
                opens: AtomicUsize::new(0),
            })
        }

        fn failing(err: CaptureError) -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(err),
                tone: None,
                opens: AtomicUsize::new(0),
            })
        }
    }

    impl CaptureBackend for ScriptedBackend {
        fn open(&self, sink: SampleSink) -> Result<Box<dyn CaptureStream>, CaptureError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()?;
            if let Some(amplitude) = self.tone {
                let samples: Vec<f32> = (0..1024)
                    .map(|i| amplitude * (i as f32 * 0.2).sin())
                    .collect();
                sink.push(&samples);
            }
            Ok(Box::new(FakeStream))
        }
    }

    /// Holds every open until the test releases it
    struct GatedBackend {
        gate: Mutex<Option<Receiver<()>>>,
    }

    impl CaptureBackend for GatedBackend {
        fn open(&self, _sink: SampleSink) -> Result<Box<dyn CaptureStream>, CaptureError> {
            let gate = self.gate.lock().take();
            if let Some(gate) = gate {
                let _ = gate.recv();
            }
            Ok(Box::new(FakeStream))
        }
    }

    fn source(backend: Arc<dyn CaptureBackend>) -> MicrophoneSource {
        MicrophoneSource::new(backend, AnalyzerConfig::default(), GainConfig::default()).unwrap()
    }

    #[test]
    fn test_starts_idle_with_zero_frame() {
        let mic = source(ScriptedBackend::granting());
        assert_eq!(mic.state(), SourceState::Idle);
        assert_eq!(mic.permission_status(), PermissionStatus::Prompt);
        assert_eq!(mic.current_frame().len(), 128);
        assert!(mic.current_frame().bins().iter().all(|&b| b == 0));
        assert!(!mic.is_active());
    }

    #[test]
    fn test_grant_reaches_listening() {
        let mut mic = source(ScriptedBackend::granting());
        mic.activate();
        assert_eq!(mic.state(), SourceState::Requesting);

        assert!(mic.wait_for_resolution(WAIT));
        assert_eq!(mic.state(), SourceState::Listening);
        assert_eq!(mic.permission_status(), PermissionStatus::Granted);
        assert!(mic.error().is_none());
        assert_eq!(mic.sample_rate(), Some(48_000));
        assert_eq!(mic.button_label(true), "Stop Microphone");
    }

    #[test]
    fn test_denial_sticks_without_reprompt() {
        let backend = ScriptedBackend::failing(CaptureError::PermissionDenied);
        let mut mic = source(backend.clone());

        mic.activate();
        mic.wait_for_resolution(WAIT);
        assert_eq!(mic.state(), SourceState::Errored);
        assert_eq!(mic.permission_status(), PermissionStatus::Denied);
        let first = mic.error_message().unwrap();
        assert!(!first.is_empty());
        assert!(mic.error().unwrap().is_permission_denied());
        assert_eq!(backend.opens.load(Ordering::SeqCst), 1);

        mic.activate();
        assert_eq!(mic.state(), SourceState::Errored);
        assert_eq!(mic.error_message().unwrap(), first);
        assert_eq!(backend.opens.load(Ordering::SeqCst), 1);
        assert_eq!(mic.button_label(true), "Mic Error");
    }

    #[test]
    fn test_device_error_is_treated_as_denied() {
        let err = CaptureError::DeviceUnavailable("busy".into());
        let mut mic = source(ScriptedBackend::failing(err.clone()));
        mic.activate();
        mic.wait_for_resolution(WAIT);

        assert_eq!(mic.error(), Some(&err));
        assert!(!err.is_permission_denied());
        assert_eq!(mic.permission_status(), PermissionStatus::Denied);
    }

    #[test]
    fn test_deactivate_when_inactive_is_noop() {
        let mut mic = source(ScriptedBackend::granting());
        mic.deactivate();
        assert_eq!(mic.state(), SourceState::Idle);

        mic.activate();
        mic.wait_for_resolution(WAIT);
        mic.deactivate();
        assert_eq!(mic.state(), SourceState::Stopped);
        mic.deactivate();
        assert_eq!(mic.state(), SourceState::Stopped);
        assert!(mic.error().is_none());
    }

    #[test]
    fn test_late_grant_after_deactivate_is_ignored() {
        let (release, gate) = bounded(0);
        let backend = Arc::new(GatedBackend {
            gate: Mutex::new(Some(gate)),
        });
        let mut mic = source(backend);

        mic.activate();
        assert_eq!(mic.state(), SourceState::Requesting);
        mic.deactivate();
        assert_eq!(mic.state(), SourceState::Stopped);

        release.send(()).unwrap();
        // Give the capture thread time to report
        let deadline = Instant::now() + WAIT;
        while Instant::now() < deadline && mic.resolution_rx.is_empty() {
            thread::sleep(Duration::from_millis(1));
        }
        mic.tick(TICK);
        assert_eq!(mic.state(), SourceState::Stopped);
        assert!(!mic.is_active());
    }

    #[test]
    fn test_listening_tick_publishes_and_adjusts_gain() {
        let mut mic = source(ScriptedBackend::with_tone(0.5));
        mic.activate();
        mic.wait_for_resolution(WAIT);

        mic.tick(TICK);
        assert!(mic.current_frame().average() > 0.0);
        assert_ne!(mic.current_gain(), 1.5);
    }

    #[test]
    fn test_stop_zeroes_frame_and_restart_resets_gain() {
        let mut mic = source(ScriptedBackend::with_tone(0.5));
        mic.activate();
        mic.wait_for_resolution(WAIT);
        for _ in 0..10 {
            mic.tick(TICK);
        }

        mic.deactivate();
        assert!(mic.current_frame().bins().iter().all(|&b| b == 0));

        mic.activate();
        assert_eq!(mic.current_gain(), 1.5);
        assert!(mic.wait_for_resolution(WAIT));
    }

    #[test]
    fn test_stream_fault_moves_to_errored() {
        let mut mic = source(ScriptedBackend::granting());
        mic.activate();
        mic.wait_for_resolution(WAIT);

        if let Some(session) = &mic.session {
            session.sink.report_fault("device unplugged");
        }
        mic.tick(TICK);

        assert_eq!(mic.state(), SourceState::Errored);
        assert_eq!(
            mic.error_message().as_deref(),
            Some("Could not access microphone: device unplugged")
        );
    }

    #[test]
    fn test_explicit_retry_prompts_again() {
        let backend = ScriptedBackend::failing(CaptureError::PermissionDenied);
        let mut mic = source(backend.clone());
        mic.activate();
        mic.wait_for_resolution(WAIT);

        mic.retry_permission();
        assert_eq!(mic.state(), SourceState::Idle);
        assert_eq!(mic.permission_status(), PermissionStatus::Prompt);

        mic.activate();
        mic.wait_for_resolution(WAIT);
        assert_eq!(backend.opens.load(Ordering::SeqCst), 2);
        assert_eq!(mic.state(), SourceState::Errored);
    }

    #[test]
    fn test_retry_while_listening_keeps_grant() {
        let backend = ScriptedBackend::granting();
        let mut mic = source(backend.clone());
        mic.activate();
        assert!(mic.wait_for_resolution(WAIT));

        mic.retry_permission();
        assert_eq!(mic.state(), SourceState::Listening);
        assert_eq!(mic.permission_status(), PermissionStatus::Granted);
        assert!(mic.is_listening());
        assert!(mic.error().is_none());
        assert_eq!(backend.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_before_any_request_is_noop() {
        let mut mic = source(ScriptedBackend::granting());
        mic.retry_permission();
        assert_eq!(mic.state(), SourceState::Idle);
        assert_eq!(mic.permission_status(), PermissionStatus::Prompt);
    }

    #[test]
    fn test_labels() {
        let mic = source(ScriptedBackend::granting());
        assert_eq!(mic.button_label(false), "Use Microphone");
        assert_eq!(mic.button_label(true), "Connecting Mic...");
    }
}
