//! Input capture: the device seam and the sample ring it fills.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use super::error::CaptureError;

/// Bounded mono sample ring shared between the audio callback and the
/// capture tick. Cloning shares the same ring.
#[derive(Clone)]
pub struct SampleSink {
    inner: Arc<Mutex<SinkState>>,
}

struct SinkState {
    samples: VecDeque<f32>,
    capacity: usize,
    fault: Option<String>,
}

impl SinkState {
    /// Never grows the ring past the capacity it was built with
    fn push_sample(&mut self, sample: f32) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }
}

impl SampleSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkState {
                samples: VecDeque::with_capacity(capacity.max(1)),
                capacity: capacity.max(1),
                fault: None,
            })),
        }
    }

    /// Append mono samples, dropping the oldest beyond capacity
    pub fn push(&self, samples: &[f32]) {
        let mut state = self.inner.lock();
        for &sample in &samples[samples.len().saturating_sub(state.capacity)..] {
            state.push_sample(sample);
        }
    }

    /// Append interleaved frames, averaging channels down to mono.
    ///
    /// Writes straight into the ring; called from the audio callback, so it
    /// must not allocate.
    pub fn push_interleaved<I>(&self, samples: I, channels: usize)
    where
        I: IntoIterator<Item = f32>,
    {
        let channels = channels.max(1);
        let mut state = self.inner.lock();
        let mut acc = 0.0;
        let mut count = 0;
        for sample in samples {
            acc += sample;
            count += 1;
            if count == channels {
                state.push_sample(acc / channels as f32);
                acc = 0.0;
                count = 0;
            }
        }
    }

    /// Copy the buffered samples, oldest first, into `out`
    pub fn snapshot_into(&self, out: &mut Vec<f32>) {
        let state = self.inner.lock();
        out.clear();
        out.extend(state.samples.iter().copied());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop buffered samples and any recorded fault
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.samples.clear();
        state.fault = None;
    }

    /// Record a stream error reported by the device callback
    pub fn report_fault(&self, message: impl Into<String>) {
        let mut state = self.inner.lock();
        if state.fault.is_none() {
            state.fault = Some(message.into());
        }
    }

    pub fn take_fault(&self) -> Option<String> {
        self.inner.lock().fault.take()
    }
}

/// A running input stream. Dropping it releases the device.
pub trait CaptureStream {
    fn sample_rate(&self) -> u32;
}

/// Opens input devices. Called on a background thread; the returned stream
/// stays on that thread until the session is stopped.
pub trait CaptureBackend: Send + Sync + 'static {
    fn open(&self, sink: SampleSink) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// Default system input device through cpal
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

struct CpalStream {
    _stream: cpal::Stream,
    sample_rate: u32,
}

impl CaptureStream for CpalStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl CaptureBackend for CpalBackend {
    fn open(&self, sink: SampleSink) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no input device found".to_string()))?;

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::from_backend_message(e.to_string()))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels,
            ?format,
            "opening microphone"
        );

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, channels, sink),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, channels, sink),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, channels, sink),
            other => {
                return Err(CaptureError::DeviceUnavailable(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }?;

        stream
            .play()
            .map_err(|e| CaptureError::from_backend_message(e.to_string()))?;

        Ok(Box::new(CpalStream {
            _stream: stream,
            sample_rate,
        }))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sink: SampleSink,
) -> Result<cpal::Stream, CaptureError>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let data_sink = sink.clone();
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                data_sink.push_interleaved(
                    data.iter().map(|&s| -> f32 { cpal::Sample::from_sample(s) }),
                    channels,
                );
            },
            move |err| {
                tracing::warn!("microphone stream error: {}", err);
                sink.report_fault(err.to_string());
            },
            None,
        )
        .map_err(|e| CaptureError::from_backend_message(e.to_string()))
}
