//! Audio output using cpal
//!
//! The playback sink: opens an output device, negotiates a stream
//! configuration for the announced channel count and sample rate, and
//! plays samples pushed by the pull loop. A lock-free SPSC ring buffer
//! carries normalized f32 samples from the caller's thread to the
//! real-time audio callback; the callback emits silence on underrun.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use tracing::{debug, error, info, warn};

use crate::audio::format::SampleLayout;
use crate::error::{Error, Result};

/// Ring capacity in frames (~93ms of stereo at 44.1kHz).
const RING_CAPACITY_FRAMES: usize = 4096;

/// Poll interval while the ring is full or draining.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Grace period after the ring empties, covering samples still queued in
/// the device-side buffer.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Playback sink backed by a cpal output stream.
pub struct AudioOutput {
    stream: Stream,
    producer: HeapProd<f32>,
    layout: SampleLayout,
    /// Set by the audio callback's error handler
    error_flag: Arc<AtomicBool>,
}

impl AudioOutput {
    /// Open an output device and start a stream for the negotiated format.
    ///
    /// # Arguments
    /// - `device_name`: optional device name (None = default device)
    /// - `layout`: resolved on-wire sample layout of the incoming blocks
    /// - `channels`: announced channel count (post-downmix if applicable)
    /// - `sample_rate`: samples per second per channel
    ///
    /// # Errors
    /// [`Error::AudioOutput`] when no device is available, the device does
    /// not support the requested channel count and rate, or the stream
    /// cannot be built.
    pub fn open(
        device_name: Option<&str>,
        layout: SampleLayout,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => {
                let mut devices = host.output_devices().map_err(|e| {
                    Error::AudioOutput(format!("failed to enumerate devices: {e}"))
                })?;

                match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                    Some(dev) => {
                        info!("using requested audio device: {}", name);
                        dev
                    }
                    None => {
                        warn!("device '{}' not found, falling back to default", name);
                        host.default_output_device().ok_or_else(|| {
                            Error::AudioOutput(format!(
                                "device '{name}' not found and no default device available"
                            ))
                        })?
                    }
                }
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("no default output device".into()))?,
        };

        let (config, sample_format) = pick_config(&device, channels, sample_rate)?;
        debug!(
            "audio config: rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        let ring = HeapRb::<f32>::new(RING_CAPACITY_FRAMES * usize::from(channels));
        let (producer, consumer) = ring.split();
        let error_flag = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream_f32(&device, &config, consumer, Arc::clone(&error_flag))?,
            SampleFormat::I16 => build_stream_i16(&device, &config, consumer, Arc::clone(&error_flag))?,
            other => {
                return Err(Error::AudioOutput(format!(
                    "unsupported device sample format: {other:?}"
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("failed to start stream: {e}")))?;

        info!(
            "audio stream started on '{}'",
            device.name().unwrap_or_else(|_| "unknown".into())
        );

        Ok(Self {
            stream,
            producer,
            layout,
            error_flag,
        })
    }

    /// Push a batch of raw interleaved sample bytes to the device.
    ///
    /// `bytes` must be a whole number of samples in the negotiated layout.
    /// Blocks (sleeping) while the ring buffer is full; fails fast if the
    /// audio stream has reported an error.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let width = self.layout.bytes_per_sample();
        debug_assert_eq!(bytes.len() % width, 0);

        for chunk in bytes.chunks_exact(width) {
            let sample = self.layout.decode(chunk);

            while self.producer.try_push(sample).is_err() {
                self.check_stream()?;
                std::thread::sleep(POLL_INTERVAL);
            }
        }

        self.check_stream()
    }

    /// Block until all queued samples have been handed to the device,
    /// plus a grace period for the device-side buffer.
    pub fn drain(&self) -> Result<()> {
        while self.producer.occupied_len() > 0 {
            self.check_stream()?;
            std::thread::sleep(POLL_INTERVAL);
        }

        std::thread::sleep(DRAIN_GRACE);
        self.check_stream()
    }

    fn check_stream(&self) -> Result<()> {
        if self.error_flag.load(Ordering::SeqCst) {
            return Err(Error::AudioOutput("audio stream reported an error".into()));
        }
        Ok(())
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        // Stop playback; anything still in the ring is discarded.
        let _ = self.stream.pause();
    }
}

/// Find a supported configuration with the exact channel count and a rate
/// range covering `sample_rate`. F32 output is preferred, I16 accepted.
fn pick_config(
    device: &Device,
    channels: u16,
    sample_rate: u32,
) -> Result<(StreamConfig, SampleFormat)> {
    for wanted in [SampleFormat::F32, SampleFormat::I16] {
        let mut configs = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("failed to get device configs: {e}")))?;

        if let Some(supported) = configs.find(|c| {
            c.channels() == channels
                && c.min_sample_rate().0 <= sample_rate
                && c.max_sample_rate().0 >= sample_rate
                && c.sample_format() == wanted
        }) {
            let config = supported
                .with_sample_rate(cpal::SampleRate(sample_rate))
                .config();
            return Ok((config, wanted));
        }
    }

    Err(Error::AudioOutput(format!(
        "output device does not support {channels} channel(s) at {sample_rate} Hz"
    )))
}

fn build_stream_f32(
    device: &Device,
    config: &StreamConfig,
    mut consumer: HeapCons<f32>,
    error_flag: Arc<AtomicBool>,
) -> Result<Stream> {
    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for sample in data.iter_mut() {
                    // Underrun produces silence, never a crash
                    *sample = consumer.try_pop().unwrap_or(0.0);
                }
            },
            move |err| {
                error!("audio stream error: {err}");
                error_flag.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("failed to build stream: {e}")))
}

fn build_stream_i16(
    device: &Device,
    config: &StreamConfig,
    mut consumer: HeapCons<f32>,
    error_flag: Arc<AtomicBool>,
) -> Result<Stream> {
    device
        .build_output_stream(
            config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                for sample in data.iter_mut() {
                    let value = consumer.try_pop().unwrap_or(0.0);
                    *sample = (value.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
                }
            },
            move |err| {
                error!("audio stream error: {err}");
                error_flag.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("failed to build stream: {e}")))
}
