//! Audio output using cpal, gated by the lockstep processor
//!
//! The simulation pushes interleaved source samples into a ring buffer. The
//! cpal data callback pops one device buffer's worth, runs the
//! [`BlockProcessor`] (remap to the device's channel count, account, maybe
//! hold) and converts to the device's sample format.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use ringbuf::HeapCons;
use ringbuf::traits::Consumer;
use tracing::{debug, error, info, warn};

use lockstep_core::{
    AudioBlock, AudioConfig, BlockProcessor, ConfigError, SyncConfig, SyncContext,
};

/// Errors that can occur while opening or starting the output stream
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// No audio devices available
    #[error("no audio output device available")]
    NoDevice,

    /// Failed to get the default device configuration
    #[error("failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    /// Failed to enumerate supported configurations
    #[error("failed to query supported output configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    /// Failed to build audio stream
    #[error("failed to build audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    /// Failed to start/play stream
    #[error("failed to play audio stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    /// Unsupported sample format
    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    /// Clock settings rejected by the processor
    #[error(transparent)]
    Sync(#[from] ConfigError),
}

/// The default output device with its chosen stream configuration.
///
/// Opened before anything else so the rest of the pipeline can be sized for
/// the device's real sample rate.
pub struct OutputDevice {
    device: cpal::Device,
    supported: cpal::SupportedStreamConfig,
}

impl OutputDevice {
    /// Open the default output device, preferring `sync.sample_rate`.
    ///
    /// Falls back to the device's default rate when the preferred one is not
    /// supported; the per-tick target then follows the device rate.
    pub fn open(sync: &SyncConfig) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;
        let supported = choose_config(&device, sync.sample_rate)?;

        info!(
            "Audio output: {} Hz, {} channels, {:?}",
            supported.sample_rate().0,
            supported.channels(),
            supported.sample_format()
        );

        Ok(Self { device, supported })
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.supported.sample_rate().0
    }

    /// Device channel count
    pub fn channels(&self) -> u16 {
        self.supported.channels()
    }

    /// Build and start the stream.
    ///
    /// `sync` is re-based on the device's sample rate before the processor is
    /// built.
    pub fn start(
        self,
        context: Arc<SyncContext>,
        sync: &SyncConfig,
        audio: &AudioConfig,
        consumer: HeapCons<f32>,
    ) -> Result<SyncedOutput, OutputError> {
        let sample_rate = self.sample_rate();
        let channels = self.channels();

        let processor = BlockProcessor::new(context, &sync.with_sample_rate(sample_rate))?;
        let renderer = StreamRenderer::new(
            processor,
            consumer,
            usize::from(audio.source_channels),
            usize::from(channels),
        );

        let mut config = self.supported.config();
        if let Some(frames) = audio.buffer_frames {
            config.buffer_size = cpal::BufferSize::Fixed(frames);
        }

        let stream = match self.supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&self.device, &config, renderer)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&self.device, &config, renderer)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&self.device, &config, renderer)?,
            other => return Err(OutputError::UnsupportedFormat(other)),
        };

        stream.play()?;

        debug!("Audio stream started");

        Ok(SyncedOutput {
            _stream: stream,
            channels,
        })
    }
}

/// A running output stream driven by the lockstep processor
pub struct SyncedOutput {
    /// The cpal stream (kept alive for the duration)
    _stream: cpal::Stream,
    /// Device channel count
    channels: u16,
}

impl SyncedOutput {
    /// Get the device channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn choose_config(
    device: &cpal::Device,
    wanted_rate: u32,
) -> Result<cpal::SupportedStreamConfig, OutputError> {
    let default = device.default_output_config()?;
    if default.sample_rate().0 == wanted_rate {
        return Ok(default);
    }

    let matching = device
        .supported_output_configs()?
        .filter(|range| range.sample_format() == default.sample_format())
        .find(|range| {
            range.min_sample_rate().0 <= wanted_rate && wanted_rate <= range.max_sample_rate().0
        });

    match matching {
        Some(range) => Ok(range.with_sample_rate(cpal::SampleRate(wanted_rate))),
        None => {
            warn!(
                "Output device does not support {} Hz; using {} Hz",
                wanted_rate,
                default.sample_rate().0
            );
            Ok(default)
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: StreamRenderer,
) -> Result<cpal::Stream, OutputError>
where
    T: SizedSample + FromSample<f32>,
{
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| renderer.render(data),
        |err| error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

/// State moved into the cpal data callback
struct StreamRenderer {
    processor: BlockProcessor,
    consumer: HeapCons<f32>,
    source_channels: usize,
    device_channels: usize,
    /// Source samples for one callback (reused)
    input: Vec<f32>,
    /// Remapped samples at device channel count (reused)
    output: Vec<f32>,
}

impl StreamRenderer {
    fn new(
        processor: BlockProcessor,
        consumer: HeapCons<f32>,
        source_channels: usize,
        device_channels: usize,
    ) -> Self {
        Self {
            processor,
            consumer,
            source_channels,
            device_channels,
            input: vec![0.0; 4096],
            output: vec![0.0; 4096],
        }
    }

    fn render<T>(&mut self, data: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        if self.device_channels == 0 {
            return;
        }
        let frames = data.len() / self.device_channels;
        let in_len = frames * self.source_channels;
        let out_len = frames * self.device_channels;

        // Resize scratch buffers if needed (rare, only when the device changes block size)
        if self.input.len() < in_len {
            self.input.resize(in_len, 0.0);
        }
        if self.output.len() < out_len {
            self.output.resize(out_len, 0.0);
        }

        // Batch read; an underrun is filled with silence
        let popped = self.consumer.pop_slice(&mut self.input[..in_len]);
        self.input[popped..in_len].fill(0.0);

        self.processor.process(AudioBlock {
            input: &self.input[..in_len],
            output: &mut self.output[..out_len],
            frames,
            in_channels: self.source_channels,
            out_channels: self.device_channels,
        });

        for (dst, &src) in data.iter_mut().zip(&self.output[..out_len]) {
            *dst = T::from_sample(src.clamp(-1.0, 1.0));
        }
        // Partial trailing frame, if the backend ever hands one over
        for dst in &mut data[out_len..] {
            *dst = T::EQUILIBRIUM;
        }
    }
}
