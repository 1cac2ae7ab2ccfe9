//! Deterministic test signal produced by the simulation

use std::f64::consts::TAU;

/// Sine tone per channel; channel `n` plays at `frequency * (1 + n/2)` so
/// that channel remapping is audible.
#[derive(Debug, Clone)]
pub struct ToneSource {
    volume: f32,
    /// Phase increment per frame, one per channel
    steps: Vec<f64>,
    /// Current phase in cycles [0, 1), one per channel
    phases: Vec<f64>,
}

impl ToneSource {
    /// Create a tone source for `channels` interleaved channels.
    pub fn new(frequency: f32, sample_rate: u32, channels: u16, volume: f32) -> Self {
        let sample_rate = f64::from(sample_rate.max(1));
        let steps = (0..channels)
            .map(|ch| f64::from(frequency) * (1.0 + f64::from(ch) * 0.5) / sample_rate)
            .collect();
        Self {
            volume: volume.clamp(0.0, 1.0),
            steps,
            phases: vec![0.0; usize::from(channels)],
        }
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> usize {
        self.phases.len()
    }

    /// Append `frames` interleaved frames to `out`.
    pub fn fill(&mut self, frames: usize, out: &mut Vec<f32>) {
        out.reserve(frames * self.channels());
        for _ in 0..frames {
            for (phase, step) in self.phases.iter_mut().zip(&self.steps) {
                out.push(((*phase * TAU).sin() as f32) * self.volume);
                *phase = (*phase + step).fract();
            }
        }
    }
}
