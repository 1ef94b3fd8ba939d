//! Monitor sink contracts and in-memory buffering implementations
//!
//! Monitors are observers the loop invokes synchronously: a spike sink per
//! emitted spike, a state sink per sampling tick. Sinks must not block.
//! The caller keeps a shared handle and reads the buffers after `run`.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, RuntimeError};
use spikeflow_core::NeuronId;

/// Receiver of emitted spikes, invoked in event-processing order
pub trait SpikeSink: Send {
    /// Called once per threshold crossing
    fn on_spike(&mut self, time: f64, neuron: NeuronId);

    /// Clear any buffered data
    fn reset(&mut self);
}

/// Receiver of periodic state samples
pub trait StateSink: Send {
    /// Called once per sampling tick, after every population has been
    /// decayed to `time` and before any spike at that time is processed.
    /// The borrow ends with the call; implementations copy what they keep.
    fn on_read(&mut self, time: f64, states: &[f64]);

    /// Sampling interval; must stay constant between `reset` calls
    fn reading_interval(&self) -> f64;

    /// Clear any buffered data
    fn reset(&mut self);
}

/// Shared handle to a spike sink
pub type SharedSpikeSink = Arc<Mutex<dyn SpikeSink>>;

/// Shared handle to a state sink
pub type SharedStateSink = Arc<Mutex<dyn StateSink>>;

/// In-memory spike recorder
#[derive(Debug, Default)]
pub struct SpikeMonitor {
    spikes: Vec<(f64, NeuronId)>,
}

impl SpikeMonitor {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty recorder behind a shared handle
    pub fn shared() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Recorded `(time, neuron)` pairs in event-processing order
    pub fn spikes(&self) -> &[(f64, NeuronId)] {
        &self.spikes
    }

    /// Number of recorded spikes
    pub fn len(&self) -> usize {
        self.spikes.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty()
    }
}

impl SpikeSink for SpikeMonitor {
    fn on_spike(&mut self, time: f64, neuron: NeuronId) {
        self.spikes.push((time, neuron));
    }

    fn reset(&mut self) {
        self.spikes.clear();
    }
}

/// In-memory periodic state recorder
#[derive(Debug)]
pub struct StateMonitor {
    interval: f64,
    readings: Vec<(f64, Vec<f64>)>,
}

impl StateMonitor {
    /// Create a recorder sampling every `interval` units of simulated time
    pub fn new(interval: f64) -> Result<Self> {
        if !(interval > 0.0 && interval.is_finite()) {
            return Err(RuntimeError::invalid_parameter(
                "interval",
                interval.to_string(),
                "> 0.0 and finite",
            ));
        }
        Ok(Self {
            interval,
            readings: Vec::new(),
        })
    }

    /// Create a recorder behind a shared handle
    pub fn shared(interval: f64) -> Result<Arc<Mutex<Self>>> {
        Ok(Arc::new(Mutex::new(Self::new(interval)?)))
    }

    /// Recorded `(time, state snapshot)` pairs in sampling order
    pub fn readings(&self) -> &[(f64, Vec<f64>)] {
        &self.readings
    }
}

impl StateSink for StateMonitor {
    fn on_read(&mut self, time: f64, states: &[f64]) {
        self.readings.push((time, states.to_vec()));
    }

    fn reading_interval(&self) -> f64 {
        self.interval
    }

    fn reset(&mut self) {
        self.readings.clear();
    }
}
