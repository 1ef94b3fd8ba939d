//! Event-driven simulation engine for spiking neural networks
//!
//! This crate provides the simulation core: neuron models with lazy
//! closed-form state advancement, SoA neuron populations, monitor sinks,
//! and the network loop that drains a calendar queue of spike deliveries
//! and sampling ticks in simulated-time order.
//!
//! # Example
//!
//! ```
//! use spikeflow_runtime::{
//!     LifParams, Network, NetworkConfig, NeuronId, NeuronModel, SpikeMonitor,
//! };
//!
//! # fn main() -> spikeflow_runtime::Result<()> {
//! let mut network = Network::new(NetworkConfig::default())?;
//! let lif = NeuronModel::Lif(LifParams::new(10.0, 1.0, 0.0, 0.0, 1.0, 2.0)?);
//! network.add_population(2, lif)?;
//! network.add_synapse(spikeflow_runtime::Synapse::new(
//!     NeuronId::new(0),
//!     NeuronId::new(1),
//!     1.5,
//!     1.0,
//! ))?;
//!
//! let monitor = SpikeMonitor::shared();
//! network.set_spike_monitor(monitor.clone());
//! network.schedule_spike(0.0, NeuronId::new(0), 1.5)?;
//! network.run(5.0)?;
//!
//! assert_eq!(monitor.lock().spikes().len(), 2);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export essential types from the scheduler layer
pub use spikeflow_core::{
    CalendarQueue, Event, NeuronId, QueueError, DEFAULT_BUCKETS, DEFAULT_BUCKET_WIDTH,
};

// Core modules
pub mod error;
pub mod monitor;
pub mod network;
pub mod neuron;
pub mod population;

// Re-export essential types
pub use error::{Result, RuntimeError};
pub use monitor::{
    SharedSpikeSink, SharedStateSink, SpikeMonitor, SpikeSink, StateMonitor, StateSink,
};
pub use network::{Network, NetworkBuilder, NetworkConfig, Synapse};
pub use neuron::{LifParams, NeuronModel};
pub use population::NeuronPopulation;
