//! Network topology and the event-driven simulation loop
//!
//! The network owns the SoA state arrays, the populations indexing into
//! them, the synapse adjacency, and the calendar queue. `run` advances a
//! persistent simulation clock by draining events in time order; neuron
//! state is only touched when an event perturbs it (lazy integration) or a
//! sampling tick reads it.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    error::{Result, RuntimeError},
    monitor::{SharedSpikeSink, SharedStateSink},
    neuron::NeuronModel,
    population::NeuronPopulation,
};
use spikeflow_core::{
    CalendarQueue, Event, NeuronId, QueueError, DEFAULT_BUCKETS, DEFAULT_BUCKET_WIDTH,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Populations below this size are decayed serially even when a worker
/// pool is configured; task overhead dominates otherwise.
#[cfg(feature = "parallel")]
const PARALLEL_DECAY_MIN: usize = 1024;

/// Network tuning knobs
///
/// None of these affect simulation results, only performance.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Initial calendar queue bucket count
    pub queue_buckets: usize,
    /// Initial calendar queue stripe width
    pub queue_width: f64,
    /// Worker threads for bulk decay (1 = serial)
    pub num_threads: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            queue_buckets: DEFAULT_BUCKETS,
            queue_width: DEFAULT_BUCKET_WIDTH,
            num_threads: 1,
        }
    }
}

impl NetworkConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.queue_buckets == 0 {
            return Err(RuntimeError::invalid_parameter(
                "queue_buckets",
                self.queue_buckets.to_string(),
                "> 0",
            ));
        }
        if !(self.queue_width > 0.0 && self.queue_width.is_finite()) {
            return Err(RuntimeError::invalid_parameter(
                "queue_width",
                self.queue_width.to_string(),
                "> 0.0 and finite",
            ));
        }
        if self.num_threads == 0 {
            return Err(RuntimeError::invalid_parameter(
                "num_threads",
                self.num_threads.to_string(),
                ">= 1",
            ));
        }
        Ok(())
    }
}

/// A directed connection with transmission weight and delay
///
/// Weights are immutable after creation. The weight carried to the target
/// on fan-out is the synapse's own weight, not the weight of the event
/// that made the source fire: a spike is a unit event whose downstream
/// effect is set by synapse strength.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Synapse {
    /// Source neuron
    pub src: NeuronId,
    /// Target neuron
    pub dst: NeuronId,
    /// Charge delivered to the target
    pub weight: f64,
    /// Transmission delay, >= 0
    pub delay: f64,
}

impl Synapse {
    /// Create a new synapse
    pub fn new(src: NeuronId, dst: NeuronId, weight: f64, delay: f64) -> Self {
        Self {
            src,
            dst,
            weight,
            delay,
        }
    }
}

/// Event-driven spiking neural network
pub struct Network {
    /// Network configuration
    pub config: NetworkConfig,
    /// Membrane potentials, one per neuron across all populations
    states: Vec<f64>,
    /// Time of each neuron's last emitted spike (-inf before any)
    last_spikes: Vec<f64>,
    /// Time each neuron's state was last advanced to
    last_updates: Vec<f64>,
    /// Populations partitioning the state arrays contiguously
    populations: Vec<NeuronPopulation>,
    /// Population index of each neuron, for O(1) model lookup
    pop_of: Vec<u32>,
    /// Outgoing synapses keyed by source index
    adjacency: Vec<SmallVec<[Synapse; 4]>>,
    /// Pending events
    queue: CalendarQueue<Event>,
    /// Attached spike sink
    spike_sink: Option<SharedSpikeSink>,
    /// Attached state sink
    state_sink: Option<SharedStateSink>,
    /// Persistent simulation clock
    sim_time: f64,
    /// Active worker thread count
    num_threads: usize,
    /// Worker pool for bulk decay, present when num_threads > 1
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Network {
    /// Create an empty network with the given configuration
    pub fn new(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        let queue = CalendarQueue::new(config.queue_buckets, config.queue_width)?;
        let threads = config.num_threads;

        let mut network = Self {
            config,
            states: Vec::new(),
            last_spikes: Vec::new(),
            last_updates: Vec::new(),
            populations: Vec::new(),
            pop_of: Vec::new(),
            adjacency: Vec::new(),
            queue,
            spike_sink: None,
            state_sink: None,
            sim_time: 0.0,
            num_threads: 1,
            #[cfg(feature = "parallel")]
            pool: None,
        };
        network.set_num_threads(threads)?;
        Ok(network)
    }

    /// Append a population of `size` neurons driven by `model`
    ///
    /// Extends the state arrays, initializing membrane potential to
    /// `model.init_value()`, last-spike to -inf (so the refractory guard
    /// is inactive at t=0) and last-update to 0. Accepts either a model
    /// value or an `Arc` to share one model between populations.
    pub fn add_population(
        &mut self,
        size: usize,
        model: impl Into<Arc<NeuronModel>>,
    ) -> Result<()> {
        let model = model.into();
        model.validate()?;

        let base = self.states.len();
        let init = model.init_value();
        let pop_index = self.populations.len() as u32;

        self.states.resize(base + size, init);
        self.last_spikes.resize(base + size, f64::NEG_INFINITY);
        self.last_updates.resize(base + size, 0.0);
        self.pop_of.resize(base + size, pop_index);
        self.adjacency.resize_with(base + size, SmallVec::new);
        self.populations
            .push(NeuronPopulation::new(base, size, model));
        Ok(())
    }

    /// Append a synapse; fails with `IndexOutOfRange` if either endpoint
    /// does not name an existing neuron, leaving the network unchanged
    pub fn add_synapse(&mut self, synapse: Synapse) -> Result<()> {
        self.check_index(synapse.src)?;
        self.check_index(synapse.dst)?;
        if synapse.delay < 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "delay",
                synapse.delay.to_string(),
                ">= 0.0",
            ));
        }

        self.adjacency[synapse.src.index()].push(synapse);
        Ok(())
    }

    /// Schedule an external spike delivery `offset` after the current
    /// simulation clock
    pub fn schedule_spike(&mut self, offset: f64, target: NeuronId, weight: f64) -> Result<()> {
        self.check_index(target)?;
        let time = self.sim_time + offset;
        self.queue.push(time, Event::spike(time, target, weight));
        Ok(())
    }

    /// Attach (or replace) the spike sink
    pub fn set_spike_monitor(&mut self, sink: SharedSpikeSink) {
        self.spike_sink = Some(sink);
    }

    /// Attach (or replace) the state sink; its `reading_interval` sets the
    /// sampling period of subsequent runs
    pub fn set_state_monitor(&mut self, sink: SharedStateSink) {
        self.state_sink = Some(sink);
    }

    /// Clear the buffers of any attached sinks
    pub fn reset_monitors(&mut self) {
        if let Some(sink) = &self.spike_sink {
            sink.lock().reset();
        }
        if let Some(sink) = &self.state_sink {
            sink.lock().reset();
        }
    }

    /// Set the worker thread count for bulk decay
    pub fn set_num_threads(&mut self, threads: usize) -> Result<()> {
        if threads == 0 {
            return Err(RuntimeError::invalid_parameter(
                "threads",
                threads.to_string(),
                ">= 1",
            ));
        }

        #[cfg(feature = "parallel")]
        {
            self.pool = if threads > 1 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        RuntimeError::invalid_parameter(
                            "threads",
                            threads.to_string(),
                            format!("a buildable worker pool ({})", e),
                        )
                    })?;
                Some(pool)
            } else {
                None
            };
        }

        self.num_threads = threads;
        Ok(())
    }

    /// Active worker thread count
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Total neuron count across all populations
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Number of populations
    pub fn population_count(&self) -> usize {
        self.populations.len()
    }

    /// Total synapse count
    pub fn synapse_count(&self) -> usize {
        self.adjacency.iter().map(SmallVec::len).sum()
    }

    /// Current simulation clock
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Number of events still queued
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Membrane potential of one neuron as of its last advancement
    pub fn membrane_potential(&self, neuron: NeuronId) -> Result<f64> {
        self.check_index(neuron)?;
        Ok(self.states[neuron.index()])
    }

    /// Advance the simulation clock by `duration`
    ///
    /// Drains events in non-decreasing time order up to the horizon
    /// `sim_time + duration`; an event beyond the horizon stays queued for
    /// a later run. If a state sink is attached, sampling ticks are
    /// scheduled at `sim_time + k * interval` for every k with
    /// `k * interval <= duration` (the horizon itself included).
    ///
    /// Equal-time events are processed in insertion order; the ticks
    /// scheduled here therefore precede any fan-out spike generated during
    /// the run at the same instant.
    ///
    /// On error the failing operation's event has been consumed but
    /// `sim_time` is unchanged; processed events remain applied.
    pub fn run(&mut self, duration: f64) -> Result<()> {
        if !(duration >= 0.0 && duration.is_finite()) {
            return Err(RuntimeError::invalid_parameter(
                "duration",
                duration.to_string(),
                ">= 0.0 and finite",
            ));
        }

        let horizon = self.sim_time + duration;

        if let Some(sink) = &self.state_sink {
            let interval = sink.lock().reading_interval();
            if !(interval > 0.0 && interval.is_finite()) {
                return Err(RuntimeError::invalid_parameter(
                    "reading_interval",
                    interval.to_string(),
                    "> 0.0 and finite",
                ));
            }

            let mut k = 0u64;
            loop {
                let offset = k as f64 * interval;
                if offset > duration {
                    break;
                }
                let time = self.sim_time + offset;
                self.queue.push(time, Event::tick(time));
                k += 1;
            }
        }

        log::debug!(
            "run: advancing from t={} to t={} ({} events pending)",
            self.sim_time,
            horizon,
            self.queue.len()
        );

        let mut processed = 0usize;
        let mut emitted = 0usize;
        loop {
            match self.queue.top() {
                Ok((time, _)) if time > horizon => break,
                Ok(_) => {}
                Err(QueueError::Empty) => break,
                Err(e) => return Err(e.into()),
            }

            let (_, event) = self.queue.pop()?;
            match event {
                Event::Spike {
                    time,
                    target,
                    weight,
                } => {
                    if self.deliver_spike(time, target, weight)? {
                        emitted += 1;
                    }
                }
                Event::Tick { time } => self.sample_state(time)?,
            }
            processed += 1;
        }

        self.sim_time = horizon;
        log::debug!(
            "run complete: {} events processed, {} spikes emitted, t={}",
            processed,
            emitted,
            self.sim_time
        );
        Ok(())
    }

    fn check_index(&self, neuron: NeuronId) -> Result<()> {
        if neuron.index() >= self.states.len() {
            return Err(RuntimeError::index_out_of_range(
                neuron.raw(),
                self.states.len(),
            ));
        }
        Ok(())
    }

    /// Decay the target to the event time, apply the charge, and on a
    /// threshold crossing notify the sink and fan out along outgoing
    /// synapses. Returns whether the target fired.
    fn deliver_spike(&mut self, time: f64, target: NeuronId, weight: f64) -> Result<bool> {
        let idx = target.index();
        let model = self.populations[self.pop_of[idx] as usize].model_handle();

        model.decay(
            time,
            &mut self.states[idx..idx + 1],
            &self.last_spikes[idx..idx + 1],
            &mut self.last_updates[idx..idx + 1],
        );
        let crossed = model.receive(
            time,
            weight,
            &mut self.states[idx],
            &mut self.last_spikes[idx],
        );

        if !self.states[idx].is_finite() {
            return Err(RuntimeError::invariant(format!(
                "non-finite membrane potential on neuron {} at t={}",
                target, time
            )));
        }

        if crossed {
            if let Some(sink) = &self.spike_sink {
                sink.lock().on_spike(time, target);
            }
            for synapse in &self.adjacency[idx] {
                let arrival = time + synapse.delay;
                self.queue
                    .push(arrival, Event::spike(arrival, synapse.dst, synapse.weight));
            }
        }
        Ok(crossed)
    }

    /// Bulk-decay every population to the tick time, then hand the state
    /// snapshot to the state sink.
    fn sample_state(&mut self, time: f64) -> Result<()> {
        for pop_idx in 0..self.populations.len() {
            let pop = &self.populations[pop_idx];
            if pop.is_empty() {
                continue;
            }
            let range = pop.range();
            let model = pop.model_handle();
            let states = &mut self.states[range.clone()];
            let spikes = &self.last_spikes[range.clone()];
            let updates = &mut self.last_updates[range];

            #[cfg(feature = "parallel")]
            {
                match self.pool.as_ref() {
                    Some(pool) if states.len() >= PARALLEL_DECAY_MIN => {
                        // Index-partitioned chunks: workers write disjoint
                        // ranges, so no locking is needed.
                        let chunk = states.len().div_ceil(pool.current_num_threads()).max(1);
                        let model = &model;
                        pool.install(|| {
                            states
                                .par_chunks_mut(chunk)
                                .zip(spikes.par_chunks(chunk))
                                .zip(updates.par_chunks_mut(chunk))
                                .for_each(|((s, ls), lu)| model.decay(time, s, ls, lu));
                        });
                    }
                    _ => model.decay(time, states, spikes, updates),
                }
            }
            #[cfg(not(feature = "parallel"))]
            model.decay(time, states, spikes, updates);

            if self.states[self.populations[pop_idx].range()]
                .iter()
                .any(|v| !v.is_finite())
            {
                return Err(RuntimeError::invariant(format!(
                    "non-finite membrane potential in bulk decay at t={}",
                    time
                )));
            }
        }

        if let Some(sink) = &self.state_sink {
            sink.lock().on_read(time, &self.states);
        }
        Ok(())
    }
}

/// Builder for constructing networks
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    config: NetworkConfig,
    populations: Vec<(usize, Arc<NeuronModel>)>,
    synapses: Vec<Synapse>,
}

impl NetworkBuilder {
    /// Create a new builder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the network configuration
    pub fn with_config(mut self, config: NetworkConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a population
    pub fn add_population(mut self, size: usize, model: impl Into<Arc<NeuronModel>>) -> Self {
        self.populations.push((size, model.into()));
        self
    }

    /// Append a synapse
    pub fn add_synapse(mut self, src: NeuronId, dst: NeuronId, weight: f64, delay: f64) -> Self {
        self.synapses.push(Synapse::new(src, dst, weight, delay));
        self
    }

    /// Build the network
    pub fn build(self) -> Result<Network> {
        let mut network = Network::new(self.config)?;
        for (size, model) in self.populations {
            network.add_population(size, model)?;
        }
        for synapse in self.synapses {
            network.add_synapse(synapse)?;
        }
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::LifParams;

    fn lif_model() -> NeuronModel {
        // tau_m, c_m, v_rest, v_reset, v_thresh, refractory
        NeuronModel::Lif(LifParams::new(10.0, 1.0, 0.0, 0.0, 1.0, 2.0).unwrap())
    }

    #[test]
    fn test_network_creation() {
        let network = Network::new(NetworkConfig::default()).unwrap();
        assert_eq!(network.size(), 0);
        assert_eq!(network.population_count(), 0);
        assert_eq!(network.synapse_count(), 0);
        assert_eq!(network.sim_time(), 0.0);
    }

    #[test]
    fn test_config_validation() {
        let config = NetworkConfig {
            queue_buckets: 0,
            ..Default::default()
        };
        assert!(Network::new(config).is_err());

        let config = NetworkConfig {
            queue_width: -1.0,
            ..Default::default()
        };
        assert!(Network::new(config).is_err());

        let config = NetworkConfig {
            num_threads: 0,
            ..Default::default()
        };
        assert!(Network::new(config).is_err());
    }

    #[test]
    fn test_add_populations() {
        let mut network = Network::new(NetworkConfig::default()).unwrap();

        network.add_population(5, lif_model()).unwrap();
        assert_eq!(network.size(), 5);

        network.add_population(3, NeuronModel::Input).unwrap();
        assert_eq!(network.size(), 8);
        assert_eq!(network.population_count(), 2);

        // LIF neurons start at v_reset, input neurons at 0
        assert_eq!(network.membrane_potential(NeuronId::new(0)).unwrap(), 0.0);
        assert_eq!(network.membrane_potential(NeuronId::new(7)).unwrap(), 0.0);
    }

    #[test]
    fn test_shared_model_between_populations() {
        let mut network = Network::new(NetworkConfig::default()).unwrap();
        let model = Arc::new(lif_model());

        network.add_population(2, Arc::clone(&model)).unwrap();
        network.add_population(3, model).unwrap();
        assert_eq!(network.size(), 5);
        assert_eq!(network.population_count(), 2);
    }

    #[test]
    fn test_add_synapse_out_of_range() {
        let mut network = Network::new(NetworkConfig::default()).unwrap();
        network.add_population(2, lif_model()).unwrap();

        let ok = Synapse::new(NeuronId::new(0), NeuronId::new(1), 5.0, 1.0);
        assert!(network.add_synapse(ok).is_ok());

        let bad = Synapse::new(NeuronId::new(0), NeuronId::new(5), 5.0, 1.0);
        let err = network.add_synapse(bad).unwrap_err();
        assert!(matches!(err, RuntimeError::IndexOutOfRange { index: 5, .. }));
        // Failed insertion leaves the network unchanged
        assert_eq!(network.synapse_count(), 1);
    }

    #[test]
    fn test_add_synapse_negative_delay() {
        let mut network = Network::new(NetworkConfig::default()).unwrap();
        network.add_population(2, lif_model()).unwrap();

        let bad = Synapse::new(NeuronId::new(0), NeuronId::new(1), 5.0, -1.0);
        assert!(matches!(
            network.add_synapse(bad),
            Err(RuntimeError::InvalidParameter { .. })
        ));
        assert_eq!(network.synapse_count(), 0);
    }

    #[test]
    fn test_schedule_spike_out_of_range() {
        let mut network = Network::new(NetworkConfig::default()).unwrap();
        network.add_population(2, lif_model()).unwrap();

        assert!(network.schedule_spike(0.0, NeuronId::new(0), 10.0).is_ok());
        assert!(matches!(
            network.schedule_spike(1.0, NeuronId::new(5), 10.0),
            Err(RuntimeError::IndexOutOfRange { .. })
        ));
        assert_eq!(network.pending_events(), 1);
    }

    #[test]
    fn test_run_rejects_bad_duration() {
        let mut network = Network::new(NetworkConfig::default()).unwrap();
        assert!(network.run(-1.0).is_err());
        assert!(network.run(f64::NAN).is_err());
        assert_eq!(network.sim_time(), 0.0);
    }

    #[test]
    fn test_builder() {
        let network = NetworkBuilder::new()
            .add_population(2, lif_model())
            .add_population(1, NeuronModel::Input)
            .add_synapse(NeuronId::new(2), NeuronId::new(0), 1.5, 0.5)
            .add_synapse(NeuronId::new(0), NeuronId::new(1), 1.5, 1.0)
            .build()
            .unwrap();

        assert_eq!(network.size(), 3);
        assert_eq!(network.population_count(), 2);
        assert_eq!(network.synapse_count(), 2);
    }

    #[test]
    fn test_builder_rejects_bad_synapse() {
        let result = NetworkBuilder::new()
            .add_population(1, lif_model())
            .add_synapse(NeuronId::new(0), NeuronId::new(9), 1.0, 0.0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_set_num_threads() {
        let mut network = Network::new(NetworkConfig::default()).unwrap();
        assert_eq!(network.num_threads(), 1);

        network.set_num_threads(2).unwrap();
        assert_eq!(network.num_threads(), 2);

        assert!(network.set_num_threads(0).is_err());
        assert_eq!(network.num_threads(), 2);
    }
}
