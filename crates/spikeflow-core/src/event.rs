//! The simulation event variant

use crate::ids::NeuronId;

/// A time-stamped simulation event
///
/// The scheduler orders events by `time()` only; payload plays no part in
/// the ordering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// Deliver `weight` charge to neuron `target` at `time`
    Spike {
        /// Delivery time
        time: f64,
        /// Receiving neuron
        target: NeuronId,
        /// Charge delivered
        weight: f64,
    },
    /// Bulk-sample every population at `time`
    Tick {
        /// Sampling time
        time: f64,
    },
}

impl Event {
    /// Create a spike delivery event
    pub const fn spike(time: f64, target: NeuronId, weight: f64) -> Self {
        Self::Spike {
            time,
            target,
            weight,
        }
    }

    /// Create a sampling tick event
    pub const fn tick(time: f64) -> Self {
        Self::Tick { time }
    }

    /// Time at which the event fires, regardless of variant
    pub const fn time(&self) -> f64 {
        match self {
            Self::Spike { time, .. } | Self::Tick { time } => *time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_time() {
        let spike = Event::spike(1.5, NeuronId::new(3), 0.25);
        assert_eq!(spike.time(), 1.5);

        let tick = Event::tick(-2.0);
        assert_eq!(tick.time(), -2.0);
    }
}
