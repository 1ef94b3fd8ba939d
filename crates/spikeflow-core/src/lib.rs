//! Event primitives and the calendar-queue scheduler for the spikeflow
//! event-driven SNN simulator
//!
//! This crate provides the time-ordered event infrastructure the runtime is
//! built on: neuron identifiers, the event variant, and a calendar queue
//! whose insert/extract cost is O(1) amortized for the dense, near-monotonic
//! event streams a spiking network produces.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod error;
pub mod event;
pub mod ids;
pub mod queue;

// Re-export essential types
pub use error::{QueueError, Result};
pub use event::Event;
pub use ids::NeuronId;
pub use queue::CalendarQueue;

/// Default number of buckets for a newly created calendar queue
pub const DEFAULT_BUCKETS: usize = 128;

/// Default bucket stripe width for a newly created calendar queue
pub const DEFAULT_BUCKET_WIDTH: f64 = 1.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_integration() {
        // Default-constructed queue uses the documented tuning defaults
        let queue: CalendarQueue<Event> = CalendarQueue::default();
        assert_eq!(queue.bucket_count(), DEFAULT_BUCKETS);
        assert_eq!(queue.bucket_width(), DEFAULT_BUCKET_WIDTH);
        assert!(queue.is_empty());

        let event = Event::spike(1.0, NeuronId::new(0), 0.5);
        assert_eq!(event.time(), 1.0);
    }
}
