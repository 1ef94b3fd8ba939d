//! Neuron populations: contiguous SoA index ranges bound to one model

use std::sync::Arc;

use crate::neuron::NeuronModel;

/// A contiguous range `[base, base + len)` of the network's state arrays,
/// all advanced by the same model
///
/// Populations store `(base, len)` rather than slices; the state arrays may
/// reallocate as populations are appended, and slices are derived on demand
/// from whatever storage currently backs them. Populations are immutable
/// after creation.
#[derive(Debug, Clone)]
pub struct NeuronPopulation {
    base: usize,
    len: usize,
    model: Arc<NeuronModel>,
}

impl NeuronPopulation {
    /// Create a population of `len` neurons starting at index `base`
    pub fn new(base: usize, len: usize, model: Arc<NeuronModel>) -> Self {
        Self { base, len, model }
    }

    /// Index of the population's first neuron in the state arrays
    pub fn base(&self) -> usize {
        self.base
    }

    /// Number of neurons in the population
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the population holds no neurons
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index range of the population in the state arrays
    pub fn range(&self) -> std::ops::Range<usize> {
        self.base..self.base + self.len
    }

    /// The model advancing this population
    pub fn model(&self) -> &NeuronModel {
        &self.model
    }

    /// Shared handle to the model
    pub fn model_handle(&self) -> Arc<NeuronModel> {
        Arc::clone(&self.model)
    }
}
