//! Neuron models and their update kernels
//!
//! Models are a closed variant set with monomorphized dispatch. Each model
//! supplies the full capability set the loop needs: a bulk lazy `decay`
//! kernel, a single-neuron `receive`, and the initial membrane value.
//!
//! The loop contract: a neuron is always decayed to the event time before
//! `receive` runs on it, so whenever a membrane potential is observed it
//! has been integrated forward to the current simulated time.

use crate::error::{Result, RuntimeError};

/// Parameters for Leaky Integrate-and-Fire neurons
///
/// Units are implementation-defined but must be consistent across a run;
/// the defaults are SI (seconds, farads, volts).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LifParams {
    /// Membrane time constant
    pub tau_m: f64,
    /// Membrane capacitance
    pub c_m: f64,
    /// Resting potential the membrane decays toward
    pub v_rest: f64,
    /// Potential the membrane resets to after a spike
    pub v_reset: f64,
    /// Threshold potential
    pub v_thresh: f64,
    /// Refractory period; inputs within it are discarded
    pub refractory: f64,
}

impl Default for LifParams {
    fn default() -> Self {
        Self {
            tau_m: 0.02,       // 20ms membrane time constant
            c_m: 1e-6,         // 1uF capacitance
            v_rest: -0.07,     // -70mV resting potential
            v_reset: -0.07,    // -70mV reset potential
            v_thresh: -0.05,   // -50mV threshold
            refractory: 0.002, // 2ms refractory period
        }
    }
}

impl LifParams {
    /// Create new LIF parameters with validation
    pub fn new(
        tau_m: f64,
        c_m: f64,
        v_rest: f64,
        v_reset: f64,
        v_thresh: f64,
        refractory: f64,
    ) -> Result<Self> {
        if tau_m <= 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "tau_m",
                tau_m.to_string(),
                "> 0.0",
            ));
        }
        if c_m <= 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "c_m",
                c_m.to_string(),
                "> 0.0",
            ));
        }
        if v_thresh <= v_rest {
            return Err(RuntimeError::invalid_parameter(
                "v_thresh",
                format!("{} (with v_rest={})", v_thresh, v_rest),
                "> v_rest",
            ));
        }
        if refractory < 0.0 {
            return Err(RuntimeError::invalid_parameter(
                "refractory",
                refractory.to_string(),
                ">= 0.0",
            ));
        }

        Ok(Self {
            tau_m,
            c_m,
            v_rest,
            v_reset,
            v_thresh,
            refractory,
        })
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        Self::new(
            self.tau_m,
            self.c_m,
            self.v_rest,
            self.v_reset,
            self.v_thresh,
            self.refractory,
        )?;
        Ok(())
    }

    /// Bulk lazy advancement of a slice of neurons to time `t`, without
    /// applying any input.
    ///
    /// The inner loop is branch-free: a numeric refractory mask selects
    /// between the closed-form exponential decay (with `last_update`
    /// stamped to `t`) and the refractory clamp to `v_reset` (with
    /// `last_update` untouched). Every lane is independent, so the kernel
    /// vectorizes and may be run on disjoint chunks concurrently.
    pub fn decay(&self, t: f64, states: &mut [f64], last_spikes: &[f64], last_updates: &mut [f64]) {
        let v_rest = self.v_rest;
        let v_reset = self.v_reset;
        let inv_tau_m = 1.0 / self.tau_m;
        let refractory = self.refractory;

        for ((v, updated), &spiked) in states
            .iter_mut()
            .zip(last_updates.iter_mut())
            .zip(last_spikes.iter())
        {
            let dt = t - *updated;
            let mask = f64::from(u8::from(t - spiked >= refractory));
            let decayed = v_rest + (*v - v_rest) * (-dt * inv_tau_m).exp();

            *v = mask * decayed + (1.0 - mask) * v_reset;
            *updated = mask * t + (1.0 - mask) * *updated;
        }
    }

    /// Deliver `charge` to a single neuron already decayed to `t`; returns
    /// true on a threshold crossing.
    pub fn receive(&self, t: f64, charge: f64, state: &mut f64, last_spike: &mut f64) -> bool {
        if t - *last_spike < self.refractory {
            return false;
        }

        let v = *state + charge / self.c_m;
        if v >= self.v_thresh {
            *state = self.v_reset;
            *last_spike = t;
            return true;
        }

        *state = v;
        false
    }
}

/// A neuron model bound to one or more populations
///
/// Models are read-only after construction, so one model value may be
/// shared between populations safely.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeuronModel {
    /// Leaky Integrate-and-Fire dynamics
    Lif(LifParams),
    /// Passthrough input source: no dynamics, every delivery propagates
    Input,
}

impl NeuronModel {
    /// Create a LIF model with default parameters
    pub fn lif_default() -> Self {
        Self::Lif(LifParams::default())
    }

    /// Validate the model's parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Lif(params) => params.validate(),
            Self::Input => Ok(()),
        }
    }

    /// Initial membrane value for every neuron of a population using this
    /// model
    pub fn init_value(&self) -> f64 {
        match self {
            Self::Lif(params) => params.v_reset,
            Self::Input => 0.0,
        }
    }

    /// Bulk lazy advancement of a slice of neurons to time `t`
    pub fn decay(&self, t: f64, states: &mut [f64], last_spikes: &[f64], last_updates: &mut [f64]) {
        match self {
            Self::Lif(params) => params.decay(t, states, last_spikes, last_updates),
            Self::Input => {}
        }
    }

    /// Single-neuron delivery at `t`; returns true if the delivery causes
    /// a spike
    pub fn receive(&self, t: f64, charge: f64, state: &mut f64, last_spike: &mut f64) -> bool {
        match self {
            Self::Lif(params) => params.receive(t, charge, state, last_spike),
            Self::Input => true,
        }
    }
}
