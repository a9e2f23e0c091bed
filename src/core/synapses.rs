//! A `Synapse` models a single connection between a column and one input dimension.
//!
//! Each column owns the list of synapses into its potential pool, the input dimensions it is
//! allowed to connect to. A dimension outside the pool has no synapse at all, which keeps
//! "not connected" distinct from "connected with a permanence of zero". A connection whose
//! permanence has decayed to zero keeps its synapse and can be strengthened again.
//!
//! During learning the permanence of every synapse of a fired column moves towards the current
//! input: up when the connected input is active, down when it is not, clamped to `[min, max]`.

use rand::{seq::SliceRandom, Rng};

use super::{settings::Settings, utilities};

/// A connection from a column to an input dimension, with its strength.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Synapse {
    /// Points to which input dimension this synapse connects to.
    pub index: usize,

    /// Represents the strength of the connection, always within `[0, 1]`.
    pub permanence: f32,
}

/// Options governing how synapse permanence is adjusted.
#[derive(Debug, Clone, Copy)]
pub struct SynapsePermanenceOptions {
    pub active_increment: f32,
    pub inactive_decrement: f32,
    pub min: f32,
    pub max: f32,
}

impl From<&Settings> for SynapsePermanenceOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            active_increment: settings.active_increment,
            inactive_decrement: settings.inactive_decrement,
            min: 0.0,
            max: 1.0,
        }
    }
}

/// Builds the potential-connectivity mask: exactly `pool_size` ones followed by zeros.
pub fn potential_mask(input_space: usize, pool_size: usize) -> Vec<bool> {
    let pool_size = pool_size.min(input_space);
    let mut mask = vec![false; input_space];
    mask[..pool_size].fill(true);
    mask
}

/// Shuffles `mask` and creates one synapse per selected input dimension.
///
/// Each permanence is drawn from [`utilities::biased_sample`] centered on `connection_threshold`.
/// The mask is shuffled in place, so calling this once per column gives every column its own
/// receptive field.
pub fn init_synapses<R: Rng>(
    mask: &mut [bool],
    connection_threshold: f32,
    rng: &mut R,
) -> Vec<Synapse> {
    mask.shuffle(rng);

    mask.iter()
        .enumerate()
        .filter(|(_, &potential)| potential)
        .map(|(index, _)| Synapse {
            index,
            permanence: utilities::biased_sample(connection_threshold, rng),
        })
        .collect()
}

/// Applies the Hebbian rule to the synapses of one fired column:
/// - increments the permanence of synapses whose input value is nonzero,
/// - decrements the permanence of synapses whose input value is zero,
/// - clamps every updated permanence to `[options.min, options.max]`.
///
/// Input dimensions without a synapse are untouched.
#[inline]
pub fn adapt_synapses(synapses: &mut [Synapse], input: &[f32], options: &SynapsePermanenceOptions) {
    for syn in synapses.iter_mut() {
        if input[syn.index] != 0.0 {
            syn.permanence += options.active_increment;
        } else {
            syn.permanence -= options.inactive_decrement;
        }
        syn.permanence = utilities::clamp(syn.permanence, options.min, options.max);
    }
}
