//! Causelog correlator - reconstructs the causal context around a
//! triggering error record from a buffer snapshot.

pub mod correlator;
pub mod origin;

pub use correlator::{Correlator, CorrelatorConfig};
pub use origin::OriginResolver;
