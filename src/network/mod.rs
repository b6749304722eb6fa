//! Multi-machine drivers.
//!
//! Machines never share memory; the only coupling is a driver relaying one
//! machine's output as the next machine's input batch.

pub mod amplifier;

pub use amplifier::{permutations, AmplifierNetwork, NetworkError};
