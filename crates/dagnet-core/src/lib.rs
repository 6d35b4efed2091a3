//! Core types for the dagnet SDK: addresses, amounts, the `{value, proofs}`
//! transaction envelope, the error taxonomy, and the pure input validators.
//!
//! This crate performs no I/O and holds no state.

pub mod constants;
pub mod envelope;
pub mod error;
pub mod types;
pub mod validation;

pub use constants::*;
pub use envelope::{DataValue, Proof, Transaction, TransactionValue, TransferValue};
pub use error::{DagError, ValidationError};
pub use types::{Address, Amount, Ordinal, TransactionRef, TxHash};
