//! Side-effecting services: the budget ledger, the campaign state machine,
//! spend recording and the reconciliation sweeps.
//!
//! Every service takes the current instant as a parameter so callers (the
//! worker, the API, tests) decide what "now" is.

pub mod campaigns;
pub mod error;
pub mod execute;
pub mod ledger;
pub mod spend;
pub mod sweeps;

pub use error::{EngineError, EngineResult};
