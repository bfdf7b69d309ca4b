//! Deferred-work process for adpace.
//!
//! The `adpace-worker` binary runs a pool of [`dispatcher::Dispatcher`]
//! loops that drain the `work_items` queue, plus the
//! [`scheduler::Scheduler`] that enqueues reconciliation sweeps on their
//! UTC calendar. The `adpace` binary is the operator CLI built on
//! [`cli`].

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod scheduler;
