//! `decider_core` is a deterministic feature-decision engine: given a feature name and a request
//! context, it assigns a treatment (an experiment variant or a dynamic-configuration value)
//! without any coordination between servers. Thousands of stateless processes evaluating the same
//! feature for the same identity always agree on the answer, because the answer is a pure
//! function of the configuration snapshot and the context.
//!
//! # Overview
//!
//! [`Configuration`] is the heart of the engine. It is an immutable snapshot of validated feature
//! definitions, built once from a raw JSON document. Definitions that fail validation are dropped
//! individually and recorded in a [`LoadReport`] so one bad entry never takes down the rest
//! (partial-load tolerance).
//!
//! [`ConfigurationStore`](configuration_store::ConfigurationStore) is a thread-safe multi-reader
//! multi-writer holder for the currently active [`Configuration`]. Whenever configuration
//! changes, it is replaced completely. When a reader gets a configuration, it receives a
//! *snapshot* that is not affected by further writes, so an in-flight decision never observes a
//! half-updated feature.
//!
//! [`eval`] contains the decision logic. [`eval::choose`] is a pure function over a snapshot, a
//! [`Context`], a [`Bucketer`](bucketer::Bucketer), and a clock reading; it returns a
//! [`Decision`](eval::Decision) together with zero or one audit [`events`] strings that the
//! caller is expected to forward to analytics storage — the engine never logs them itself.
//! [`eval::Decider`] is the facade that supplies the snapshot and the clock automatically; it is
//! the only entry point most hosts need.
//!
//! [`bucketer`] maps identities to positions in `[0, 1)` via a stable md5-based hash. The mapping
//! is a wire-level contract: it must never change for a feature with live assignments, because
//! changing it reassigns the entire population. Operators re-randomize deliberately by bumping a
//! feature's shuffle or experiment version instead.
//!
//! The engine performs no I/O. Loading configuration bytes from disk or network, exposing the
//! engine over a transport, and shipping the emitted event strings somewhere durable are all the
//! host's concern.

#![warn(rustdoc::missing_crate_level_docs)]

pub mod bucketer;
pub mod configuration_store;
pub mod eval;
pub mod events;
pub mod feature;

mod configuration;
mod context;
mod error;
mod str;

pub use crate::str::Str;
pub use configuration::{Configuration, LoadFailure, LoadReport};
pub use context::{Context, ContextValue, OtherFields};
pub use error::{Error, Result};
