//! # hearth-domain
//!
//! Pure domain model for the hearth home automation substrate.
//!
//! ## Responsibilities
//! - Foundational types: dot-delimited [`key::KeyPath`]s, the canonical
//!   boolean-string [`flag`] encoding, error conventions
//! - Define **group effects** (secondary keys mirroring or inverting a
//!   primary key when it changes)
//! - Define the [`log::LogContext`] correlation handle threaded through every
//!   cross-module call
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod flag;
pub mod group;
pub mod key;
pub mod log;
