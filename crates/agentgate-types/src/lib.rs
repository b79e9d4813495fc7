//! Shared domain types for Agentgate.
//!
//! This crate defines the A2A protocol envelope, routing results, guard
//! configuration, and audit entry types. It has no IO dependencies --
//! `agentgate-core` and `agentgate-infra` both build on it.

pub mod audit;
pub mod config;
pub mod error;
pub mod message;
pub mod route;
