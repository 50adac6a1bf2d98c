//! Screenlab Core — domain types, environment snapshots, indicators, factors
//! and data providers for the screening pipeline.
//!
//! This crate holds everything a single worker needs:
//! - Domain types (bars, series, capital, benchmark)
//! - Process environment with per-dispatch immutable snapshots
//! - Pick and timing factor traits, concrete factors and the factor registry
//! - Series providers (CSV store, synthetic, in-memory) and universe sources
//!
//! Orchestration (partitioning, dispatch, merge, split) lives in
//! `screenlab-runner`.

pub mod data;
pub mod domain;
pub mod env;
pub mod factors;
pub mod indicators;
