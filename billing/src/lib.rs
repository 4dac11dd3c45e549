// Copyright (c) 2024 Botho Foundation

//! Billing node library - a rating-weighted coin ledger.
//!
//! This library provides the in-memory coin ledger, its JSON-RPC front end
//! and the node configuration. Emission shares are computed by the
//! `billing-allocation` crate.

#![deny(clippy::print_stdout)]

pub mod config;
pub mod ledger;
pub mod rpc;

// Re-export commands module for CLI binary
pub mod commands;
