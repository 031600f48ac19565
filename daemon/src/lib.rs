// Harvest Daemon Library
// Exposes the ledger engine and its RPC layer for the binary and the tests

#![allow(clippy::type_complexity)]
#![allow(clippy::uninlined_format_args)]

extern crate log;

pub mod config;
pub mod core;
pub mod rpc;
