//! Star ledger for a household chore chart.
//!
//! Children earn stars by finishing timed tasks and spend them on prizes;
//! a redemption debits the stars at once and waits for a parent to approve
//! it or reject it for a refund. Every component persists through an
//! injected [`storage::KeyValueStore`].

pub mod access;
pub mod backup;
pub mod catalog;
pub mod cli_io;
pub mod commands;
pub mod constants;
pub mod ledger;
pub mod redemption;
pub mod request;
pub mod storage;
pub mod transaction;
