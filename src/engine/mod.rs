//! Module for the core reconciliation logic of the engine

mod attributes;
mod logic;
mod reconcile;
mod status;
pub(crate) mod sweep;
