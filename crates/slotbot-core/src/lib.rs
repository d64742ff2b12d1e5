pub mod adapter;
pub mod attempts;
pub mod config;
pub mod error;
pub mod exec;
pub mod io;
pub mod ledger;
pub mod lesson;
pub mod occurrence;
pub mod orchestrator;
pub mod paths;
pub mod reconcile;
pub mod types;

pub use error::{Result, SlotbotError};
