//! Services behind the ReWear point-of-sale application.
//!
//! The crate is organised by business concern. `matching` holds the pure
//! name-similarity logic used to avoid duplicate customers; everything else
//! wires that logic into customers, purchases, and receipt digitization.

pub mod catalog;
pub mod config;
pub mod customers;
pub mod digitize;
pub mod error;
pub mod export;
pub mod matching;
pub mod purchases;
pub mod session;
pub mod settings;
pub mod telemetry;
