//! IPSphere - backend for the IP valuation and tokenization marketplace
//!
//! IPSphere fronts a MongoDB database with a JSON/REST surface for user
//! onboarding, IP valuation forms, due diligence, lawyer lookup, and
//! negotiation threads, plus a typed client for the on-chain HyDRAULIC
//! registry contract.
//!
//! ## Services
//!
//! - **Routes**: login/onboarding, valuation forms, due diligence, legal
//!   lookup, tokenization, message threads
//! - **Lifecycle**: closed IP status enum with a server-validated
//!   transition table
//! - **Messages**: server-backed negotiation threads with single-document
//!   atomic appends
//! - **Chain**: typed registry client over Ethereum JSON-RPC with receipt
//!   confirmation tracking

pub mod chain;
pub mod config;
pub mod db;
pub mod messages;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{IpsphereError, Result};
