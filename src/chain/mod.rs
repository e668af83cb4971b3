//! On-chain registry client
//!
//! Typed access to the deployed HyDRAULIC registry contract. Every
//! contract method is one trait method with typed parameters and a typed
//! transaction receipt, so call sites never pass loosely-typed values and
//! always observe confirmation (or a bounded timeout) before proceeding.

pub mod abi;
pub mod registry;
pub mod rpc;

pub use registry::{IpRegistry, MintOutcome, MockRegistry, TxReceipt};
pub use rpc::{ChainConfig, EthRegistry};
