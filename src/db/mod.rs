//! MongoDB access layer
//!
//! Typed collection wrappers plus the document schemas for every
//! persisted collection.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
