//! Database schemas for IPSphere
//!
//! Defines MongoDB document structures for users, IP records, due
//! diligence, valuations, and message threads.

mod due_diligence;
mod ip;
mod metadata;
mod thread;
mod user;
mod valuation;

pub use due_diligence::{DueDiligenceDoc, DUE_DILIGENCE_COLLECTION};
pub use ip::{IpDoc, IpStatus, RegistrationStatus, IP_COLLECTION};
pub use metadata::Metadata;
pub use thread::{
    thread_key, MessageThreadDoc, ThreadMessage, MESSAGE_THREAD_COLLECTION,
};
pub use user::{PracticeType, SignedAgreements, UserDoc, USER_COLLECTION};
pub use valuation::{ValuationDoc, ValuationReport, VALUATION_COLLECTION};
