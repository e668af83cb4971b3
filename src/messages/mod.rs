//! Negotiation and messaging
//!
//! Server-backed message threads between IP owners and prospective
//! buyers. An offer or message submission is a single atomic append to
//! the thread document; activity feeds are derived from the threads at
//! read time rather than maintained as separate mutable state.

pub mod store;

pub use store::{
    activity_feed, ActivityEntry, MessageStore, ACTIVITY_LOG_CAP, RECENT_ACTIVITY_CAP,
};
