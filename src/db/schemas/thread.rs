//! Message thread schema
//!
//! One document per participant pair. The thread key is the sorted pair
//! joined with ':' so either side of a conversation resolves to the same
//! document, and an append is a single atomic update on that document.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for message threads
pub const MESSAGE_THREAD_COLLECTION: &str = "messageThreads";

/// Canonical key for a participant pair: sorted, joined with ':'
pub fn thread_key(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}", first, second)
}

/// A single message inside a thread
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessage {
    /// Message id, unique within the thread
    pub id: String,

    pub sender_id: String,

    pub content: String,

    /// Whether this message carries an offer
    #[serde(default)]
    pub is_offer: bool,

    /// Offer amount as submitted (free-form, e.g. "2.5 ETH")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_amount: Option<String>,

    pub sent_at: DateTime,
}

impl ThreadMessage {
    /// Create a message stamped with the current time
    pub fn new(sender_id: &str, content: &str, offer_amount: Option<String>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            is_offer: offer_amount.is_some(),
            offer_amount,
            sent_at: DateTime::now(),
        }
    }
}

impl Default for ThreadMessage {
    fn default() -> Self {
        Self {
            id: String::new(),
            sender_id: String::new(),
            content: String::new(),
            is_offer: false,
            offer_amount: None,
            sent_at: DateTime::from_millis(0),
        }
    }
}

/// Message thread stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MessageThreadDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Sorted participant pair key (unique)
    pub thread_key: String,

    /// Both participant ids, sorted
    #[serde(default)]
    pub participants: Vec<String>,

    /// Ordered message list, oldest first
    #[serde(default)]
    pub messages: Vec<ThreadMessage>,

    /// Timestamp of the most recent append
    pub last_updated: DateTime,
}

impl MessageThreadDoc {
    /// The other participant from `me`'s point of view
    pub fn counterparty(&self, me: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.as_str() != me)
            .map(String::as_str)
    }
}

impl Default for MessageThreadDoc {
    fn default() -> Self {
        Self {
            id: None,
            metadata: Metadata::default(),
            thread_key: String::new(),
            participants: Vec::new(),
            messages: Vec::new(),
            last_updated: DateTime::from_millis(0),
        }
    }
}

impl IntoIndexes for MessageThreadDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "threadKey": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("thread_key_unique".to_string())
                        .build(),
                ),
            ),
            // Participant listing sorted by recency
            (
                doc! { "participants": 1, "lastUpdated": -1 },
                Some(
                    IndexOptions::builder()
                        .name("participants_recency_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for MessageThreadDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_key_is_order_independent() {
        assert_eq!(thread_key("0xA", "0xB"), thread_key("0xB", "0xA"));
        assert_eq!(thread_key("0xA", "0xB"), "0xA:0xB");
    }

    #[test]
    fn thread_key_sorts_lexicographically() {
        assert_eq!(thread_key("bob", "alice"), "alice:bob");
        assert_eq!(thread_key("alice", "alice2"), "alice:alice2");
    }

    #[test]
    fn offer_messages_are_flagged() {
        let plain = ThreadMessage::new("0xA", "hello", None);
        assert!(!plain.is_offer);
        assert!(plain.offer_amount.is_none());

        let offer = ThreadMessage::new("0xA", "initial offer", Some("2.5".into()));
        assert!(offer.is_offer);
        assert_eq!(offer.offer_amount.as_deref(), Some("2.5"));
        assert!(offer.id.starts_with("msg-"));
    }

    #[test]
    fn counterparty_resolves_the_other_side() {
        let thread = MessageThreadDoc {
            thread_key: thread_key("0xA", "0xB"),
            participants: vec!["0xA".into(), "0xB".into()],
            ..Default::default()
        };
        assert_eq!(thread.counterparty("0xA"), Some("0xB"));
        assert_eq!(thread.counterparty("0xB"), Some("0xA"));
        assert_eq!(thread.counterparty("0xC"), Some("0xA"));
    }
}
