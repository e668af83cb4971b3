//! Message thread store
//!
//! One upsert per append: `$push` the message and `$set` the recency
//! stamp on the thread document keyed by the sorted participant pair.
//! MongoDB applies the update atomically at document granularity, so a
//! reader never observes a logged activity without its thread message.

use bson::{doc, DateTime};
use serde::Serialize;
use tracing::info;

use crate::db::schemas::{
    thread_key, MessageThreadDoc, ThreadMessage, MESSAGE_THREAD_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{IpsphereError, Result};

/// Upper bound on the derived activity log
pub const ACTIVITY_LOG_CAP: usize = 50;

/// Upper bound on the dashboard recent-activity feed
pub const RECENT_ACTIVITY_CAP: usize = 10;

/// One entry in a derived activity feed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub thread_key: String,
    pub sender_id: String,
    pub content: String,
    pub is_offer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_amount: Option<String>,
    pub sent_at: DateTime,
}

/// Handle over the message-thread collection
pub struct MessageStore {
    coll: MongoCollection<MessageThreadDoc>,
}

impl MessageStore {
    /// Open the store against the threads collection
    pub async fn open(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            coll: mongo
                .collection::<MessageThreadDoc>(MESSAGE_THREAD_COLLECTION)
                .await?,
        })
    }

    /// Append a message to the conversation between two participants,
    /// creating the thread when it does not exist yet. One document
    /// update; no companion writes.
    pub async fn append_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
        offer_amount: Option<String>,
    ) -> Result<(String, ThreadMessage)> {
        if sender_id.is_empty() || recipient_id.is_empty() {
            return Err(IpsphereError::Validation(
                "senderId and recipientId are required".into(),
            ));
        }
        if sender_id == recipient_id {
            return Err(IpsphereError::Validation(
                "cannot open a thread with yourself".into(),
            ));
        }
        if content.trim().is_empty() {
            return Err(IpsphereError::Validation("message content is empty".into()));
        }

        let key = thread_key(sender_id, recipient_id);
        let message = ThreadMessage::new(sender_id, content.trim(), offer_amount);
        let now = DateTime::now();

        let mut participants = [sender_id.to_string(), recipient_id.to_string()];
        participants.sort();

        let update = doc! {
            "$push": { "messages": bson::to_bson(&message)? },
            "$set": {
                "lastUpdated": now,
                "metadata.updated_at": now,
            },
            "$setOnInsert": {
                "threadKey": &key,
                "participants": participants.to_vec(),
                "metadata.is_deleted": false,
                "metadata.created_at": now,
            },
        };

        self.coll
            .upsert_one(doc! { "threadKey": &key }, update)
            .await?;

        info!(
            thread = %key,
            offer = message.is_offer,
            "Appended message to thread"
        );

        Ok((key, message))
    }

    /// Threads involving a participant, most recently active first
    pub async fn threads_for(&self, participant: &str) -> Result<Vec<MessageThreadDoc>> {
        self.coll
            .find_many_sorted(
                doc! { "participants": participant },
                Some(doc! { "lastUpdated": -1 }),
                None,
            )
            .await
    }

    /// A single thread by its key
    pub async fn thread_by_key(&self, key: &str) -> Result<MessageThreadDoc> {
        self.coll
            .find_one(doc! { "threadKey": key })
            .await?
            .ok_or_else(|| IpsphereError::NotFound(format!("thread '{}' not found", key)))
    }

    /// Derived activity log for a participant, capped at
    /// [`ACTIVITY_LOG_CAP`] (or a smaller caller-supplied limit)
    pub async fn activity_for(
        &self,
        participant: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityEntry>> {
        let threads = self.threads_for(participant).await?;
        let cap = limit
            .unwrap_or(ACTIVITY_LOG_CAP)
            .min(ACTIVITY_LOG_CAP);
        Ok(activity_feed(&threads, cap))
    }

    /// Derived dashboard feed, capped at [`RECENT_ACTIVITY_CAP`]
    pub async fn recent_activity_for(&self, participant: &str) -> Result<Vec<ActivityEntry>> {
        let threads = self.threads_for(participant).await?;
        Ok(activity_feed(&threads, RECENT_ACTIVITY_CAP))
    }
}

/// Flatten threads into a newest-first feed, truncated to `cap`.
/// Pure so the feed shape can be tested without a database.
pub fn activity_feed(threads: &[MessageThreadDoc], cap: usize) -> Vec<ActivityEntry> {
    let mut entries: Vec<ActivityEntry> = threads
        .iter()
        .flat_map(|thread| {
            thread.messages.iter().map(|message| ActivityEntry {
                thread_key: thread.thread_key.clone(),
                sender_id: message.sender_id.clone(),
                content: message.content.clone(),
                is_offer: message.is_offer,
                offer_amount: message.offer_amount.clone(),
                sent_at: message.sent_at,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    entries.truncate(cap);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_at(sender: &str, content: &str, millis: i64) -> ThreadMessage {
        ThreadMessage {
            id: format!("msg-{}", millis),
            sender_id: sender.to_string(),
            content: content.to_string(),
            is_offer: false,
            offer_amount: None,
            sent_at: DateTime::from_millis(millis),
        }
    }

    fn thread_with(a: &str, b: &str, messages: Vec<ThreadMessage>) -> MessageThreadDoc {
        let last = messages
            .iter()
            .map(|m| m.sent_at)
            .max()
            .unwrap_or_else(DateTime::now);
        MessageThreadDoc {
            thread_key: thread_key(a, b),
            participants: vec![a.to_string(), b.to_string()],
            messages,
            last_updated: last,
            ..Default::default()
        }
    }

    #[test]
    fn feed_is_newest_first_across_threads() {
        let threads = vec![
            thread_with(
                "0xA",
                "0xB",
                vec![message_at("0xA", "first", 100), message_at("0xB", "third", 300)],
            ),
            thread_with("0xA", "0xC", vec![message_at("0xC", "second", 200)]),
        ];

        let feed = activity_feed(&threads, ACTIVITY_LOG_CAP);
        let contents: Vec<&str> = feed.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);
    }

    #[test]
    fn feed_respects_the_cap() {
        let messages: Vec<ThreadMessage> = (0..30)
            .map(|i| message_at("0xA", &format!("m{}", i), i as i64))
            .collect();
        let threads = vec![
            thread_with("0xA", "0xB", messages.clone()),
            thread_with("0xA", "0xC", messages),
        ];

        assert_eq!(activity_feed(&threads, ACTIVITY_LOG_CAP).len(), 50);
        let recent = activity_feed(&threads, RECENT_ACTIVITY_CAP);
        assert_eq!(recent.len(), 10);
        // The cap keeps the newest entries
        assert_eq!(recent[0].content, "m29");
    }

    #[test]
    fn feed_carries_offer_fields_through() {
        let mut offer = message_at("0xB", "2 ETH for IP-1", 500);
        offer.is_offer = true;
        offer.offer_amount = Some("2".to_string());
        let threads = vec![thread_with("0xA", "0xB", vec![offer])];

        let feed = activity_feed(&threads, RECENT_ACTIVITY_CAP);
        assert_eq!(feed.len(), 1);
        assert!(feed[0].is_offer);
        assert_eq!(feed[0].offer_amount.as_deref(), Some("2"));
        assert_eq!(feed[0].thread_key, thread_key("0xB", "0xA"));
    }

    #[test]
    fn empty_threads_produce_an_empty_feed() {
        assert!(activity_feed(&[], ACTIVITY_LOG_CAP).is_empty());
        let threads = vec![thread_with("0xA", "0xB", vec![])];
        assert!(activity_feed(&threads, ACTIVITY_LOG_CAP).is_empty());
    }
}
