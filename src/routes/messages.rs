//! HTTP routes for negotiation threads
//!
//! - POST /messages/send            - append an offer or message
//! - GET  /messages/threads?participant=
//! - GET  /messages/thread?threadKey=
//! - GET  /messages/activity?participant=&limit=
//! - GET  /messages/recentActivity?participant=

use bson::DateTime;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::schemas::{MessageThreadDoc, ThreadMessage};
use crate::messages::MessageStore;
use crate::routes::{json_response, parse_json_body, parse_query, BoxBody};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
pub struct ParticipantQuery {
    pub participant: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadKeyQuery {
    pub thread_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    #[serde(default)]
    pub offer_amount: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub thread_key: String,
    pub message: ThreadMessage,
}

/// Thread listing entry: enough for the conversation sidebar without
/// shipping every message
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub thread_key: String,
    pub participants: Vec<String>,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<ThreadMessage>,
    pub last_updated: DateTime,
}

/// Collapse a thread into its sidebar summary
pub fn summarize(thread: &MessageThreadDoc) -> ThreadSummary {
    ThreadSummary {
        thread_key: thread.thread_key.clone(),
        participants: thread.participants.clone(),
        message_count: thread.messages.len(),
        last_message: thread.messages.last().cloned(),
        last_updated: thread.last_updated,
    }
}

/// POST /messages/send
pub async fn handle_send_message(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: SendMessageRequest = parse_json_body(req).await?;

    let mongo = state.require_mongo()?;
    let store = MessageStore::open(mongo).await?;

    let (thread_key, message) = store
        .append_message(
            &body.sender_id,
            &body.recipient_id,
            &body.content,
            body.offer_amount,
        )
        .await?;

    Ok(json_response(
        StatusCode::CREATED,
        &SendMessageResponse {
            thread_key,
            message,
        },
    ))
}

/// GET /messages/threads?participant=
pub async fn handle_threads(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: ParticipantQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let store = MessageStore::open(mongo).await?;
    let threads = store.threads_for(&query.participant).await?;
    let summaries: Vec<ThreadSummary> = threads.iter().map(summarize).collect();

    Ok(json_response(StatusCode::OK, &summaries))
}

/// GET /messages/thread?threadKey=
pub async fn handle_thread(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: ThreadKeyQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let store = MessageStore::open(mongo).await?;
    let thread = store.thread_by_key(&query.thread_key).await?;

    Ok(json_response(StatusCode::OK, &thread))
}

/// GET /messages/activity?participant=&limit=
pub async fn handle_activity(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: ParticipantQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let store = MessageStore::open(mongo).await?;
    let feed = store.activity_for(&query.participant, query.limit).await?;

    Ok(json_response(StatusCode::OK, &feed))
}

/// GET /messages/recentActivity?participant=
pub async fn handle_recent_activity(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: ParticipantQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let store = MessageStore::open(mongo).await?;
    let feed = store.recent_activity_for(&query.participant).await?;

    Ok(json_response(StatusCode::OK, &feed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::thread_key;

    #[test]
    fn summary_keeps_the_latest_message() {
        let thread = MessageThreadDoc {
            thread_key: thread_key("0xA", "0xB"),
            participants: vec!["0xA".into(), "0xB".into()],
            messages: vec![
                ThreadMessage::new("0xA", "first", None),
                ThreadMessage::new("0xB", "latest", Some("3".into())),
            ],
            last_updated: DateTime::now(),
            ..Default::default()
        };

        let summary = summarize(&thread);
        assert_eq!(summary.message_count, 2);
        assert_eq!(
            summary.last_message.as_ref().map(|m| m.content.as_str()),
            Some("latest")
        );
        assert_eq!(summary.thread_key, "0xA:0xB");
    }

    #[test]
    fn empty_thread_summarizes_without_a_last_message() {
        let thread = MessageThreadDoc {
            thread_key: thread_key("0xA", "0xB"),
            participants: vec!["0xA".into(), "0xB".into()],
            last_updated: DateTime::now(),
            ..Default::default()
        };
        let summary = summarize(&thread);
        assert_eq!(summary.message_count, 0);
        assert!(summary.last_message.is_none());
    }
}
