//! IP record schema and lifecycle status model
//!
//! One document per valuation form submission. The `status` field is a
//! closed enum advanced only through the transition table below; the
//! tokenize operation is the single path into `Tokenized` and records
//! the minted NFT token id in the same update, so a Tokenized record
//! always carries a real token id.

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for IP records
pub const IP_COLLECTION: &str = "ips";

/// Lifecycle status of an IP record
///
/// Draft       => owner completes the form
/// Unprocessed => pay valuation fee
/// Rejected    => revaluate
/// Valuing     => lawyers working, view details
/// Valued      => tokenize / revaluate
/// Tokenized   => listed on marketplace
/// Sold        => view current owner
/// Loaned      => view loan details
/// Forfeit     => view current owner & status (loan seizure)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IpStatus {
    #[default]
    Draft,
    Unprocessed,
    Rejected,
    Valuing,
    Valued,
    Tokenized,
    Sold,
    Loaned,
    Forfeit,
}

impl IpStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle step
    pub fn can_transition(self, next: IpStatus) -> bool {
        use IpStatus::*;
        matches!(
            (self, next),
            (Draft, Unprocessed)
                | (Unprocessed, Valuing)
                | (Unprocessed, Rejected)
                | (Rejected, Unprocessed)
                | (Valuing, Valued)
                | (Valuing, Rejected)
                | (Valued, Tokenized)
                | (Valued, Valuing)
                | (Tokenized, Sold)
                | (Tokenized, Loaned)
                | (Loaned, Sold)
                | (Loaned, Forfeit)
        )
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, IpStatus::Sold | IpStatus::Forfeit)
    }
}

impl fmt::Display for IpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IpStatus::Draft => "Draft",
            IpStatus::Unprocessed => "Unprocessed",
            IpStatus::Rejected => "Rejected",
            IpStatus::Valuing => "Valuing",
            IpStatus::Valued => "Valued",
            IpStatus::Tokenized => "Tokenized",
            IpStatus::Sold => "Sold",
            IpStatus::Loaned => "Loaned",
            IpStatus::Forfeit => "Forfeit",
        };
        f.write_str(s)
    }
}

impl FromStr for IpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(IpStatus::Draft),
            "Unprocessed" => Ok(IpStatus::Unprocessed),
            "Rejected" => Ok(IpStatus::Rejected),
            "Valuing" => Ok(IpStatus::Valuing),
            "Valued" => Ok(IpStatus::Valued),
            "Tokenized" => Ok(IpStatus::Tokenized),
            "Sold" => Ok(IpStatus::Sold),
            "Loaned" => Ok(IpStatus::Loaned),
            "Forfeit" => Ok(IpStatus::Forfeit),
            other => Err(format!("unknown IP status '{}'", other)),
        }
    }
}

/// Registration standing of the underlying IP right
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationStatus {
    Registered,
    Unregistered,
    Pending,
    Expired,
}

/// IP record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct IpDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owner wallet address
    pub address: String,

    /// Form identifier, unique per record; submitForm upserts on it
    pub form_id: String,

    pub ip_number: String,

    /// Patent, Trademark, Copyright, or Design
    pub ip_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_description: Option<String>,

    pub company_number: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_countries_serviced: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registered_regions: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_status: Option<RegistrationStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<DateTime<Utc>>,

    /// Lifecycle status (see transition table)
    #[serde(default)]
    pub status: IpStatus,

    /// Minted NFT token id; 0 until tokenized
    #[serde(default)]
    pub nft_token_id: i64,
}

impl IntoIndexes for IpDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on formId (submitForm upserts on it)
            (
                doc! { "formId": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("form_id_unique".to_string())
                        .build(),
                ),
            ),
            // Owner listing
            (
                doc! { "address": 1, "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("address_status_index".to_string())
                        .build(),
                ),
            ),
            // Due-diligence joins on ipNumber
            (
                doc! { "ipNumber": 1 },
                Some(
                    IndexOptions::builder()
                        .name("ip_number_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for IpDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_legal() {
        use IpStatus::*;
        assert!(Draft.can_transition(Unprocessed));
        assert!(Unprocessed.can_transition(Valuing));
        assert!(Valuing.can_transition(Valued));
        assert!(Valued.can_transition(Tokenized));
        assert!(Tokenized.can_transition(Sold));
        assert!(Tokenized.can_transition(Loaned));
        assert!(Loaned.can_transition(Forfeit));
    }

    #[test]
    fn rejection_loops_back_through_unprocessed() {
        use IpStatus::*;
        assert!(Unprocessed.can_transition(Rejected));
        assert!(Valuing.can_transition(Rejected));
        assert!(Rejected.can_transition(Unprocessed));
        assert!(!Rejected.can_transition(Valued));
    }

    #[test]
    fn tokenized_cannot_regress_to_draft() {
        use IpStatus::*;
        assert!(!Tokenized.can_transition(Draft));
        assert!(!Tokenized.can_transition(Valued));
        assert!(!Valued.can_transition(Draft));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        use IpStatus::*;
        for next in [
            Draft, Unprocessed, Rejected, Valuing, Valued, Tokenized, Sold, Loaned, Forfeit,
        ] {
            assert!(!Sold.can_transition(next));
            assert!(!Forfeit.can_transition(next));
        }
        assert!(Sold.is_terminal());
        assert!(Forfeit.is_terminal());
        assert!(!Tokenized.is_terminal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            IpStatus::Draft,
            IpStatus::Valued,
            IpStatus::Tokenized,
            IpStatus::Forfeit,
        ] {
            let parsed: IpStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("NotAStatus".parse::<IpStatus>().is_err());
    }

    #[test]
    fn doc_serializes_with_camel_case_keys() {
        let ip = IpDoc {
            address: "0xA".into(),
            form_id: "F1".into(),
            ip_number: "IP-1".into(),
            ip_type: "Patent".into(),
            company_number: "C-1".into(),
            status: IpStatus::Valued,
            ..Default::default()
        };

        let value = serde_json::to_value(&ip).unwrap();
        assert_eq!(value["formId"], serde_json::json!("F1"));
        assert_eq!(value["status"], serde_json::json!("Valued"));
        assert_eq!(value["nftTokenId"], serde_json::json!(0));
    }
}
