//! User document schema
//!
//! One document per wallet address. Created on first wallet login,
//! enriched by the onboarding flow, and updated on every subsequent
//! login. Lawyers are ordinary users with `is_lawyer` set and the
//! lawyer-specific fields populated.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// Legal agreements a user has signed, stored as the raw signed message
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SignedAgreements {
    /// Signed onboarding agreement; `None` until onboarding completes
    pub onboarding: Option<String>,
}

/// How a lawyer practices
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PracticeType {
    Solo,
    Organization,
}

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Wallet address (identity key)
    pub address: String,

    pub email: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,

    /// Raw login payload from the wallet provider, kept as submitted
    #[serde(default)]
    pub last_login_data: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default)]
    pub signed_agreements: SignedAgreements,

    #[serde(default)]
    pub is_new_to_blockchain: bool,

    /// Whether KYC has completed; always false at signup
    #[serde(default)]
    pub is_kyc: bool,

    /// KYC evidence blob, free-form
    #[serde(default)]
    pub kyc: serde_json::Value,

    #[serde(default)]
    pub is_lawyer: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_type: Option<PracticeType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lawyer_description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_fees: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_under_practice: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_details: Option<String>,

    /// Valuations this lawyer has been assigned to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valuation_ids: Vec<String>,
}

impl UserDoc {
    /// Whether this user has completed onboarding
    pub fn is_onboarded(&self) -> bool {
        matches!(&self.signed_agreements.onboarding, Some(s) if !s.is_empty())
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on wallet address
            (
                doc! { "address": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("address_unique".to_string())
                        .build(),
                ),
            ),
            // Lawyer lookup by specialization
            (
                doc! { "isLawyer": 1, "specialization": 1 },
                Some(
                    IndexOptions::builder()
                        .name("lawyer_specialization_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboarded_requires_nonempty_agreement() {
        let mut user = UserDoc::default();
        assert!(!user.is_onboarded());

        user.signed_agreements.onboarding = Some(String::new());
        assert!(!user.is_onboarded());

        user.signed_agreements.onboarding = Some("0xsigned".to_string());
        assert!(user.is_onboarded());
    }

    #[test]
    fn wire_fields_are_camel_case() {
        let mut user = UserDoc {
            address: "0xA".into(),
            email: "a@example.com".into(),
            name: "A".into(),
            is_lawyer: true,
            specialization: Some("Patent".into()),
            ..Default::default()
        };
        user.practice_type = Some(PracticeType::Solo);

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["isLawyer"], serde_json::json!(true));
        assert_eq!(value["practiceType"], serde_json::json!("Solo"));
        assert!(value.get("is_lawyer").is_none());
    }
}
