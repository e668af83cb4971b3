//! Valuation document schema
//!
//! Ties an IP to its assigned lawyers and the reports they file.
//! Data-layer only: lawyer reports accumulate here but no HTTP route is
//! wired to this collection.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for valuations
pub const VALUATION_COLLECTION: &str = "valuations";

/// A single lawyer-submitted valuation report
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValuationReport {
    pub lawyer_id: String,

    /// Lower bound of the estimated value range
    pub min_value: f64,

    /// Upper bound of the estimated value range
    pub max_value: f64,

    /// Maximum loan the lawyer would underwrite against this IP
    pub max_loan: f64,

    pub risk_score: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_link: Option<String>,
}

/// Valuation record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValuationDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    pub form_id: String,

    pub ip_number: String,

    pub company_number: String,

    /// Owner wallet address
    pub owner_id: String,

    pub start_date: String,

    pub end_date: String,

    #[serde(default)]
    pub assigned_lawyers: Vec<String>,

    #[serde(default)]
    pub reports: Vec<ValuationReport>,
}

impl ValuationDoc {
    /// Whether every assigned lawyer has filed a report
    pub fn is_complete(&self) -> bool {
        !self.assigned_lawyers.is_empty()
            && self.assigned_lawyers.iter().all(|lawyer| {
                self.reports.iter().any(|r| &r.lawyer_id == lawyer)
            })
    }
}

impl IntoIndexes for ValuationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "formId": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("form_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "assignedLawyers": 1 },
                Some(
                    IndexOptions::builder()
                        .name("assigned_lawyers_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ValuationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_requires_a_report_per_lawyer() {
        let mut valuation = ValuationDoc {
            form_id: "F1".into(),
            assigned_lawyers: vec!["L1".into(), "L2".into()],
            ..Default::default()
        };
        assert!(!valuation.is_complete());

        valuation.reports.push(ValuationReport {
            lawyer_id: "L1".into(),
            min_value: 100_000.0,
            max_value: 250_000.0,
            max_loan: 80_000.0,
            risk_score: "B".into(),
            report_link: None,
        });
        assert!(!valuation.is_complete());

        valuation.reports.push(ValuationReport {
            lawyer_id: "L2".into(),
            min_value: 120_000.0,
            max_value: 200_000.0,
            max_loan: 90_000.0,
            risk_score: "B+".into(),
            report_link: Some("ipfs://report".into()),
        });
        assert!(valuation.is_complete());
    }

    #[test]
    fn no_assigned_lawyers_is_never_complete() {
        let valuation = ValuationDoc::default();
        assert!(!valuation.is_complete());
    }
}
