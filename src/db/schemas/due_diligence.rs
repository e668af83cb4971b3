//! Due-diligence document schema
//!
//! Structured supplementary data collected per IP type to support
//! valuation. Every section is optional and every field free-form text;
//! the schema deliberately allows any combination of sections regardless
//! of the IP type, matching how the forms are filled in practice.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for due-diligence records
pub const DUE_DILIGENCE_COLLECTION: &str = "dueDiligence";

/// Owner company financials
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct OwnerFinancials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_twelve_month_revenue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_revenue_streams: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_of_operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_twelve_months_company_profit_margin_percentage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_competitors: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrademarkSpecific {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trademark_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opposition_history: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct BrandFactors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_awareness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_loyalty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_association: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_equity: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrademarkMarket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_share: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_preferences: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub economic_indicators: Option<String>,
}

/// Trademark due-diligence section
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TrademarkSection {
    #[serde(default)]
    pub specific: TrademarkSpecific,
    #[serde(default)]
    pub brand: BrandFactors,
    #[serde(default)]
    pub market: TrademarkMarket,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatentSpecific {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_claims: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_citations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infringement_history: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatentTechnology {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology_readiness_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_potential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_landscape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licensing_potential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rd_costs: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatentFinancial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_generated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub litigation_costs: Option<String>,
}

/// Patent due-diligence section
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PatentSection {
    #[serde(default)]
    pub specific: PatentSpecific,
    #[serde(default)]
    pub technology: PatentTechnology,
    #[serde(default)]
    pub financial: PatentFinancial,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CopyrightSpecific {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_of_copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivative_works: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CopyrightMarket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_trends: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_preferences: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_landscape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piracy_rates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_channels: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CopyrightFinancial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_revenue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub royalty_rates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub licensing_agreements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_costs: Option<String>,
}

/// Copyright due-diligence section
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CopyrightSection {
    #[serde(default)]
    pub specific: CopyrightSpecific,
    #[serde(default)]
    pub market: CopyrightMarket,
    #[serde(default)]
    pub financial: CopyrightFinancial,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

/// Due-diligence record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DueDiligenceDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Valuation form this record belongs to
    pub form_id: String,

    pub ip_number: String,

    #[serde(default)]
    pub owner: OwnerFinancials,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trademark: Option<TrademarkSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent: Option<PatentSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<CopyrightSection>,

    #[serde(default)]
    pub additional_details: AdditionalDetails,
}

impl IntoIndexes for DueDiligenceDoc {
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

impl MutMetadata for DueDiligenceDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_independent_of_ip_type() {
        // The schema intentionally allows a patent record to also carry
        // trademark data; nothing enforces section/type agreement.
        let record = DueDiligenceDoc {
            form_id: "F1".into(),
            ip_number: "IP-1".into(),
            trademark: Some(TrademarkSection::default()),
            patent: Some(PatentSection::default()),
            ..Default::default()
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("trademark").is_some());
        assert!(value.get("patent").is_some());
        assert!(value.get("copyright").is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let mut record = DueDiligenceDoc {
            form_id: "F2".into(),
            ip_number: "IP-2".into(),
            ..Default::default()
        };
        record.owner.last_twelve_month_revenue = Some("1200000".into());
        record.additional_details.legal_status = Some("Completed".into());

        let json = serde_json::to_string(&record).unwrap();
        let back: DueDiligenceDoc = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.owner.last_twelve_month_revenue.as_deref(),
            Some("1200000")
        );
        assert_eq!(
            back.additional_details.legal_status.as_deref(),
            Some("Completed")
        );
    }
}
