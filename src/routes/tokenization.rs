//! HTTP routes for tokenization
//!
//! - GET  /ipTokenization/getMyIPs?address= - Tokenized and Valued records
//! - POST /ipTokenization/tokenizeIP        - mint a Valued record on-chain
//!
//! Tokenizing is the only path into the Tokenized status: the registry
//! call and the mint must both confirm before the record is updated, and
//! the minted token id lands in the same update as the status.

use bson::doc;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::chain::TxReceipt;
use crate::db::schemas::{IpDoc, IpStatus, IP_COLLECTION};
use crate::routes::{json_response, parse_json_body, parse_query, BoxBody};
use crate::server::AppState;
use crate::types::{IpsphereError, Result};

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeRequest {
    pub address: String,
    pub form_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeResponse {
    pub form_id: String,
    pub nft_token_id: i64,
    pub tokenize_receipt: TxReceipt,
    pub mint_receipt: TxReceipt,
}

/// Check that `caller` may tokenize this record right now
pub fn ensure_tokenizable(record: &IpDoc, caller: &str) -> Result<()> {
    if record.address != caller {
        return Err(IpsphereError::Validation(
            "form belongs to a different address".into(),
        ));
    }
    if record.status != IpStatus::Valued {
        return Err(IpsphereError::Validation(format!(
            "only Valued records can be tokenized, not {}",
            record.status
        )));
    }
    Ok(())
}

/// GET /ipTokenization/getMyIPs?address=
///
/// The union of Tokenized and Valued records for the address; drafts and
/// in-flight valuations are excluded.
pub async fn handle_get_my_ips(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: AddressQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let ips = mongo.collection::<IpDoc>(IP_COLLECTION).await?;
    let forms = ips
        .find_many(doc! {
            "address": &query.address,
            "status": { "$in": ["Tokenized", "Valued"] },
        })
        .await?;

    Ok(json_response(StatusCode::OK, &forms))
}

/// POST /ipTokenization/tokenizeIP
pub async fn handle_tokenize_ip(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: TokenizeRequest = parse_json_body(req).await?;

    let mongo = state.require_mongo()?;
    let ips = mongo.collection::<IpDoc>(IP_COLLECTION).await?;

    let record = ips
        .find_one(doc! { "formId": &body.form_id })
        .await?
        .ok_or_else(|| IpsphereError::NotFound(format!("no form with id {}", body.form_id)))?;

    ensure_tokenizable(&record, &body.address)?;

    let registry = state.chain.as_ref().ok_or_else(|| {
        IpsphereError::Unavailable("chain registry is not configured".into())
    })?;

    // Both chain calls confirm before anything is persisted; a failure
    // leaves the record Valued.
    let tokenize_receipt = registry.tokenize_ip(&record.ip_number).await?;
    if !tokenize_receipt.success {
        warn!(
            "tokenizeIP reverted for {} in {}",
            record.ip_number, tokenize_receipt.transaction_hash
        );
        return Err(IpsphereError::Chain(format!(
            "tokenizeIP reverted in {}",
            tokenize_receipt.transaction_hash
        )));
    }

    let mint = registry.mint_ip(&record.ip_number).await?;

    ips.update_one(
        doc! { "formId": &body.form_id },
        doc! { "$set": {
            "status": IpStatus::Tokenized.to_string(),
            "nftTokenId": mint.token_id,
            "metadata.updated_at": bson::DateTime::now(),
        }},
    )
    .await?;

    info!(
        "Tokenized {} as token {} (tx {})",
        body.form_id, mint.token_id, mint.receipt.transaction_hash
    );

    Ok(json_response(
        StatusCode::OK,
        &TokenizeResponse {
            form_id: body.form_id,
            nft_token_id: mint.token_id,
            tokenize_receipt,
            mint_receipt: mint.receipt,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: IpStatus) -> IpDoc {
        IpDoc {
            address: "0xA".into(),
            form_id: "F1".into(),
            ip_number: "IP-1".into(),
            ip_type: "Patent".into(),
            company_number: "C-1".into(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn only_the_owner_tokenizes() {
        let rec = record(IpStatus::Valued);
        assert!(ensure_tokenizable(&rec, "0xA").is_ok());
        assert!(ensure_tokenizable(&rec, "0xB").is_err());
    }

    #[test]
    fn only_valued_records_tokenize() {
        for status in [
            IpStatus::Draft,
            IpStatus::Unprocessed,
            IpStatus::Rejected,
            IpStatus::Valuing,
            IpStatus::Tokenized,
            IpStatus::Sold,
        ] {
            assert!(
                ensure_tokenizable(&record(status), "0xA").is_err(),
                "{:?} must not tokenize",
                status
            );
        }
        assert!(ensure_tokenizable(&record(IpStatus::Valued), "0xA").is_ok());
    }
}
