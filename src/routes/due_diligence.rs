//! HTTP routes for due diligence
//!
//! - GET  /ipValuation/getDueDiligence?ipNumber= - records for an IP
//! - POST /ipValuation/submitDueDiligence        - upsert by formId

use bson::doc;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{DueDiligenceDoc, DUE_DILIGENCE_COLLECTION};
use crate::routes::{json_response, parse_json_body, parse_query, BoxBody, SuccessResponse};
use crate::server::AppState;
use crate::types::{IpsphereError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpNumberQuery {
    pub ip_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDueDiligenceRequest {
    pub form_data: DueDiligenceDoc,
}

/// GET /ipValuation/getDueDiligence?ipNumber=
pub async fn handle_get_due_diligence(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: IpNumberQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let records = mongo
        .collection::<DueDiligenceDoc>(DUE_DILIGENCE_COLLECTION)
        .await?;
    let forms = records
        .find_many(doc! { "ipNumber": &query.ip_number })
        .await?;

    Ok(json_response(StatusCode::OK, &forms))
}

/// POST /ipValuation/submitDueDiligence
pub async fn handle_submit_due_diligence(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: SubmitDueDiligenceRequest = parse_json_body(req).await?;
    let form = body.form_data;

    if form.form_id.is_empty() {
        return Err(IpsphereError::Validation(
            "formData.formId is required".into(),
        ));
    }
    if form.ip_number.is_empty() {
        return Err(IpsphereError::Validation(
            "formData.ipNumber is required".into(),
        ));
    }

    let mongo = state.require_mongo()?;
    let records = mongo
        .collection::<DueDiligenceDoc>(DUE_DILIGENCE_COLLECTION)
        .await?;

    let form_id = form.form_id.clone();
    let existing = records.find_one(doc! { "formId": &form_id }).await?;

    match existing {
        Some(_) => {
            // Replace the submitted fields; created_at stays with the
            // original insert.
            let mut set = bson::to_document(&form)?;
            set.remove("_id");
            set.remove("metadata");
            set.insert("metadata.updated_at", bson::DateTime::now());

            records
                .update_one(doc! { "formId": &form_id }, doc! { "$set": set })
                .await?;
            info!("Updated due diligence for form {}", form_id);
        }
        None => {
            records.insert_one(form).await?;
            info!("Created due diligence for form {}", form_id);
        }
    }

    Ok(json_response(
        StatusCode::CREATED,
        &SuccessResponse {
            success: true,
            message: format!("due diligence for {} saved", form_id),
        },
    ))
}
