//! HTTP routes for IP valuation forms
//!
//! - GET  /ipValuation/getAllForms?address=   - owner's records
//! - GET  /ipValuation/getFormById?formId=    - single record lookup
//! - POST /ipValuation/submitForm             - upsert by formId
//! - POST /ipValuation/updateIPStatus         - validated lifecycle step

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{IpDoc, IpStatus, RegistrationStatus, IP_COLLECTION};
use crate::routes::{json_response, parse_json_body, parse_query, BoxBody, SuccessResponse};
use crate::server::AppState;
use crate::types::{IpsphereError, Result};

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormIdQuery {
    pub form_id: String,
}

/// Valuation form payload as submitted by the dashboard
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpForm {
    pub form_id: String,
    #[serde(default)]
    pub ip_number: Option<String>,
    #[serde(default)]
    pub ip_type: Option<String>,
    #[serde(default)]
    pub ip_name: Option<String>,
    #[serde(default)]
    pub ip_description: Option<String>,
    #[serde(default)]
    pub company_number: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub number_of_countries_serviced: Option<i64>,
    #[serde(default)]
    pub registered_regions: Option<Vec<String>>,
    #[serde(default)]
    pub registration_status: Option<RegistrationStatus>,
    #[serde(default)]
    pub registration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<IpStatus>,
}

impl IpForm {
    /// Build a new record from a first-time submission.
    ///
    /// New records enter the lifecycle at Draft (or Unprocessed when the
    /// form and fee were completed in one step); any other initial
    /// status is rejected so records cannot skip the valuation path.
    pub fn into_new_doc(self, address: &str) -> Result<IpDoc> {
        let ip_number = self
            .ip_number
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IpsphereError::Validation("formData.ipNumber is required".into()))?;
        let ip_type = self
            .ip_type
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IpsphereError::Validation("formData.ipType is required".into()))?;
        let company_number = self.company_number.filter(|s| !s.is_empty()).ok_or_else(|| {
            IpsphereError::Validation("formData.companyNumber is required".into())
        })?;

        let status = match self.status.unwrap_or_default() {
            s @ (IpStatus::Draft | IpStatus::Unprocessed) => s,
            other => {
                return Err(IpsphereError::Validation(format!(
                    "new records cannot start as '{}'",
                    other
                )))
            }
        };

        Ok(IpDoc {
            address: address.to_string(),
            form_id: self.form_id,
            ip_number,
            ip_type,
            ip_name: self.ip_name,
            ip_description: self.ip_description,
            company_number,
            company_name: self.company_name,
            number_of_countries_serviced: self.number_of_countries_serviced,
            registered_regions: self.registered_regions.unwrap_or_default(),
            registration_status: self.registration_status,
            registration_date: self.registration_date,
            status,
            nft_token_id: 0,
            ..Default::default()
        })
    }

    /// `$set` document for re-submission of an existing record.
    ///
    /// Only fields present in the form are touched; status changes go
    /// through updateIPStatus and are ignored here.
    pub fn update_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(v) = &self.ip_number {
            set.insert("ipNumber", v);
        }
        if let Some(v) = &self.ip_type {
            set.insert("ipType", v);
        }
        if let Some(v) = &self.ip_name {
            set.insert("ipName", v);
        }
        if let Some(v) = &self.ip_description {
            set.insert("ipDescription", v);
        }
        if let Some(v) = &self.company_number {
            set.insert("companyNumber", v);
        }
        if let Some(v) = &self.company_name {
            set.insert("companyName", v);
        }
        if let Some(v) = self.number_of_countries_serviced {
            set.insert("numberOfCountriesServiced", v);
        }
        if let Some(v) = &self.registered_regions {
            set.insert("registeredRegions", v.clone());
        }
        if let Some(v) = self.registration_status {
            // Enum serializes to its variant name
            set.insert("registrationStatus", format!("{:?}", v));
        }
        if let Some(v) = self.registration_date {
            set.insert("registrationDate", v.to_rfc3339());
        }
        set.insert("metadata.updated_at", bson::DateTime::now());
        set
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFormRequest {
    pub address: String,
    pub form_data: IpForm,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub address: String,
    pub form_id: String,
    pub updated_status: String,
}

#[derive(Debug, Serialize)]
pub struct FormByIdResponse {
    pub form: Vec<IpDoc>,
}

/// Validate a requested status change against the transition table.
///
/// Tokenized is reachable only through the tokenize endpoint, which
/// records the minted token id alongside the status.
pub fn validate_status_change(current: IpStatus, requested: &str) -> Result<IpStatus> {
    let next: IpStatus = requested
        .parse()
        .map_err(IpsphereError::Validation)?;

    if next == IpStatus::Tokenized {
        return Err(IpsphereError::Validation(
            "records become Tokenized via /ipTokenization/tokenizeIP".into(),
        ));
    }

    if !current.can_transition(next) {
        return Err(IpsphereError::Validation(format!(
            "illegal status transition {} -> {}",
            current, next
        )));
    }

    Ok(next)
}

/// GET /ipValuation/getAllForms?address=
pub async fn handle_get_all_forms(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: AddressQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let ips = mongo.collection::<IpDoc>(IP_COLLECTION).await?;
    let forms = ips.find_many(doc! { "address": &query.address }).await?;

    Ok(json_response(StatusCode::OK, &forms))
}

/// GET /ipValuation/getFormById?formId=
pub async fn handle_get_form_by_id(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: FormIdQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let ips = mongo.collection::<IpDoc>(IP_COLLECTION).await?;
    let form = ips.find_many(doc! { "formId": &query.form_id }).await?;

    Ok(json_response(StatusCode::OK, &FormByIdResponse { form }))
}

/// POST /ipValuation/submitForm
///
/// Upserts by formId: the second submission with the same id updates the
/// stored record instead of creating a duplicate.
pub async fn handle_submit_form(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: SubmitFormRequest = parse_json_body(req).await?;
    if body.address.is_empty() {
        return Err(IpsphereError::Validation("address is required".into()));
    }
    if body.form_data.form_id.is_empty() {
        return Err(IpsphereError::Validation(
            "formData.formId is required".into(),
        ));
    }

    let mongo = state.require_mongo()?;
    let ips = mongo.collection::<IpDoc>(IP_COLLECTION).await?;

    let form_id = body.form_data.form_id.clone();
    let existing = ips.find_one(doc! { "formId": &form_id }).await?;

    match existing {
        Some(current) => {
            if current.address != body.address {
                return Err(IpsphereError::Validation(
                    "form belongs to a different address".into(),
                ));
            }

            ips.update_one(
                doc! { "formId": &form_id },
                doc! { "$set": body.form_data.update_document() },
            )
            .await?;
            info!("Updated IP valuation form {}", form_id);
        }
        None => {
            let doc = body.form_data.into_new_doc(&body.address)?;
            ips.insert_one(doc).await?;
            info!("Created IP valuation form {}", form_id);
        }
    }

    Ok(json_response(
        StatusCode::CREATED,
        &SuccessResponse {
            success: true,
            message: format!("form {} saved", form_id),
        },
    ))
}

/// POST /ipValuation/updateIPStatus
pub async fn handle_update_ip_status(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: UpdateStatusRequest = parse_json_body(req).await?;

    let mongo = state.require_mongo()?;
    let ips = mongo.collection::<IpDoc>(IP_COLLECTION).await?;

    let current = ips
        .find_one(doc! { "formId": &body.form_id })
        .await?
        .ok_or_else(|| IpsphereError::NotFound(format!("no form with id {}", body.form_id)))?;

    if current.address != body.address {
        return Err(IpsphereError::Validation(
            "form belongs to a different address".into(),
        ));
    }

    let next = validate_status_change(current.status, &body.updated_status)?;

    ips.update_one(
        doc! { "formId": &body.form_id },
        doc! { "$set": {
            "status": next.to_string(),
            "metadata.updated_at": bson::DateTime::now(),
        }},
    )
    .await?;

    info!(
        "IP {} status {} -> {}",
        body.form_id, current.status, next
    );

    Ok(json_response(
        StatusCode::CREATED,
        &SuccessResponse {
            success: true,
            message: format!("status updated to {}", next),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(form_id: &str) -> IpForm {
        IpForm {
            form_id: form_id.to_string(),
            ip_number: Some("IP-1".into()),
            ip_type: Some("Patent".into()),
            ip_name: Some("Widget".into()),
            ip_description: None,
            company_number: Some("C-1".into()),
            company_name: None,
            number_of_countries_serviced: Some(3),
            registered_regions: Some(vec!["Europe".into()]),
            registration_status: Some(RegistrationStatus::Registered),
            registration_date: None,
            status: None,
        }
    }

    #[test]
    fn new_records_default_to_draft() {
        let doc = form("F1").into_new_doc("0xA").unwrap();
        assert_eq!(doc.status, IpStatus::Draft);
        assert_eq!(doc.nft_token_id, 0);
        assert_eq!(doc.address, "0xA");
        assert_eq!(doc.form_id, "F1");
    }

    #[test]
    fn new_records_may_start_unprocessed_but_nothing_later() {
        let mut f = form("F1");
        f.status = Some(IpStatus::Unprocessed);
        assert!(f.clone().into_new_doc("0xA").is_ok());

        f.status = Some(IpStatus::Valued);
        assert!(f.clone().into_new_doc("0xA").is_err());

        f.status = Some(IpStatus::Tokenized);
        assert!(f.into_new_doc("0xA").is_err());
    }

    #[test]
    fn new_records_require_core_identifiers() {
        let mut f = form("F1");
        f.ip_number = None;
        assert!(f.into_new_doc("0xA").is_err());

        let mut f = form("F1");
        f.ip_type = Some(String::new());
        assert!(f.into_new_doc("0xA").is_err());

        let mut f = form("F1");
        f.company_number = None;
        assert!(f.into_new_doc("0xA").is_err());
    }

    #[test]
    fn update_document_touches_only_submitted_fields() {
        let mut f = form("F1");
        f.ip_name = Some("Renamed".into());
        f.ip_description = None;
        f.registered_regions = None;

        let set = f.update_document();
        assert_eq!(set.get_str("ipName").unwrap(), "Renamed");
        assert!(!set.contains_key("ipDescription"));
        assert!(!set.contains_key("registeredRegions"));
        assert!(set.contains_key("metadata.updated_at"));
        // formId and status are never rewritten by re-submission
        assert!(!set.contains_key("formId"));
        assert!(!set.contains_key("status"));
    }

    #[test]
    fn status_change_follows_the_transition_table() {
        assert_eq!(
            validate_status_change(IpStatus::Draft, "Unprocessed").unwrap(),
            IpStatus::Unprocessed
        );
        assert_eq!(
            validate_status_change(IpStatus::Valuing, "Valued").unwrap(),
            IpStatus::Valued
        );
    }

    #[test]
    fn unknown_status_strings_are_rejected() {
        let err = validate_status_change(IpStatus::Draft, "Banana").unwrap_err();
        assert!(matches!(err, IpsphereError::Validation(_)));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert!(validate_status_change(IpStatus::Tokenized, "Draft").is_err());
        assert!(validate_status_change(IpStatus::Draft, "Valued").is_err());
        assert!(validate_status_change(IpStatus::Sold, "Loaned").is_err());
    }

    #[test]
    fn tokenized_is_not_reachable_through_status_updates() {
        let err = validate_status_change(IpStatus::Valued, "Tokenized").unwrap_err();
        assert!(matches!(err, IpsphereError::Validation(_)));
    }
}
