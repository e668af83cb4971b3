//! HTTP routes for IPSphere
//!
//! Route handlers return `Result<Response, IpsphereError>`; the server
//! dispatch maps errors onto the taxonomy's HTTP statuses. Shared JSON
//! and body helpers live here.

pub mod auth;
pub mod due_diligence;
pub mod health;
pub mod legal;
pub mod messages;
pub mod tokenization;
pub mod valuation;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::types::{IpsphereError, Result};

pub use auth::{handle_onboard_user, handle_post_login};
pub use due_diligence::{handle_get_due_diligence, handle_submit_due_diligence};
pub use health::{health_check, readiness_check, version_info};
pub use legal::{handle_get_all_lawyers, handle_get_lawyers_by_specialization};
pub use messages::{
    handle_activity, handle_recent_activity, handle_send_message, handle_thread,
    handle_threads,
};
pub use tokenization::{handle_get_my_ips, handle_tokenize_ip};
pub use valuation::{
    handle_get_all_forms, handle_get_form_by_id, handle_submit_form, handle_update_ip_status,
};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Request bodies larger than this are rejected outright
const MAX_BODY_BYTES: usize = 65536;

/// Error body shape: stable code plus a human-readable message
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Generic success body for write endpoints with nothing else to say
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Serialize `body` as the JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Map an error onto its taxonomy status with a `{error, code}` body
pub fn error_response(err: &IpsphereError) -> Response<BoxBody> {
    json_response(
        err.status(),
        &ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().to_string()),
        },
    )
}

/// Read and deserialize a JSON request body
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T> {
    let body = req
        .collect()
        .await
        .map_err(|e| IpsphereError::Validation(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > MAX_BODY_BYTES {
        return Err(IpsphereError::Validation("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| IpsphereError::Validation(format!("Invalid JSON body: {}", e)))
}

/// Deserialize the query string into a typed struct
pub fn parse_query<T: DeserializeOwned>(req: &Request<hyper::body::Incoming>) -> Result<T> {
    let query = req.uri().query().unwrap_or("");
    serde_urlencoded::from_str(query)
        .map_err(|e| IpsphereError::Validation(format!("Invalid query string: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct AddressQuery {
        address: String,
    }

    #[test]
    fn query_strings_deserialize_into_typed_structs() {
        let parsed: AddressQuery = serde_urlencoded::from_str("address=0xAbC").unwrap();
        assert_eq!(parsed.address, "0xAbC");

        let missing: std::result::Result<AddressQuery, _> = serde_urlencoded::from_str("");
        assert!(missing.is_err());
    }
}
