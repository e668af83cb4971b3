//! HTTP routes for lawyer lookup
//!
//! - GET /legal/getAllLawyers
//! - GET /legal/getLawyersBySpecialization?specialization=
//!
//! Both return every matching lawyer.

use bson::doc;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::routes::{json_response, parse_query, BoxBody};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Deserialize)]
pub struct SpecializationQuery {
    pub specialization: String,
}

/// GET /legal/getAllLawyers
pub async fn handle_get_all_lawyers(
    _req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let mongo = state.require_mongo()?;
    let users = mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let lawyers = users.find_many(doc! { "isLawyer": true }).await?;

    Ok(json_response(StatusCode::OK, &lawyers))
}

/// GET /legal/getLawyersBySpecialization?specialization=
pub async fn handle_get_lawyers_by_specialization(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let query: SpecializationQuery = parse_query(&req)?;

    let mongo = state.require_mongo()?;
    let users = mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let lawyers = users
        .find_many(doc! {
            "isLawyer": true,
            "specialization": &query.specialization,
        })
        .await?;

    Ok(json_response(StatusCode::OK, &lawyers))
}
