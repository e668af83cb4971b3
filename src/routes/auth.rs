//! HTTP routes for login and onboarding
//!
//! - POST /postLoginFlow - create or refresh a user after wallet login
//! - POST /onboardUser   - merge onboarding profile + signed agreement
//!
//! postLoginFlow is called after every wallet login: a fresh address
//! creates the user and the dashboard pops the onboarding modal; a known
//! address only refreshes its last-login payload.

use bson::doc;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{PracticeType, UserDoc, USER_COLLECTION};
use crate::routes::{json_response, parse_json_body, BoxBody};
use crate::server::AppState;
use crate::types::{IpsphereError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostLoginRequest {
    pub address: String,
    #[serde(default)]
    pub user_info: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostLoginResponse {
    pub onboarded: bool,
    pub is_lawyer: bool,
    pub user_details: UserDoc,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    pub address: String,
    pub payload: OnboardingPayload,
    pub signed_message: String,
}

/// Profile fields collected by the onboarding modal
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingPayload {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_new_to_blockchain: bool,
    #[serde(default)]
    pub is_lawyer: bool,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub region_under_practice: Option<String>,
    #[serde(default)]
    pub practice_type: Option<PracticeType>,
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardResponse {
    pub onboarded: bool,
    pub is_lawyer: bool,
}

/// Build a fresh user document from the wallet provider's login payload
pub fn new_user_from_login(address: &str, user_info: &Value) -> Result<UserDoc> {
    let email = user_info
        .get("email")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IpsphereError::Validation("userInfo.email is required".into()))?;
    let name = user_info
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IpsphereError::Validation("userInfo.name is required".into()))?;

    Ok(UserDoc {
        address: address.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        profile_image: user_info
            .get("profileImage")
            .and_then(Value::as_str)
            .map(str::to_string),
        country: user_info
            .get("country")
            .and_then(Value::as_str)
            .map(str::to_string),
        is_new_to_blockchain: user_info
            .get("isNewToBlockchain")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        last_login_data: user_info.clone(),
        // Fresh signups have not completed KYC or onboarding
        is_kyc: false,
        ..Default::default()
    })
}

/// Merge the onboarding payload into an existing user.
///
/// Errors before touching the document, so a failed check leaves the
/// user exactly as fetched.
pub fn apply_onboarding(
    user: &mut UserDoc,
    payload: &OnboardingPayload,
    signed_message: &str,
) -> Result<()> {
    if user.email != payload.email {
        return Err(IpsphereError::Validation("Emails do not match".into()));
    }
    if signed_message.is_empty() {
        return Err(IpsphereError::Validation(
            "signedMessage is required".into(),
        ));
    }

    user.first_name = payload.first_name.clone();
    user.last_name = payload.last_name.clone();
    user.country = payload.country.clone();
    user.is_new_to_blockchain = payload.is_new_to_blockchain;
    user.signed_agreements.onboarding = Some(signed_message.to_string());

    user.is_lawyer = payload.is_lawyer;
    if payload.is_lawyer {
        user.specialization = payload.specialization.clone();
        user.region_under_practice = payload.region_under_practice.clone();
        user.practice_type = payload.practice_type;
        user.organization_id = payload.organization_id.clone();
    }

    Ok(())
}

/// POST /postLoginFlow
pub async fn handle_post_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: PostLoginRequest = parse_json_body(req).await?;
    if body.address.is_empty() {
        return Err(IpsphereError::Validation("address is required".into()));
    }

    let mongo = state.require_mongo()?;
    let users = mongo.collection::<UserDoc>(USER_COLLECTION).await?;

    let existing = users.find_one(doc! { "address": &body.address }).await?;

    match existing {
        Some(mut user) => {
            info!("Login: {}", body.address);

            users
                .update_one(
                    doc! { "address": &body.address },
                    doc! { "$set": {
                        "lastLoginData": bson::to_bson(&body.user_info)?,
                        "metadata.updated_at": bson::DateTime::now(),
                    }},
                )
                .await?;
            user.last_login_data = body.user_info;

            Ok(json_response(
                StatusCode::OK,
                &PostLoginResponse {
                    onboarded: user.is_onboarded(),
                    is_lawyer: user.is_lawyer,
                    user_details: user,
                },
            ))
        }
        None => {
            info!("Signup: {}", body.address);

            let user = new_user_from_login(&body.address, &body.user_info)?;
            users.insert_one(user.clone()).await?;

            Ok(json_response(
                StatusCode::OK,
                &PostLoginResponse {
                    onboarded: false,
                    is_lawyer: false,
                    user_details: user,
                },
            ))
        }
    }
}

/// POST /onboardUser
pub async fn handle_onboard_user(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let body: OnboardRequest = parse_json_body(req).await?;
    if body.address.is_empty() {
        return Err(IpsphereError::Validation("address is required".into()));
    }

    let mongo = state.require_mongo()?;
    let users = mongo.collection::<UserDoc>(USER_COLLECTION).await?;

    let mut user = users
        .find_one(doc! { "address": &body.address })
        .await?
        .ok_or_else(|| {
            IpsphereError::NotFound(format!("no user for address {}", body.address))
        })?;

    apply_onboarding(&mut user, &body.payload, &body.signed_message)?;
    user.metadata.updated_at = Some(bson::DateTime::now());

    let mut set = bson::to_document(&user)?;
    set.remove("_id");

    users
        .update_one(doc! { "address": &body.address }, doc! { "$set": set })
        .await?;

    info!("Onboarded user {}", body.address);

    Ok(json_response(
        StatusCode::OK,
        &OnboardResponse {
            onboarded: true,
            is_lawyer: user.is_lawyer,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn login_info() -> Value {
        json!({
            "email": "owner@example.com",
            "name": "Owner",
            "profileImage": "https://img.example.com/p.png",
            "country": "DE",
            "isNewToBlockchain": true,
        })
    }

    #[test]
    fn fresh_signup_starts_without_kyc_or_onboarding() {
        let user = new_user_from_login("0xA", &login_info()).unwrap();
        assert_eq!(user.address, "0xA");
        assert_eq!(user.email, "owner@example.com");
        assert!(!user.is_kyc);
        assert!(user.signed_agreements.onboarding.is_none());
        assert!(!user.is_onboarded());
        assert!(user.is_new_to_blockchain);
        assert_eq!(user.last_login_data, login_info());
    }

    #[test]
    fn signup_requires_email_and_name() {
        assert!(new_user_from_login("0xA", &json!({ "name": "X" })).is_err());
        assert!(new_user_from_login("0xA", &json!({ "email": "a@b.c" })).is_err());
        assert!(new_user_from_login("0xA", &json!({ "email": "", "name": "X" })).is_err());
    }

    fn onboarding_payload() -> OnboardingPayload {
        OnboardingPayload {
            email: "owner@example.com".into(),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            country: Some("UK".into()),
            is_new_to_blockchain: false,
            is_lawyer: false,
            specialization: None,
            region_under_practice: None,
            practice_type: None,
            organization_id: None,
        }
    }

    #[test]
    fn email_mismatch_leaves_the_user_untouched() {
        let mut user = new_user_from_login("0xA", &login_info()).unwrap();
        let before = serde_json::to_value(&user).unwrap();

        let mut payload = onboarding_payload();
        payload.email = "other@example.com".into();

        let err = apply_onboarding(&mut user, &payload, "0xsigned").unwrap_err();
        assert!(matches!(err, IpsphereError::Validation(_)));
        assert_eq!(serde_json::to_value(&user).unwrap(), before);
    }

    #[test]
    fn onboarding_records_the_signed_agreement() {
        let mut user = new_user_from_login("0xA", &login_info()).unwrap();
        apply_onboarding(&mut user, &onboarding_payload(), "0xsigned").unwrap();

        assert!(user.is_onboarded());
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert_eq!(
            user.signed_agreements.onboarding.as_deref(),
            Some("0xsigned")
        );
        assert!(!user.is_lawyer);
        assert!(user.specialization.is_none());
    }

    #[test]
    fn lawyer_onboarding_sets_practice_fields() {
        let mut user = new_user_from_login("0xA", &login_info()).unwrap();
        let mut payload = onboarding_payload();
        payload.is_lawyer = true;
        payload.specialization = Some("Patent".into());
        payload.practice_type = Some(PracticeType::Solo);
        payload.region_under_practice = Some("Europe".into());

        apply_onboarding(&mut user, &payload, "0xsigned").unwrap();

        assert!(user.is_lawyer);
        assert_eq!(user.specialization.as_deref(), Some("Patent"));
        assert_eq!(user.practice_type, Some(PracticeType::Solo));
    }

    #[test]
    fn empty_signature_is_rejected() {
        let mut user = new_user_from_login("0xA", &login_info()).unwrap();
        assert!(apply_onboarding(&mut user, &onboarding_payload(), "").is_err());
        assert!(!user.is_onboarded());
    }
}
