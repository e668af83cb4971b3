//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One match arm per
//! route; handler errors funnel through `respond` so every failure maps
//! onto the error taxonomy exactly once.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::chain::IpRegistry;
use crate::config::Args;
use crate::db::MongoClient;
use crate::routes;
use crate::routes::BoxBody;
use crate::types::{IpsphereError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: Option<MongoClient>,
    /// Typed client for the HyDRAULIC registry; absent when unconfigured
    pub chain: Option<Arc<dyn IpRegistry>>,
    /// Process start, for uptime reporting
    pub started: Instant,
}

impl AppState {
    pub fn new(args: Args, mongo: Option<MongoClient>, chain: Option<Arc<dyn IpRegistry>>) -> Self {
        Self {
            args,
            mongo,
            chain,
            started: Instant::now(),
        }
    }

    /// MongoDB handle, or the 503 every data route returns without one
    pub fn require_mongo(&self) -> Result<&MongoClient> {
        self.mongo
            .as_ref()
            .ok_or_else(|| IpsphereError::Unavailable("Database not available".into()))
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listen = state.args.listen_addr();
    let listener = TcpListener::bind(listen).await?;

    info!("IPSphere listening on {}", listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - MongoDB and chain RPC are optional");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe - returns 200 if the service is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            to_boxed(routes::health_check(Arc::clone(&state)))
        }

        // Readiness probe - returns 200 only if MongoDB answers
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            to_boxed(routes::readiness_check(Arc::clone(&state)).await)
        }

        // Version info for deployment verification
        (Method::GET, "/version") => to_boxed(routes::version_info()),

        // CORS preflight
        (Method::OPTIONS, _) => to_boxed(preflight_response()),

        // ====================================================================
        // Signup & onboarding
        // ====================================================================
        (Method::POST, "/postLoginFlow") => {
            respond(routes::handle_post_login(req, Arc::clone(&state)).await)
        }
        (Method::POST, "/onboardUser") => {
            respond(routes::handle_onboard_user(req, Arc::clone(&state)).await)
        }

        // ====================================================================
        // IP valuation
        // ====================================================================
        (Method::GET, "/ipValuation/getAllForms") => {
            respond(routes::handle_get_all_forms(req, Arc::clone(&state)).await)
        }
        (Method::GET, "/ipValuation/getFormById") => {
            respond(routes::handle_get_form_by_id(req, Arc::clone(&state)).await)
        }
        (Method::POST, "/ipValuation/submitForm") => {
            respond(routes::handle_submit_form(req, Arc::clone(&state)).await)
        }
        (Method::POST, "/ipValuation/updateIPStatus") => {
            respond(routes::handle_update_ip_status(req, Arc::clone(&state)).await)
        }
        (Method::GET, "/ipValuation/getDueDiligence") => {
            respond(routes::handle_get_due_diligence(req, Arc::clone(&state)).await)
        }
        (Method::POST, "/ipValuation/submitDueDiligence") => {
            respond(routes::handle_submit_due_diligence(req, Arc::clone(&state)).await)
        }

        // ====================================================================
        // Legal
        // ====================================================================
        (Method::GET, "/legal/getAllLawyers") => {
            respond(routes::handle_get_all_lawyers(req, Arc::clone(&state)).await)
        }
        (Method::GET, "/legal/getLawyersBySpecialization") => {
            respond(routes::handle_get_lawyers_by_specialization(req, Arc::clone(&state)).await)
        }

        // ====================================================================
        // IP tokenization
        // ====================================================================
        (Method::GET, "/ipTokenization/getMyIPs") => {
            respond(routes::handle_get_my_ips(req, Arc::clone(&state)).await)
        }
        (Method::POST, "/ipTokenization/tokenizeIP") => {
            respond(routes::handle_tokenize_ip(req, Arc::clone(&state)).await)
        }

        // ====================================================================
        // Negotiation threads
        // ====================================================================
        (Method::POST, "/messages/send") => {
            respond(routes::handle_send_message(req, Arc::clone(&state)).await)
        }
        (Method::GET, "/messages/threads") => {
            respond(routes::handle_threads(req, Arc::clone(&state)).await)
        }
        (Method::GET, "/messages/thread") => {
            respond(routes::handle_thread(req, Arc::clone(&state)).await)
        }
        (Method::GET, "/messages/activity") => {
            respond(routes::handle_activity(req, Arc::clone(&state)).await)
        }
        (Method::GET, "/messages/recentActivity") => {
            respond(routes::handle_recent_activity(req, Arc::clone(&state)).await)
        }

        // Not found
        _ => to_boxed(not_found_response(&path)),
    };

    Ok(response)
}

/// Collapse a handler result into a response, logging server-side faults
fn respond(result: Result<Response<BoxBody>>) -> Response<BoxBody> {
    match result {
        Ok(response) => response,
        Err(err) => {
            if err.status().is_server_error() {
                error!("{}", err);
            } else {
                info!("request rejected: {}", err);
            }
            routes::error_response(&err)
        }
    }
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Max-Age", "86400")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
