use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bot::handlers::message::broadcast_order;
use crate::bot::messenger::{OutgoingMessage, Surface};
use crate::AppState;

pub mod payload;

use payload::{parse_payload, IntakeRequest, PayloadError, RelayEvent};

pub enum IntakeError {
    Payload(PayloadError),
    Internal(anyhow::Error),
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        match self {
            IntakeError::Payload(e) => {
                warn!("Rejected intake payload: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            IntakeError::Internal(e) => {
                error!("Intake failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/intake", post(intake))
        .with_state(state)
}

/// Serves the intake endpoint until `shutdown` fires.
pub async fn serve(state: AppState, addr: SocketAddr, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind intake listener on {}", addr))?;
    info!("Intake listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("intake server")?;
    info!("Intake server stopped");
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

pub async fn intake(
    State(state): State<AppState>,
    Json(event): Json<RelayEvent>,
) -> Result<StatusCode, IntakeError> {
    let request = parse_payload(&event.body).map_err(IntakeError::Payload)?;
    handle_request(&state, request)
        .await
        .map_err(IntakeError::Internal)?;
    Ok(StatusCode::OK)
}

async fn handle_request(state: &AppState, request: IntakeRequest) -> Result<()> {
    match request {
        IntakeRequest::DriverApplication { name, phone } => {
            state
                .messenger
                .send(
                    Surface::Driver,
                    state.config.applications_chat_id(),
                    OutgoingMessage::text(format!(
                        "New driver application\nPhone: {}\nName: {}",
                        phone, name
                    )),
                )
                .await
                .context("forward driver application")?;
            info!("Driver application forwarded");
            Ok(())
        }
        IntakeRequest::Order(draft) => {
            let order = state
                .stores
                .orders
                .order_create_from_intake(&draft)
                .await
                .context("order_create_from_intake")?;
            info!(order_id = order.id, "Intake order created");
            broadcast_order(state, &order).await
        }
    }
}
