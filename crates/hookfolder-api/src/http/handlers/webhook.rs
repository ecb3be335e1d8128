//! Webhook receiver handler.
//!
//! Converts the axum request into an [`InboundRequest`] and hands it to the
//! pipeline. The body is taken as raw [`Bytes`] so the signature is checked
//! over exactly what GitHub sent. Responses are plain text.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use hookfolder_core::pipeline::InboundRequest;
use hookfolder_types::webhook::{WebhookHeaders, DELIVERY_HEADER, EVENT_HEADER};

use crate::state::AppState;

/// POST /webhook (and POST /) - receive one GitHub delivery.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let algorithm = state.pipeline.classifier().algorithm();

    let request = InboundRequest {
        headers: WebhookHeaders::new(
            header_value(header::CONTENT_TYPE.as_str()),
            header_value(algorithm.header_name()),
            header_value(EVENT_HEADER),
            header_value(DELIVERY_HEADER),
        ),
        body: body.to_vec(),
    };

    let response = state.pipeline.handle(&request);
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, response.body).into_response()
}
