//! Request handlers. Device I/O is blocking, so every handler hands it to
//! Tokio's blocking pool.

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::ApiState;
use super::params::{ParamError, parse_power_params};
use crate::common::utils::format_duration;
use crate::device::{ColorState, Device, Power, TransitionError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    BadRequest(#[from] ParamError),

    #[error("unknown device \"{0}\"")]
    UnknownDevice(String),

    #[error(transparent)]
    Device(#[from] TransitionError),

    #[error("worker failed: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownDevice(_) => StatusCode::NOT_FOUND,
            ApiError::Device(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log_error!("HTTP {}: {self}", status.as_u16());
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// `GET|POST /{label}`: transition the device. Parameters come from the query
/// string, a form body, or both (the body wins).
pub async fn power(
    State(state): State<ApiState>,
    Path(label): Path<String>,
    Query(mut params): Query<HashMap<String, String>>,
    form: Option<Form<HashMap<String, String>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(Form(body)) = form {
        params.extend(body);
    }

    let device = lookup(&state, &label)?;
    let (target, duration) = parse_power_params(&params)?;

    let transition = Arc::clone(&state.transition);
    tokio::task::spawn_blocking(move || {
        transition.transition(device.as_ref(), target, duration)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let mut body = color_json(target);
    body["transition"] = json!(format_duration(duration));
    Ok(Json(body))
}

/// `GET /{label}/status`: current power and colour.
pub async fn status(
    State(state): State<ApiState>,
    Path(label): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let device = lookup(&state, &label)?;

    let transition = Arc::clone(&state.transition);
    let (power, color) = tokio::task::spawn_blocking(move || transition.status(device.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let mut body = color_json(color);
    body["power"] = json!(match power {
        Power::On => "on",
        Power::Off => "off",
    });
    Ok(Json(body))
}

fn lookup(state: &ApiState, label: &str) -> Result<Arc<dyn Device>, ApiError> {
    state
        .devices
        .get(label)
        .cloned()
        .ok_or_else(|| ApiError::UnknownDevice(label.to_string()))
}

fn color_json(color: ColorState) -> serde_json::Value {
    json!({
        "hue": round2(color.hue_degrees()),
        "saturation": round2(color.saturation_percent()),
        "brightness": round2(color.brightness_percent()),
        "kelvin": color.kelvin,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
