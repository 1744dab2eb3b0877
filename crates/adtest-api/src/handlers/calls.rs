//! Voice call handlers.
//!
//! Custom calls take any subset of the call target and fill the rest from
//! the configured default target. The preset endpoints dial the default
//! target, optionally with a different assistant.

use adtest_models::{CallRequest, CallResponse, CallStatusResponse, CallTarget, PresetCallResponse};
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const SERVICE_NAME: &str = "Vapi Call API";
const SERVICE_VERSION: &str = "1.0.0";

/// GET /vapi/
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "endpoints": {
            "create_default_call": "/vapi/calls",
            "create_custom_call": "/vapi/calls/create",
            "create_male_voice_call": "/vapi/calls/male",
            "create_female_voice_call": "/vapi/calls/female",
            "create_simple_call": "/vapi/calls/simple",
            "call_status": "/vapi/calls/{call_id}/status",
            "health": "/vapi/health",
        },
    }))
}

/// GET /vapi/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
    }))
}

/// Request fields over the configured default target.
fn resolve_target(request: CallRequest, default: &CallTarget) -> CallTarget {
    CallTarget {
        assistant_id: request.assistant_id.unwrap_or_else(|| default.assistant_id.clone()),
        phone_number_id: request
            .phone_number_id
            .unwrap_or_else(|| default.phone_number_id.clone()),
        customer_number: request
            .customer_number
            .unwrap_or_else(|| default.customer_number.clone()),
    }
}

/// POST /vapi/calls/create
pub async fn create_call(
    State(state): State<AppState>,
    Json(request): Json<CallRequest>,
) -> ApiResult<Json<CallResponse>> {
    request.validate()?;

    let customer_name = request.customer_name.clone();
    let target = resolve_target(request, &state.calls.default_target);
    info!(customer_number = %target.customer_number, "Creating call");

    let call_id = state.caller.create_call(&target, customer_name.as_deref()).await?;

    Ok(Json(CallResponse {
        call_id,
        status: "created".to_string(),
        message: format!("Call created successfully to {}", target.customer_number),
    }))
}

async fn place_preset(
    state: &AppState,
    target: CallTarget,
    message: &str,
    voice_type: Option<&str>,
) -> ApiResult<Json<PresetCallResponse>> {
    info!(assistant_id = %target.assistant_id, voice_type, "Creating preset call");
    let call_id = state.caller.create_call(&target, None).await?;

    Ok(Json(PresetCallResponse {
        call_id,
        status: "created".to_string(),
        message: message.to_string(),
        voice_type: voice_type.map(str::to_string),
        details: target,
    }))
}

/// POST /vapi/calls
pub async fn create_default_call(
    State(state): State<AppState>,
) -> ApiResult<Json<PresetCallResponse>> {
    let target = state.calls.default_target.clone();
    place_preset(&state, target, "Call created successfully with default values", None).await
}

/// POST /vapi/calls/simple
pub async fn create_simple_call(
    State(state): State<AppState>,
) -> ApiResult<Json<PresetCallResponse>> {
    let target = state.calls.default_target.clone();
    place_preset(&state, target, "Simple call created successfully", None).await
}

/// POST /vapi/calls/male
pub async fn create_male_call(
    State(state): State<AppState>,
) -> ApiResult<Json<PresetCallResponse>> {
    let assistant_id = state
        .calls
        .male_assistant_id
        .as_deref()
        .ok_or_else(|| ApiError::not_configured("VAPI_MALE_ASSISTANT_ID"))?;
    let target = state.calls.with_assistant(assistant_id);
    place_preset(&state, target, "Male voice call created successfully", Some("male")).await
}

/// POST /vapi/calls/female
pub async fn create_female_call(
    State(state): State<AppState>,
) -> ApiResult<Json<PresetCallResponse>> {
    let assistant_id = state
        .calls
        .female_assistant_id
        .as_deref()
        .ok_or_else(|| ApiError::not_configured("VAPI_FEMALE_ASSISTANT_ID"))?;
    let target = state.calls.with_assistant(assistant_id);
    place_preset(&state, target, "Female voice call created successfully", Some("female")).await
}

/// GET /vapi/calls/{call_id}/status
pub async fn call_status(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> ApiResult<Json<CallStatusResponse>> {
    let call = state.caller.get_call(&call_id).await?;
    info!(
        call_id = %call_id,
        status = %call.status,
        ended = call.call_status().is_terminal(),
        "Fetched call status"
    );

    Ok(Json(CallStatusResponse {
        call_id,
        status: call.status,
        details: Some(call.raw),
    }))
}
