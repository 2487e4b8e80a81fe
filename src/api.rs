//! Request/response contract for the status and control endpoints
//!
//! Transport-agnostic: a server (or the CLI) maps `GET /api/status` to
//! [`status`] and `POST /api/control` to [`control`], then writes out the
//! returned code and JSON body.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::simulation::{ControlSurface, Lane, RunStatus, VehicleState};

pub const STATUS_PATH: &str = "/api/status";
pub const CONTROL_PATH: &str = "/api/control";

const INVALID_COMMAND: &str = "Invalid command";

/// A status code plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status_code: 400,
            body: json!({ "error": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Body of a status response
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusBody {
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub obstacle_detected: bool,
    pub status: RunStatus,
    pub lane: Lane,
}

impl From<VehicleState> for StatusBody {
    fn from(state: VehicleState) -> Self {
        Self {
            position: state.position.into(),
            velocity: state.velocity.into(),
            obstacle_detected: state.obstacle_detected,
            status: state.status,
            lane: state.lane,
        }
    }
}

/// Body of a control request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlRequest {
    #[serde(default)]
    pub command: Option<String>,
}

/// `GET /api/status`
pub fn status(control: &ControlSurface) -> ApiResponse {
    let body = StatusBody::from(control.status());
    ApiResponse::ok(json!(body))
}

/// `POST /api/control`
///
/// A body that is not a JSON object with a string `command` is treated the
/// same as an unknown command.
pub fn control(control: &ControlSurface, body: &str) -> ApiResponse {
    let request: ControlRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejecting malformed control body: {}", e);
            return ApiResponse::bad_request(INVALID_COMMAND);
        }
    };

    let command = request.command.unwrap_or_default();
    match control.execute(&command) {
        Ok(status) => ApiResponse::ok(json!({ "status": status })),
        Err(e) => {
            debug!("Rejecting control request: {}", e);
            ApiResponse::bad_request(INVALID_COMMAND)
        }
    }
}
