//! In-memory transport shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::rate_limit::{REMAINING_HEADER, RESET_HEADER};
use crate::transport::Transport;

/// Records every request and replays canned responses in order.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<HttpResponse>>,
}

impl RecordingTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::UnexpectedResponse("no canned response left".into()))
    }
}

pub fn ok_response() -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: "{}".to_string(),
    }
}

pub fn json_response(body: serde_json::Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    }
}

pub fn rate_limited_response(remaining: &str, reset: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: vec![
            (REMAINING_HEADER.to_string(), remaining.to_string()),
            (RESET_HEADER.to_string(), reset.to_string()),
        ],
        body: "{}".to_string(),
    }
}
