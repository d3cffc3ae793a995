//! JSON request and response shapes for the handlers that wrap this crate.
//!
//! Each handler returns an HTTP status code with a JSON body. Validation
//! failures are 400; a server that is down or misbehaving is still a 200
//! with `status: "offline"` or `status: "error"`.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    config::ClientConfig,
    error::{Error, ValidationError},
    get_status,
    guard::ServerEndpoint,
    pinging::mc_modern::ping_json::StatusResult,
    send_vote,
    votifier::{VoteRecord, VoteStatus, VotifierOutcome},
};

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub server_address: String,
    pub server_port: u16,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub server_address: String,
    pub server_port: u16,
    pub public_key: String,
    /// base64 of the vote's JSON.
    pub encoded_vote: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_players: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

impl From<StatusResult> for StatusResponse {
    fn from(result: StatusResult) -> Self {
        if !result.online {
            return Self::offline();
        }
        Self {
            status: "online",
            ping: Some(result.latency_ms),
            version: result.version,
            motd: result.motd,
            current_players: Some(result.players_online),
            max_players: Some(result.players_max),
            favicon: result.favicon,
        }
    }
}

impl StatusResponse {
    pub fn offline() -> Self {
        Self {
            status: "offline",
            ping: None,
            version: None,
            motd: None,
            current_players: None,
            max_players: None,
            favicon: None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VoteResponse {
    pub status: VoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<VotifierOutcome> for VoteResponse {
    fn from(outcome: VotifierOutcome) -> Self {
        Self {
            status: outcome.status,
            error: outcome.detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub http_status: u16,
    pub body: Value,
}

impl Reply {
    fn ok(body: impl Serialize) -> Self {
        Self {
            http_status: 200,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }

    fn error(http_status: u16, err: &dyn std::fmt::Display) -> Self {
        Self {
            http_status,
            body: json!({ "error": err.to_string() }),
        }
    }
}

pub async fn handle_status(request: StatusRequest, config: &ClientConfig) -> Reply {
    let endpoint = ServerEndpoint::new(request.server_address, request.server_port);
    match get_status(&endpoint, config).await {
        Ok(result) => Reply::ok(StatusResponse::from(result)),
        Err(err @ Error::Validation(_)) => Reply::error(400, &err),
        Err(err @ Error::Encryption(_)) => Reply::error(500, &err),
        Err(err) => {
            warn!("{} is offline ({:?}): {}", endpoint, err.kind(), err);
            Reply::ok(StatusResponse::offline())
        }
    }
}

pub async fn handle_status_json(body: &str, config: &ClientConfig) -> Reply {
    match serde_json::from_str::<StatusRequest>(body) {
        Ok(request) => handle_status(request, config).await,
        Err(e) => Reply::error(400, &ValidationError::MalformedBody(e)),
    }
}

pub async fn handle_vote(request: VoteRequest, config: &ClientConfig) -> Reply {
    let vote = match decode_vote(&request.encoded_vote) {
        Ok(vote) => vote,
        Err(e) => return Reply::error(400, &e),
    };
    let endpoint = ServerEndpoint::new(request.server_address, request.server_port);

    match send_vote(&endpoint, &request.public_key, &vote, config).await {
        Ok(outcome) => Reply::ok(VoteResponse::from(outcome)),
        Err(err @ Error::Validation(_)) => Reply::error(400, &err),
        Err(err) => {
            warn!("vote to {} failed ({:?}): {}", endpoint, err.kind(), err);
            Reply::ok(VoteResponse {
                status: VoteStatus::Error,
                error: Some(err.to_string()),
            })
        }
    }
}

pub async fn handle_vote_json(body: &str, config: &ClientConfig) -> Reply {
    match serde_json::from_str::<VoteRequest>(body) {
        Ok(request) => handle_vote(request, config).await,
        Err(e) => Reply::error(400, &ValidationError::MalformedBody(e)),
    }
}

/// Decodes the base64 JSON vote carried by a vote request.
pub fn decode_vote(encoded: &str) -> Result<VoteRecord, ValidationError> {
    let raw = base64::decode(encoded.trim()).map_err(|e| ValidationError::InvalidField {
        field: "encodedVote",
        reason: e.to_string(),
    })?;
    serde_json::from_slice(&raw).map_err(|e| ValidationError::InvalidField {
        field: "encodedVote",
        reason: e.to_string(),
    })
}
