//! `mcwire` speaks two Minecraft-adjacent wire protocols to third party
//! servers: the Server List Ping status query, and Votifier vote delivery.
//!
//! Every call is self-contained: it checks the target address, opens its own
//! socket under a single deadline, and resolves to a value. Nothing is shared
//! between calls, so any number may run concurrently.
//!
//! The main API surface is [`get_status`] and [`send_vote`].

pub mod api;
pub mod config;
pub mod connection;
pub mod error;
pub mod guard;
pub mod pinging;
pub mod votifier;

pub use config::{ClientConfig, VotifierHandshake};
pub use error::{EncryptionError, Error, ErrorKind, ValidationError};
pub use guard::ServerEndpoint;
pub use pinging::{
    mc_modern::{helpers::ProtocolError, ping_json::StatusResult, ModernPinger},
    Pinger,
};
pub use votifier::{VoteRecord, VoteStatus, VotifierOutcome, VotifierSender};

/// Pings `endpoint` for its status.
///
/// A server that cannot be reached, times out, or answers with something
/// that is not a status response yields an error whose [`Error::kind`] tells
/// which; callers that only need a display value can fall back to
/// [`StatusResult::offline`].
pub async fn get_status(
    endpoint: &ServerEndpoint,
    config: &ClientConfig,
) -> Result<StatusResult, Error> {
    let addr = endpoint.resolve()?;

    let pinger = ModernPinger {
        protocol_version: config.protocol_version,
        hostname: endpoint.host.clone(),
        timeout: config.status_timeout(),
        max_status_length: config.max_status_length,
    };
    pinger.ping(addr).await
}

/// Seals `vote` with `public_key` and delivers it to `endpoint`.
///
/// `Ok` carries whatever the server answered, including a refusal; `Err` is
/// reserved for failures to get an answer at all.
pub async fn send_vote(
    endpoint: &ServerEndpoint,
    public_key: &str,
    vote: &VoteRecord,
    config: &ClientConfig,
) -> Result<VotifierOutcome, Error> {
    let addr = endpoint.resolve()?;

    let sender = VotifierSender {
        public_key: public_key.to_string(),
        timeout: config.vote_timeout(),
        handshake: config.votifier_handshake,
        max_ack_length: config.max_ack_length,
    };
    sender.send(addr, vote).await
}
