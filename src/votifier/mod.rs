//! Vote delivery to a server running a Votifier-compatible plugin.
//!
//! The default exchange is four steps: a 16 byte random challenge from us,
//! `ok` from the server, the RSA sealed vote, and a final `ok`. The sealed
//! vote is never written unless the first reply was `ok`.

use std::{net::SocketAddr, time::Duration};

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{
    config::VotifierHandshake,
    connection,
    error::{EncryptionError, Error},
    pinging::mc_modern::helpers::ProtocolError,
};

pub mod key;
pub mod vote;

pub use vote::{VoteRecord, VoteStatus, VotifierOutcome};

const CHALLENGE_LENGTH: usize = 16;
const ACK: &str = "ok";

pub struct VotifierSender {
    /// PEM or bare base64 key exactly as registered for the server.
    pub public_key: String,
    pub timeout: Duration,
    pub handshake: VotifierHandshake,
    pub max_ack_length: usize,
}

impl VotifierSender {
    /// Seals `vote` and delivers it to `addr`. Address policy is the caller's job.
    pub async fn send(
        &self,
        addr: SocketAddr,
        vote: &VoteRecord,
    ) -> Result<VotifierOutcome, Error> {
        // sealing happens before connecting so a bad key never opens a socket
        let ciphertext = seal_vote(&self.public_key, vote)?;
        debug!("sealed vote for {} ({} bytes)", vote.username, ciphertext.len());

        connection::with_deadline(addr, self.timeout, |mut stream| async move {
            self.exchange(&mut stream, &ciphertext).await
        })
        .await
    }

    /// Runs the handshake over an already connected stream.
    pub async fn exchange<S>(
        &self,
        stream: &mut S,
        ciphertext: &[u8],
    ) -> Result<VotifierOutcome, Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if self.handshake == VotifierHandshake::ChallengeAck {
            write(stream, &challenge()).await?;
            debug!("challenge sent");

            // anything but `ok` here means the port is not a Votifier listener
            let reply = self.read_ack(stream).await?;
            if reply.trim() != ACK {
                warn!("unexpected reply to challenge: {:?}", reply);
                return Err(ProtocolError::UnexpectedAck(reply).into());
            }
        }

        write(stream, ciphertext).await?;
        debug!("vote payload sent");

        let reply = self.read_ack(stream).await?;
        if reply.trim() == ACK {
            Ok(VotifierOutcome::ok())
        } else {
            warn!("server rejected vote: {:?}", reply);
            Ok(VotifierOutcome::rejected(reply))
        }
    }

    async fn read_ack<S>(&self, stream: &mut S) -> Result<String, Error>
    where
        S: AsyncRead + Unpin,
    {
        let reply = connection::read_chunk(stream, self.max_ack_length).await?;
        String::from_utf8(reply).map_err(|_| ProtocolError::InvalidUtf8.into())
    }
}

/// Parses the key and encrypts the JSON form of `vote` with it.
pub fn seal_vote(public_key: &str, vote: &VoteRecord) -> Result<Vec<u8>, EncryptionError> {
    let key = key::parse_public_key(public_key)?;
    let payload = vote.to_payload()?;
    key::seal(&key, &payload)
}

fn challenge() -> [u8; CHALLENGE_LENGTH] {
    rand::random()
}

async fn write<S>(stream: &mut S, data: &[u8]) -> Result<(), Error>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(data).await.map_err(Error::Connection)?;
    stream.flush().await.map_err(Error::Connection)
}
