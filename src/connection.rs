//! Socket lifetime shared by both clients.
//!
//! A connection is opened inside a single deadline that covers connect, every
//! write, and every read. The stream is moved into the exchange, so it is
//! dropped (and the socket closed) exactly once: when the exchange returns, or
//! when the deadline fires and the whole future is dropped.

use std::{future::Future, net::SocketAddr, time::Duration};

use log::{debug, warn};
use tokio::{io::AsyncReadExt, net::TcpStream};

use crate::error::Error;

/// Runs `exchange` against a fresh connection to `addr`, bounded by `deadline`.
pub async fn with_deadline<T, F, Fut>(
    addr: SocketAddr,
    deadline: Duration,
    exchange: F,
) -> Result<T, Error>
where
    F: FnOnce(TcpStream) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let operation = async {
        let stream = TcpStream::connect(addr).await.map_err(Error::Connection)?;
        debug!("connected to {}", addr);
        stream.set_nodelay(true).map_err(Error::Connection)?;
        exchange(stream).await
    };

    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} did not finish within {:?}", addr, deadline);
            Err(Error::Timeout(deadline))
        }
    }
}

/// Reads whatever the peer sends next, up to `limit` bytes.
///
/// A peer that closes before sending anything is a connection error.
pub async fn read_chunk<S>(stream: &mut S, limit: usize) -> Result<Vec<u8>, Error>
where
    S: tokio::io::AsyncRead + Unpin,
{
    let mut buf = vec![0; limit];
    let read = stream.read(&mut buf).await.map_err(Error::Connection)?;
    if read == 0 {
        return Err(Error::Connection(std::io::Error::from(
            std::io::ErrorKind::UnexpectedEof,
        )));
    }
    buf.truncate(read);
    Ok(buf)
}
