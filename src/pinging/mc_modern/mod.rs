use std::{
    io::Cursor,
    net::SocketAddr,
    time::{Duration, Instant},
};

use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use self::{
    helpers::{write_string, McModernValue, ProtocolError, VarInt},
    ping_json::{PingResponse, StatusResult},
};

use super::Pinger;
use crate::{connection, error::Error};

pub mod helpers;
pub mod ping_json;

/// Length-prefixed status request: packet id 0x00 with an empty body.
pub const STATUS_REQUEST: [u8; 2] = [0x01, 0x00];

const STATUS_NEXT_STATE: u32 = 1;

/// Status ping over the post-1.7 handshake.
pub struct ModernPinger {
    pub protocol_version: u32,
    pub hostname: String,
    pub timeout: Duration,
    pub max_status_length: usize,
}

impl Pinger for ModernPinger {
    type Data = StatusResult;

    type Error = Error;

    async fn ping(&self, addr: SocketAddr) -> Result<Self::Data, Self::Error> {
        connection::with_deadline(addr, self.timeout, |stream| {
            self.exchange(stream, addr.port())
        })
        .await
    }
}

impl ModernPinger {
    async fn exchange(&self, mut stream: TcpStream, port: u16) -> Result<StatusResult, Error> {
        let start = Instant::now();

        let mut request = build_handshake(&self.hostname, port, self.protocol_version)?;
        request.extend_from_slice(&STATUS_REQUEST);
        stream.write_all(&request).await.map_err(Error::Connection)?;
        debug!("handshake sent to {}:{}", self.hostname, port);

        let mut received = Vec::with_capacity(1024);
        let json = loop {
            if let Some(json) = try_read_status_frame(&received, self.max_status_length)? {
                break json;
            }
            let read = stream.read_buf(&mut received).await.map_err(Error::Connection)?;
            if read == 0 {
                return Err(ProtocolError::MalformedFrame("connection closed mid-frame").into());
            }
        };

        let latency_ms = u32::try_from(start.elapsed().as_millis()).unwrap_or(u32::MAX);
        let result = parse_status(&json, latency_ms)?;
        debug!(
            "{}:{} answered in {}ms ({}/{} players)",
            self.hostname, port, latency_ms, result.players_online, result.players_max
        );
        Ok(result)
    }
}

/// Builds the length-prefixed handshake packet asking for the status state.
pub fn build_handshake(
    hostname: &str,
    port: u16,
    protocol_version: u32,
) -> Result<Vec<u8>, ProtocolError> {
    let mut handshake_packet: Vec<u8> = vec![];

    VarInt(0x00).write_to(&mut handshake_packet)?;
    VarInt(protocol_version).write_to(&mut handshake_packet)?;
    write_string(hostname, &mut handshake_packet)?;
    // tokio's AsyncWriteExt is also in scope and implemented for Vec<u8>
    WriteBytesExt::write_u16::<BigEndian>(&mut handshake_packet, port)?;
    VarInt(STATUS_NEXT_STATE).write_to(&mut handshake_packet)?;

    let mut framed = VarInt(handshake_packet.len() as u32).encode();
    framed.append(&mut handshake_packet);
    Ok(framed)
}

/// Tries to pull one status response frame out of `buf`.
///
/// `Ok(None)` means the frame is not complete yet and more bytes are needed.
pub fn try_read_status_frame(
    buf: &[u8],
    max_length: usize,
) -> Result<Option<String>, ProtocolError> {
    let mut stream = Cursor::new(buf);
    let total_length = match VarInt::read_from(&mut stream) {
        Ok(length) => length.0,
        Err(e) if e.is_incomplete() => return Ok(None),
        Err(e) => return Err(e),
    };
    if total_length as usize > max_length {
        return Err(ProtocolError::FrameTooLarge(total_length, max_length));
    }

    let header_length = stream.position() as usize;
    let frame = match buf.get(header_length..header_length + total_length as usize) {
        Some(frame) => frame,
        None => return Ok(None),
    };

    let truncated = |e: ProtocolError| {
        if e.is_incomplete() {
            ProtocolError::MalformedFrame("packet header runs past the frame")
        } else {
            e
        }
    };
    let mut stream = Cursor::new(frame);
    let packet_id = VarInt::read_from(&mut stream).map_err(truncated)?.0;
    if packet_id != 0x00 {
        return Err(ProtocolError::WrongId(packet_id, 0x00));
    }
    let json_length = VarInt::read_from(&mut stream).map_err(truncated)?.0 as usize;
    let json_start = stream.position() as usize;
    let json = frame
        .get(json_start..json_start + json_length)
        .ok_or(ProtocolError::MalformedFrame("JSON length runs past the frame"))?;

    let json = std::str::from_utf8(json).map_err(|_| ProtocolError::InvalidUtf8)?;
    Ok(Some(json.to_owned()))
}

pub fn parse_status(json: &str, latency_ms: u32) -> Result<StatusResult, ProtocolError> {
    let data: PingResponse = serde_json::from_str(json)?;
    Ok(StatusResult::from_response(data, latency_ms))
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;
    use crate::error::ErrorKind;

    fn status_frame(json: &str) -> Vec<u8> {
        let mut body = VarInt(0x00).encode();
        write_string(json, &mut body).unwrap();
        let mut frame = VarInt(body.len() as u32).encode();
        frame.extend_from_slice(&body);
        frame
    }

    fn pinger(timeout: Duration) -> ModernPinger {
        ModernPinger {
            protocol_version: 0,
            hostname: "127.0.0.1".to_string(),
            timeout,
            max_status_length: 2 * 1024 * 1024,
        }
    }

    #[test]
    fn handshake_bytes() {
        let packet = build_handshake("example.com", 25565, 0).unwrap();
        assert_eq!(
            packet,
            [
                0x11, // length
                0x00, // packet id
                0x00, // protocol version
                0x0B, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'.', b'c', b'o', b'm',
                0x63, 0xDD, // port
                0x01, // next state
            ]
        );
    }

    #[test]
    fn frame_needs_every_byte() {
        let frame = status_frame(r#"{"description":"hi"}"#);
        for end in 0..frame.len() {
            assert!(
                try_read_status_frame(&frame[..end], 1024).unwrap().is_none(),
                "prefix {end}"
            );
        }
        assert_eq!(
            try_read_status_frame(&frame, 1024).unwrap().unwrap(),
            r#"{"description":"hi"}"#
        );
    }

    #[test]
    fn frame_rejections() {
        assert!(matches!(
            try_read_status_frame(&[0x03, 0x01, 0x01, b'x'], 1024),
            Err(ProtocolError::WrongId(1, 0))
        ));
        assert!(matches!(
            try_read_status_frame(&[0x03, 0x00, 0x05, b'x'], 1024),
            Err(ProtocolError::MalformedFrame(_))
        ));
        assert!(matches!(
            try_read_status_frame(&[0x04, 0x00, 0x02, 0xFF, 0xFE], 1024),
            Err(ProtocolError::InvalidUtf8)
        ));
        assert!(matches!(
            try_read_status_frame(&[0xFF, 0xFF, 0x7F], 1024),
            Err(ProtocolError::FrameTooLarge(_, 1024))
        ));
        assert!(matches!(
            try_read_status_frame(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01], usize::MAX),
            Err(ProtocolError::VarIntTooLong)
        ));
    }

    #[test]
    fn invalid_json_is_protocol_error() {
        assert!(matches!(
            parse_status("{not json", 0),
            Err(ProtocolError::JsonError(_))
        ));
    }

    #[tokio::test]
    async fn pings_fragmented_server() {
        let _ = env_logger::builder().is_test(true).try_init();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut expected = build_handshake("127.0.0.1", addr.port(), 0).unwrap();
            expected.extend_from_slice(&STATUS_REQUEST);
            let mut request = vec![0; expected.len()];
            socket.read_exact(&mut request).await.unwrap();
            assert_eq!(request, expected);

            let frame = status_frame(
                r#"{"version":{"name":"1.20.1"},"players":{"online":5,"max":20},"description":"Welcome"}"#,
            );
            let (head, tail) = frame.split_at(7);
            socket.write_all(head).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            socket.write_all(tail).await.unwrap();
        });

        let result = pinger(Duration::from_secs(2)).ping(addr).await.unwrap();
        server.await.unwrap();

        assert!(result.online);
        assert_eq!(result.players_online, 5);
        assert_eq!(result.players_max, 20);
        assert_eq!(result.version.as_deref(), Some("1.20.1"));
        assert_eq!(result.motd.as_deref(), Some("Welcome"));
        assert_eq!(result.favicon, None);
    }

    #[tokio::test]
    async fn silent_server_times_out_and_is_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut sink = vec![];
            // drains the handshake, then returns once the client hangs up
            tokio::time::timeout(Duration::from_secs(2), socket.read_to_end(&mut sink))
                .await
                .expect("client socket was not closed")
                .unwrap();
        });

        let start = Instant::now();
        let err = pinger(Duration::from_millis(200)).ping(addr).await.unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed <= Duration::from_millis(250), "took {elapsed:?}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn non_minecraft_service_is_protocol_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let handshake = build_handshake("127.0.0.1", addr.port(), 0).unwrap();
            let mut request = vec![0; handshake.len() + STATUS_REQUEST.len()];
            socket.read_exact(&mut request).await.unwrap();
            socket.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await.unwrap();
        });

        let err = pinger(Duration::from_secs(2)).ping(addr).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }
}
