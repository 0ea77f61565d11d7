//! i3-ipc client: message framing, socket discovery, subscription.
//!
//! The wire format is i3's: a 6-byte magic tag, a native-endian u32 payload
//! length, a native-endian u32 message type, then exactly `length` payload
//! bytes. There is no padding anywhere in the header.

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;

/// The 6-byte tag that opens every i3-ipc message.
pub const MAGIC: &[u8; 6] = b"i3-ipc";

/// Header size on the wire: magic + length + type.
pub const HEADER_LEN: usize = 14;

/// Message type for SUBSCRIBE requests.
pub const MSG_TYPE_SUBSCRIBE: u32 = 2;

/// Subscription payload: the "window" topic is the only one we listen on.
pub const SUBSCRIBE_PAYLOAD: &[u8] = b"[\"window\"]";

/// Byte length of the acknowledgment payload i3 sends for a successful
/// subscription (`{"success":true}`).
pub const SUBSCRIBE_ACK_LEN: usize = 16;

/// One received i3-ipc message. A zero-length message carries no payload,
/// which is distinct from a present-but-empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpcMessage {
    pub msg_type: u32,
    pub payload: Option<Vec<u8>>,
}

/// Read one complete message, however the transport chunks the bytes.
///
/// Short reads are absorbed by `read_exact`; any transport failure is fatal.
/// A header that does not open with the magic tag means the stream is not
/// speaking i3-ipc, and no resynchronization is attempted.
pub fn read_message(reader: &mut impl Read) -> Result<IpcMessage, Error> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).map_err(Error::Transport)?;

    if &header[..6] != MAGIC {
        return Err(Error::Protocol(format!(
            "bad magic in message header: {:02x?}",
            &header[..6]
        )));
    }

    let len = u32::from_ne_bytes([header[6], header[7], header[8], header[9]]) as usize;
    let msg_type = u32::from_ne_bytes([header[10], header[11], header[12], header[13]]);

    if len == 0 {
        log::debug!("received message type {:#x} with no payload", msg_type);
        return Ok(IpcMessage {
            msg_type,
            payload: None,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).map_err(Error::Transport)?;
    log::debug!(
        "received message type {:#x} with {} payload bytes",
        msg_type,
        len
    );

    Ok(IpcMessage {
        msg_type,
        payload: Some(payload),
    })
}

/// Frame and write one message.
pub fn write_message(
    writer: &mut impl Write,
    msg_type: u32,
    payload: &[u8],
) -> Result<(), Error> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    buf.extend_from_slice(&msg_type.to_ne_bytes());
    buf.extend_from_slice(payload);
    writer.write_all(&buf).map_err(Error::Transport)?;
    writer.flush().map_err(Error::Transport)?;
    Ok(())
}

/// Ask i3 where its IPC socket lives.
///
/// Runs `i3 --get-socketpath` through the shell and reads one line of
/// output, trailing newline stripped. Empty output (i3 not running, or not
/// installed) is fatal.
pub fn discover_socket_path() -> Result<PathBuf, Error> {
    let output = Command::new("/bin/sh")
        .args(["-c", "i3 --get-socketpath"])
        .output()
        .map_err(|e| Error::SocketPath(format!("failed to run i3: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let path = stdout.lines().next().unwrap_or("").trim_end();
    if path.is_empty() {
        return Err(Error::SocketPath(
            "i3 --get-socketpath printed nothing".into(),
        ));
    }

    log::debug!("i3 socket at {}", path);
    Ok(PathBuf::from(path))
}

/// Connected i3-ipc client.
pub struct IpcStream {
    stream: UnixStream,
}

impl IpcStream {
    /// Connect to the i3 socket at `path`.
    pub fn connect(path: &Path) -> Result<Self, Error> {
        let stream = UnixStream::connect(path).map_err(Error::Transport)?;
        log::debug!("connected to i3 socket at {:?}", path);
        Ok(Self { stream })
    }

    /// Subscribe to "window" events.
    ///
    /// i3 acknowledges with a fixed `{"success":true}` payload; a reply of
    /// any other length is a protocol mismatch. The check is shape-only,
    /// byte-compatible with what i3 actually sends.
    pub fn subscribe_window_events(&mut self) -> Result<(), Error> {
        write_message(&mut self.stream, MSG_TYPE_SUBSCRIBE, SUBSCRIBE_PAYLOAD)?;

        let reply = read_message(&mut self.stream)?;
        let ack_len = reply.payload.as_ref().map_or(0, Vec::len);
        if ack_len != SUBSCRIBE_ACK_LEN {
            return Err(Error::Protocol(format!(
                "subscription ack has {} payload bytes, expected {}",
                ack_len, SUBSCRIBE_ACK_LEN
            )));
        }

        log::debug!("subscribed to window events");
        Ok(())
    }

    /// Receive the next message, blocking until it is complete.
    pub fn receive(&mut self) -> Result<IpcMessage, Error> {
        read_message(&mut self.stream)
    }

    /// Shut the connection down in both directions.
    pub fn shutdown(&self) -> Result<(), Error> {
        self.stream
            .shutdown(Shutdown::Both)
            .map_err(Error::Transport)
    }
}
