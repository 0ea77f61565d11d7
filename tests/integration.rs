//! Integration tests driving the built binary against a scripted i3 socket.
//!
//! No X server or real i3 is required: a mock Unix socket plays the window
//! manager's IPC side (subscription ack, window events) and the binary runs
//! with X11 integration off, which is its default mode.
//!
//! Run with: cargo test --test integration

use std::io::{Read, Write};
use std::os::unix::net::UnixListener;
use std::path::Path;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

use anyhow::{ensure, Context, Result};

const MAGIC: &[u8; 6] = b"i3-ipc";
const HEADER_LEN: usize = 14;
const MSG_TYPE_SUBSCRIBE: u32 = 2;
const EVENT_WINDOW: u32 = 0x8000_0003;

/// Frame a payload the way i3 does on the wire.
fn frame(msg_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
    buf.extend_from_slice(&msg_type.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf
}

fn subscribe_ack() -> Vec<u8> {
    frame(MSG_TYPE_SUBSCRIBE, br#"{"success":true}"#)
}

fn window_event(window_id: i64) -> Vec<u8> {
    frame(
        EVENT_WINDOW,
        format!(
            r#"{{"change":"new","container":{{"window":{}}}}}"#,
            window_id
        )
        .as_bytes(),
    )
}

/// Serve one scripted session: read and check the subscription request,
/// send `ack`, then each event, then hold the socket open until the client
/// shuts it down.
fn serve(listener: UnixListener, ack: Vec<u8>, events: Vec<Vec<u8>>) -> JoinHandle<Result<()>> {
    thread::spawn(move || {
        let (mut sock, _) = listener.accept().context("accept")?;

        let mut header = [0u8; HEADER_LEN];
        sock.read_exact(&mut header).context("subscribe header")?;
        ensure!(&header[..6] == MAGIC, "client sent bad magic");

        let len = u32::from_ne_bytes([header[6], header[7], header[8], header[9]]) as usize;
        let mut payload = vec![0u8; len];
        sock.read_exact(&mut payload).context("subscribe payload")?;
        ensure!(
            payload == br#"["window"]"#,
            "client subscribed to the wrong topic: {:?}",
            String::from_utf8_lossy(&payload)
        );

        sock.write_all(&ack).context("write ack")?;
        for event in &events {
            sock.write_all(event).context("write event")?;
        }

        let mut rest = Vec::new();
        let _ = sock.read_to_end(&mut rest);
        Ok(())
    })
}

/// Run the binary against `socket` with the given extra args.
fn run_tool(socket: &Path, args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_i3-spawn-wait"))
        .arg("--socket")
        .arg(socket)
        .args(args)
        .output()
        .context("run i3-spawn-wait")
}

fn socket_in(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("i3-ipc.sock")
}

#[test]
fn test_single_window_exits_zero() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket = socket_in(&dir);
    let listener = UnixListener::bind(&socket)?;
    let server = serve(listener, subscribe_ack(), vec![window_event(500)]);

    let output = run_tool(&socket, &["true"])?;
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    server.join().expect("server thread panicked")?;
    Ok(())
}

#[test]
fn test_waits_for_requested_window_count() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket = socket_in(&dir);
    let listener = UnixListener::bind(&socket)?;
    // Two events for two different windows; the waiter must consume both.
    let server = serve(
        listener,
        subscribe_ack(),
        vec![window_event(0x1a1), window_event(0x2b2)],
    );

    let output = run_tool(&socket, &["-n", "2", "sleep", "5"])?;
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    server.join().expect("server thread panicked")?;
    Ok(())
}

#[test]
fn test_wrong_length_ack_exits_one_without_spawning() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket = socket_in(&dir);
    let listener = UnixListener::bind(&socket)?;
    let server = serve(
        listener,
        frame(MSG_TYPE_SUBSCRIBE, br#"{"success":false}"#),
        vec![],
    );

    let marker = dir.path().join("spawned");
    let output = run_tool(
        &socket,
        &["touch", marker.to_str().context("marker path")?],
    )?;

    assert_eq!(output.status.code(), Some(1));
    assert!(
        !marker.exists(),
        "the command must not be spawned when the subscription fails"
    );

    server.join().expect("server thread panicked")?;
    Ok(())
}

#[test]
fn test_event_without_window_id_exits_one() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket = socket_in(&dir);
    let listener = UnixListener::bind(&socket)?;
    let server = serve(
        listener,
        subscribe_ack(),
        vec![frame(EVENT_WINDOW, br#"{"change":"new","container":{}}"#)],
    );

    let output = run_tool(&socket, &["true"])?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("window id"),
        "unexpected stderr: {}",
        stderr
    );

    server.join().expect("server thread panicked")?;
    Ok(())
}

#[test]
fn test_empty_event_payload_exits_one() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket = socket_in(&dir);
    let listener = UnixListener::bind(&socket)?;
    let server = serve(listener, subscribe_ack(), vec![frame(EVENT_WINDOW, b"")]);

    let output = run_tool(&socket, &["true"])?;
    assert_eq!(output.status.code(), Some(1));

    server.join().expect("server thread panicked")?;
    Ok(())
}

#[test]
fn test_missing_socket_exits_two() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket = socket_in(&dir);

    let output = run_tool(&socket, &["true"])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}

#[test]
fn test_zero_count_rejected_before_any_io() -> Result<()> {
    // No listener exists; if the binary tried to connect it would exit 2,
    // so exit 1 proves the argument check fired first.
    let dir = tempfile::tempdir()?;
    let socket = socket_in(&dir);

    let output = run_tool(&socket, &["-n", "0", "true"])?;
    assert_eq!(output.status.code(), Some(1));
    Ok(())
}

#[test]
fn test_negative_count_rejected_before_any_io() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let socket = socket_in(&dir);

    let output = run_tool(&socket, &["-n", "-3", "true"])?;
    assert_eq!(output.status.code(), Some(1));
    Ok(())
}

#[test]
fn test_no_command_is_a_usage_error() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_i3-spawn-wait"))
        .output()
        .context("run i3-spawn-wait")?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "unexpected stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_help_prints_usage_and_exits_zero() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_i3-spawn-wait"))
        .arg("--help")
        .output()
        .context("run i3-spawn-wait")?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "unexpected stdout: {}", stdout);
    Ok(())
}
