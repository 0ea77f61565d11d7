//! The wait loop: subscribe, spawn, then count window events.
//!
//! The loop owns the IPC socket and drives everything sequentially. What
//! happens per window beyond counting is injected through [`WindowGate`],
//! so the same control flow serves both the plain "count reparents" mode
//! and the X11-verified one.

use std::path::Path;

use crate::error::Error;
use crate::event;
use crate::ipc::IpcStream;
use crate::spawn;

/// Per-window actions the loop runs after decoding an event, before the
/// counter drops.
pub trait WindowGate {
    /// Called once per decoded window event.
    fn settle(&mut self, window_id: i64) -> Result<(), Error>;

    /// Called once on the success path, after the socket is shut down.
    fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Gate used when X11 integration is off: the loop just counts events.
pub struct NullGate;

impl WindowGate for NullGate {
    fn settle(&mut self, _window_id: i64) -> Result<(), Error> {
        Ok(())
    }
}

/// Subscribe to window events on the socket at `socket_path`, spawn `argv`,
/// and block until `count` windows have been seen and settled.
///
/// The subscription is acknowledged before the command is spawned, so no
/// window event can be missed. The spawned command is not waited on; it may
/// itself be a short-lived launcher whose windows outlive it.
pub fn run(
    socket_path: &Path,
    argv: &[String],
    count: u32,
    gate: &mut dyn WindowGate,
) -> Result<(), Error> {
    let mut stream = IpcStream::connect(socket_path)?;
    stream.subscribe_window_events()?;

    spawn::spawn_detached(argv)?;

    let mut remaining = count;
    while remaining > 0 {
        let message = stream.receive()?;
        let payload = message
            .payload
            .ok_or_else(|| Error::Protocol("window event with empty payload".into()))?;

        let window_id = event::window_id(&payload)?;
        gate.settle(window_id)?;

        remaining -= 1;
        log::info!("window 0x{:x} managed ({} to go)", window_id, remaining);
    }

    stream.shutdown()?;
    gate.finish()?;
    Ok(())
}
