//! Decoding of i3 "window" event payloads.
//!
//! Events arrive as JSON objects describing the affected container. The
//! only field this tool reads is `container.window`, the X11 id of the
//! window i3 just took over; everything else in the payload is ignored.

use serde_json::Value;

use crate::error::Error;

/// Extract the window id at the `container.window` path.
///
/// JSON numbers are 64-bit, so the id comes back as `i64`; callers truncate
/// to the native X11 width when talking to the server, which is safe
/// because real window ids fit in 32 bits.
pub fn window_id(payload: &[u8]) -> Result<i64, Error> {
    let root: Value = serde_json::from_slice(payload).map_err(Error::MalformedPayload)?;

    root.get("container")
        .and_then(|container| container.get("window"))
        .and_then(Value::as_i64)
        .ok_or(Error::WindowIdMissing)
}
