//! Command dispatcher: encodes outbound frames onto the open socket.
//!
//! Commands are fire-and-forget. Nothing is buffered while the socket is not
//! open; the caller gets `Ok(false)` and the frame is gone.

use frames::Outbound;

use crate::error::PresenceError;
use crate::transport::Transport;

/// Write `outbound` if a socket is open.
///
/// Returns `Ok(true)` when written and `Ok(false)` when dropped for lack of
/// an open socket.
///
/// # Errors
///
/// [`PresenceError::Protocol`] if the frame cannot be encoded, or the
/// transport's [`PresenceError::Socket`] if the write fails.
pub async fn dispatch<T>(transport: Option<&mut T>, outbound: &Outbound) -> Result<bool, PresenceError>
where
    T: Transport + ?Sized,
{
    let Some(transport) = transport else {
        tracing::debug!(kind = outbound.kind(), "socket not open; dropping command");
        return Ok(false);
    };
    let text = frames::encode_outbound(outbound).map_err(|error| PresenceError::Protocol(error.to_string()))?;
    transport.send(text).await?;
    tracing::trace!(kind = outbound.kind(), "command sent");
    Ok(true)
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
