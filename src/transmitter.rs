//! Broadcast transmitter for telemetry frames

use std::sync::Arc;

use tracing::{trace, warn};

use crate::link::{FLAG_BROADCAST, LinkLayer, LinkPacket};
use crate::types::TelemetryFrame;
use crate::{Result, TelemetryError, TransmitFailure};

/// Wraps encoded frames into link-layer broadcasts.
///
/// No retries: a failed frame is dropped and the next periodic tick sends
/// fresher state anyway.
pub struct Transmitter {
    link: Arc<dyn LinkLayer>,
}

impl Transmitter {
    pub fn new(link: Arc<dyn LinkLayer>) -> Self {
        Self { link }
    }

    /// Broadcast one frame.
    ///
    /// Buffers acquired before a failure are released before returning.
    pub async fn broadcast(&self, frame: &TelemetryFrame) -> Result<()> {
        let Some(mut payload) = self.link.allocate(frame.len()) else {
            warn!("Packet buffer full, dropping {} byte frame", frame.len());
            return Err(TelemetryError::transmit_failed(TransmitFailure::PayloadExhausted));
        };
        payload.as_mut_slice().copy_from_slice(frame.as_bytes());

        let Some(mut header) = self.link.allocate(1) else {
            warn!("No buffer for link header, releasing payload");
            return Err(TelemetryError::transmit_failed(TransmitFailure::HeaderExhausted));
        };
        header.as_mut_slice()[0] = FLAG_BROADCAST;

        if let Err(e) = self.link.send(LinkPacket { header, payload }).await {
            warn!("Unable to send frame: {}", e);
            return Err(TelemetryError::transmit_failed(TransmitFailure::LinkRejected));
        }

        trace!(len = frame.len(), "Frame broadcast");
        Ok(())
    }
}
