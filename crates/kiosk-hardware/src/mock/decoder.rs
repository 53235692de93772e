//! Mock QR decoder fed with payloads through a channel.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::{HardwareError, Result, traits::QrDecoder};

#[derive(Debug)]
enum DecoderEvent {
    Payload(String),
    Fault(String),
}

/// Mock QR decoder.
///
/// `try_decode` waits up to its timeout for the next payload shown through
/// the [`MockQrHandle`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use kiosk_hardware::mock::MockQrDecoder;
/// use kiosk_hardware::traits::QrDecoder;
///
/// #[tokio::main]
/// async fn main() -> kiosk_hardware::Result<()> {
///     let (mut decoder, handle) = MockQrDecoder::new();
///     handle.show("1;42-LaptopA");
///
///     let code = decoder.try_decode(Duration::from_millis(100)).await?;
///     assert_eq!(code.as_deref(), Some("1;42-LaptopA"));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockQrDecoder {
    event_rx: mpsc::UnboundedReceiver<DecoderEvent>,
}

impl MockQrDecoder {
    pub fn new() -> (Self, MockQrHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_rx }, MockQrHandle { event_tx })
    }
}

impl QrDecoder for MockQrDecoder {
    async fn try_decode(&mut self, timeout: Duration) -> Result<Option<String>> {
        match tokio::time::timeout(timeout, self.event_rx.recv()).await {
            Ok(Some(DecoderEvent::Payload(payload))) => Ok(Some(payload)),
            Ok(Some(DecoderEvent::Fault(message))) => Err(HardwareError::communication(message)),
            Ok(None) => {
                // Nobody can show codes anymore; behave like an empty scene.
                tokio::time::sleep(timeout).await;
                Ok(None)
            }
            Err(_) => Ok(None),
        }
    }
}

/// Handle for presenting codes to a [`MockQrDecoder`].
#[derive(Debug, Clone)]
pub struct MockQrHandle {
    event_tx: mpsc::UnboundedSender<DecoderEvent>,
}

impl MockQrHandle {
    /// Present a code in front of the camera.
    pub fn show(&self, payload: impl Into<String>) {
        let _ = self.event_tx.send(DecoderEvent::Payload(payload.into()));
    }

    /// Make the next decode attempt fail.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.event_tx.send(DecoderEvent::Fault(message.into()));
    }
}
