//! QR code worker.
//!
//! While scanning, asks the decoder for a code at a fixed cadence. A
//! well-formed laptop code moves the kiosk to `Success`; the worker then
//! submits the record update with no lock held, holds `Success` until
//! exactly `success_hold` after the transition and resets the kiosk. An
//! update still pending at the end of the hold is abandoned.

use std::sync::Arc;
use std::time::Duration;

use kiosk_core::LaptopTicket;
use kiosk_hardware::{AnyQrDecoder, QrDecoder};
use kiosk_network::{AnyRecordUpdater, RecordUpdate, RecordUpdater};
use tracing::{debug, info, warn};

use crate::activation::ActivationListener;
use crate::orchestrator::Orchestrator;
use crate::state_machine::Event;

pub struct CodeWorker {
    decoder: AnyQrDecoder,
    updater: AnyRecordUpdater,
    orchestrator: Arc<Orchestrator>,
    active: ActivationListener,
    decode_timeout: Duration,
    interval: Duration,
    success_hold: Duration,
}

impl CodeWorker {
    pub fn new(
        decoder: AnyQrDecoder,
        updater: AnyRecordUpdater,
        orchestrator: Arc<Orchestrator>,
        active: ActivationListener,
        config: &crate::ControllerConfig,
    ) -> Self {
        Self {
            decoder,
            updater,
            orchestrator,
            active,
            decode_timeout: config.decode_timeout,
            interval: config.code_interval,
            success_hold: config.success_hold,
        }
    }

    pub async fn run(mut self) {
        info!("Code worker started");

        while self.active.wait_active().await.is_ok() {
            match self.decoder.try_decode(self.decode_timeout).await {
                Ok(Some(raw)) => self.handle_code(&raw).await,
                Ok(None) => {}
                Err(e) => warn!(error = %e, "QR decode failed"),
            }
            tokio::time::sleep(self.interval).await;
        }

        info!("Code worker stopped");
    }

    async fn handle_code(&mut self, raw: &str) {
        let ticket = match LaptopTicket::parse(raw) {
            Ok(ticket) => ticket,
            Err(e) => {
                debug!(error = %e, "Ignoring code");
                return;
            }
        };

        let transition = match self.orchestrator.transition(Event::QrValid(ticket.clone())) {
            Ok(transition) => transition,
            Err(e) => {
                debug!(error = %e, "Code not accepted");
                return;
            }
        };
        info!(laptop_id = ticket.laptop_id, name = %ticket.name, "Laptop code accepted");

        let deadline = transition.timestamp + self.success_hold;
        match &transition.session {
            Some(session) => {
                let update = RecordUpdate::new(&ticket, session);
                match tokio::time::timeout_at(deadline, self.updater.submit(&update)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(error = %e, laptop_id = ticket.laptop_id, "Record update failed");
                    }
                    Err(_) => {
                        warn!(laptop_id = ticket.laptop_id, "Record update abandoned at end of success hold");
                    }
                }
            }
            None => warn!("Code accepted without a session, record not updated"),
        }

        tokio::time::sleep_until(deadline).await;
        if let Err(e) = self.orchestrator.reset().await {
            warn!(error = %e, "Reset failed");
        }
    }
}
