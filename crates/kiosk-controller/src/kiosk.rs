//! Kiosk runner: wires devices to workers and supervises their tasks.
//!
//! # Lifecycle
//!
//! 1. Build [`KioskDevices`] (mocks, or real drivers when available)
//! 2. [`Kiosk::start`] verifies the fingerprint sensor and spawns the workers
//! 3. Hand [`Kiosk::orchestrator`] to the HTTP layer
//! 4. [`Kiosk::shutdown`] aborts the workers and reports how they ended
//!
//! # Examples
//!
//! ```no_run
//! use kiosk_controller::{ControllerConfig, Kiosk, KioskDevices};
//!
//! # async fn example() -> kiosk_core::Result<()> {
//! let (devices, _handles) = KioskDevices::mock();
//! let kiosk = Kiosk::start(ControllerConfig::default(), devices).await?;
//!
//! println!("state: {}", kiosk.orchestrator().state());
//!
//! kiosk.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use kiosk_core::{Error, Result};
use kiosk_hardware::mock::{
    MockCamera, MockCameraHandle, MockFingerprintHandle, MockFingerprintSensor, MockQrDecoder,
    MockQrHandle,
};
use kiosk_hardware::{AnyCamera, AnyFingerprintSensor, AnyQrDecoder, CameraDevice, FingerprintSensor};
use kiosk_network::{AnyRecordUpdater, MockRecordHandle, MockRecordUpdater};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::ControllerConfig;
use crate::frame_cache::FrameCache;
use crate::notifier::EventNotifier;
use crate::orchestrator::Orchestrator;
use crate::workers::{BiometricWorker, CaptureWorker, CodeWorker};

/// The collaborators a kiosk drives.
#[derive(Debug)]
pub struct KioskDevices {
    pub sensor: AnyFingerprintSensor,
    pub camera: AnyCamera,
    pub decoder: AnyQrDecoder,
    pub updater: AnyRecordUpdater,
}

/// Control handles for a fully mocked kiosk.
#[derive(Debug)]
pub struct MockHandles {
    pub sensor: MockFingerprintHandle,
    pub camera: MockCameraHandle,
    pub qr: MockQrHandle,
    pub records: MockRecordHandle,
}

impl KioskDevices {
    /// Mock devices throughout, plus the handles that drive them.
    pub fn mock() -> (Self, MockHandles) {
        let (sensor, sensor_handle) = MockFingerprintSensor::new();
        let (camera, camera_handle) = MockCamera::new();
        let (decoder, qr_handle) = MockQrDecoder::new();
        let (updater, records_handle) = MockRecordUpdater::new();

        (
            Self {
                sensor: AnyFingerprintSensor::Mock(sensor),
                camera: AnyCamera::Mock(camera),
                decoder: AnyQrDecoder::Mock(decoder),
                updater: AnyRecordUpdater::Mock(updater),
            },
            MockHandles {
                sensor: sensor_handle,
                camera: camera_handle,
                qr: qr_handle,
                records: records_handle,
            },
        )
    }
}

/// How a worker task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    /// Worker loop returned on its own.
    Finished,
    /// Aborted during shutdown.
    Cancelled,
    Panic,
}

/// A running kiosk.
#[derive(Debug)]
pub struct Kiosk {
    orchestrator: Arc<Orchestrator>,
    tasks: JoinSet<&'static str>,
}

impl Kiosk {
    /// Verify the sensor and spawn all workers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SensorFault`] if the fingerprint sensor does not
    /// answer the handshake. The kiosk cannot operate without it.
    pub async fn start(config: ControllerConfig, mut devices: KioskDevices) -> Result<Self> {
        devices
            .sensor
            .verify()
            .await
            .map_err(|e| Error::SensorFault(e.to_string()))?;

        if let Ok(info) = devices.sensor.get_info().await {
            info!(name = %info.name, model = %info.model, firmware = ?info.firmware_version, "Fingerprint sensor ready");
        }
        if let Ok(info) = devices.camera.get_info().await {
            info!(name = %info.name, model = %info.model, "Camera ready");
        }

        let frames = Arc::new(FrameCache::new(config.frame_put_timeout));
        let (orchestrator, links) =
            Orchestrator::new(Arc::clone(&frames), EventNotifier::new(config.push_capacity));
        let orchestrator = Arc::new(orchestrator);

        let mut tasks = JoinSet::new();

        let biometric = BiometricWorker::new(
            devices.sensor,
            Arc::clone(&orchestrator),
            links.activations.biometric,
            links.enroll_jobs,
            &config,
        );
        tasks.spawn(async move {
            biometric.run().await;
            "biometric"
        });

        let capture = CaptureWorker::new(devices.camera, frames, links.activations.capture, &config);
        tasks.spawn(async move {
            capture.run().await;
            "capture"
        });

        let code = CodeWorker::new(
            devices.decoder,
            devices.updater,
            Arc::clone(&orchestrator),
            links.activations.code,
            &config,
        );
        tasks.spawn(async move {
            code.run().await;
            "code"
        });

        info!("Kiosk started");
        Ok(Self { orchestrator, tasks })
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Abort every worker and wait for them to end.
    pub async fn shutdown(mut self) {
        self.tasks.abort_all();

        let mut panics = 0;
        while let Some(result) = self.tasks.join_next().await {
            match Self::classify_task_result(&result) {
                TaskTermination::Finished => {
                    if let Ok(name) = result {
                        warn!(worker = name, "Worker had already stopped");
                    }
                }
                TaskTermination::Cancelled => {}
                TaskTermination::Panic => panics += 1,
            }
        }

        if panics > 0 {
            error!(panics, "Workers panicked before shutdown");
        }
        info!("Kiosk stopped");
    }

    fn classify_task_result(
        result: &std::result::Result<&'static str, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(_) => TaskTermination::Finished,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }
}
