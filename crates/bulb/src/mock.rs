//! Scripted in-memory bulb for tests.
//!
//! [`MockConnector`] records every command it receives and can be told to
//! fail individual steps, which lets callers assert exactly what was sent
//! to the device and in which order.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use diabuddy_core::{ActuationTarget, ConnectionCredentials};

use crate::device::{BulbConnector, BulbDevice, DeviceError};

/// A command observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulbCommand {
    Connect { endpoint: String },
    Refresh,
    TurnOn,
    SetHueSaturation { hue: u16, saturation: u8 },
}

/// Which steps should fail.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FailurePlan {
    pub connect: bool,
    pub refresh: bool,
    pub turn_on: bool,
    pub set_hue_saturation: bool,
}

#[derive(Debug, Default)]
struct MockState {
    commands: Vec<BulbCommand>,
    failures: FailurePlan,
    command_delay: Option<Duration>,
}

/// Cloneable handle; all clones share one command log.
#[derive(Debug, Default, Clone)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose every connect attempt fails.
    pub fn unreachable() -> Self {
        let mock = Self::new();
        mock.set_failures(FailurePlan {
            connect: true,
            ..Default::default()
        });
        mock
    }

    pub fn set_failures(&self, failures: FailurePlan) {
        self.lock().failures = failures;
    }

    /// Make every device command sleep before answering.
    pub fn set_command_delay(&self, delay: Duration) {
        self.lock().command_delay = Some(delay);
    }

    pub fn commands(&self) -> Vec<BulbCommand> {
        self.lock().commands.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.count(|c| matches!(c, BulbCommand::Connect { .. }))
    }

    pub fn turn_on_count(&self) -> usize {
        self.count(|c| matches!(c, BulbCommand::TurnOn))
    }

    /// Every hue/saturation pair applied, oldest first.
    pub fn colors(&self) -> Vec<ActuationTarget> {
        self.lock()
            .commands
            .iter()
            .filter_map(|c| match c {
                BulbCommand::SetHueSaturation { hue, saturation } => Some(ActuationTarget {
                    hue_degrees: *hue,
                    saturation_percent: *saturation,
                }),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&BulbCommand) -> bool) -> usize {
        self.lock().commands.iter().filter(|c| pred(c)).count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Log `command` and report whether it should fail.
    async fn record(&self, command: BulbCommand) -> Result<(), DeviceError> {
        let (delay, fail) = {
            let mut state = self.lock();
            let fail = match &command {
                BulbCommand::Connect { .. } => state.failures.connect,
                BulbCommand::Refresh => state.failures.refresh,
                BulbCommand::TurnOn => state.failures.turn_on,
                BulbCommand::SetHueSaturation { .. } => state.failures.set_hue_saturation,
            };
            state.commands.push(command.clone());
            (state.command_delay, fail)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if fail {
            Err(DeviceError::Rejected(format!("scripted failure: {command:?}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BulbConnector for MockConnector {
    async fn connect(
        &self,
        credentials: &ConnectionCredentials,
    ) -> Result<Box<dyn BulbDevice>, DeviceError> {
        self.record(BulbCommand::Connect {
            endpoint: credentials.endpoint_address().to_string(),
        })
        .await?;
        Ok(Box::new(MockDevice {
            connector: self.clone(),
        }))
    }
}

struct MockDevice {
    connector: MockConnector,
}

#[async_trait]
impl BulbDevice for MockDevice {
    async fn refresh(&mut self) -> Result<(), DeviceError> {
        self.connector.record(BulbCommand::Refresh).await
    }

    async fn turn_on(&mut self) -> Result<(), DeviceError> {
        self.connector.record(BulbCommand::TurnOn).await
    }

    async fn set_hue_saturation(&mut self, hue: u16, saturation: u8) -> Result<(), DeviceError> {
        self.connector
            .record(BulbCommand::SetHueSaturation { hue, saturation })
            .await
    }
}
