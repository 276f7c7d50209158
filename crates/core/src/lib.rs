// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod debugfs;
pub mod identity;
pub mod log;
pub mod metrics;
pub mod regs;
pub mod sim;
pub mod snapshot;
pub mod status;

use std::fmt;
use std::sync::Arc;

use gcxdebug_config::{DebugConfig, PowerMode};
use serde::{Deserialize, Serialize};

use crate::identity::IdentityCache;
use crate::log::{DebugLog, LogControl};
use crate::metrics::BltMetrics;
use crate::snapshot::DiagnosticSnapshot;
use crate::status::{StatusCache, TriggerKind};


#[derive(Debug, thiserror::Error)]
pub enum DebugError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Failed to copy write payload: {0}")]
    TransferFault(#[from] std::io::Error),
    #[error("Failed to create debug root {0:?}")]
    InitializationFailure(String),
    #[error("No such endpoint: {0}")]
    NotFound(String),
    #[error("Operation not permitted on {0}")]
    PermissionDenied(String),
}

pub type DebugResult<T> = Result<T, DebugError>;

/// Synchronous access to the GPU register file.
///
/// Implementations must not block: the status cache calls this from the
/// interrupt handler.
pub trait RegisterAccess: fmt::Debug + Send + Sync {
    fn read_reg(&self, address: u32) -> u32;
}

/// Trait representing the driver's power tracking
pub trait PowerMonitor: fmt::Debug + Send + Sync {
    fn power_state(&self) -> PowerState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    #[default]
    Unknown,
    Off,
    On,
    Low,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerState::Unknown => "GCPWR_UNKNOWN",
            PowerState::Off => "GCPWR_OFF",
            PowerState::On => "GCPWR_ON",
            PowerState::Low => "GCPWR_LOW",
        };
        f.write_str(name)
    }
}

impl From<PowerMode> for PowerState {
    fn from(mode: PowerMode) -> Self {
        match mode {
            PowerMode::Unknown => PowerState::Unknown,
            PowerMode::Off => PowerState::Off,
            PowerMode::On => PowerState::On,
            PowerMode::Low => PowerState::Low,
        }
    }
}

/// Diagnostic capture context.
///
/// Owns every cache of the subsystem. Created once when the driver starts
/// and handed to each entry point, including the interrupt handler.
#[derive(Debug)]
pub struct GcDebug {
    regs: Arc<dyn RegisterAccess>,
    power: Arc<dyn PowerMonitor>,
    identity: IdentityCache,
    status: StatusCache,
    blt: BltMetrics,
    log: LogControl,
}

impl GcDebug {
    pub fn new(
        regs: Arc<dyn RegisterAccess>,
        power: Arc<dyn PowerMonitor>,
        log: Arc<dyn DebugLog>,
    ) -> Self {
        Self {
            regs,
            power,
            identity: IdentityCache::new(),
            status: StatusCache::new(),
            blt: BltMetrics::new(),
            log: LogControl::new(log),
        }
    }

    /// Build the context and apply the startup configuration (capture
    /// policy, initial log enable state and filter levels).
    pub fn from_config(
        config: &DebugConfig,
        regs: Arc<dyn RegisterAccess>,
        power: Arc<dyn PowerMonitor>,
        log: Arc<dyn DebugLog>,
    ) -> Self {
        let ctx = Self::new(regs, power, log);
        ctx.status.set_every_irq(config.cache_status_every_irq);

        let logger = ctx.log.logger();
        if config.log.enabled {
            logger.enable();
        }
        for (name, level) in &config.log.filters {
            logger.set_filter(name, *level);
        }
        ctx
    }

    pub fn identity(&self) -> &IdentityCache {
        &self.identity
    }

    pub fn status(&self) -> &StatusCache {
        &self.status
    }

    pub fn blt(&self) -> &BltMetrics {
        &self.blt
    }

    pub fn log(&self) -> &LogControl {
        &self.log
    }

    pub fn power_state(&self) -> PowerState {
        self.power.power_state()
    }

    pub fn capture_identity(&self) {
        self.identity.capture(self.regs.as_ref());
    }

    /// Interrupt handler entry point.
    pub fn capture_on_interrupt(&self, irq_acknowledge: u32) {
        self.status.capture(
            self.regs.as_ref(),
            TriggerKind::InterruptDriven,
            irq_acknowledge,
        );
    }

    /// Called just before the GPU is powered off. Identity registers are
    /// unreadable afterwards.
    pub fn poweroff_cache(&self) {
        self.capture_identity();
        self.status
            .capture(self.regs.as_ref(), TriggerKind::PowerOff, 0);
        self.log
            .logger()
            .write_message("power", 1, format_args!("status cached before power off"));
    }

    /// Refresh the current snapshot if powered, then render it.
    pub fn describe_status(&self) -> String {
        let power = self.power_state();
        self.status.refresh_if_powered_on(self.regs.as_ref(), power);
        StatusCache::describe(&self.status.current(), StatusCache::CURRENT_NAME, power)
    }

    pub fn describe_last_error(&self) -> String {
        StatusCache::describe(
            &self.status.last_error(),
            StatusCache::LAST_ERROR_NAME,
            self.power_state(),
        )
    }

    /// Work submission hook: account one blit.
    pub fn record_blt(&self, sources: u32, width: u32, height: u32) {
        if self.blt.record(sources, width, height) {
            self.log.logger().write_message(
                "blit",
                2,
                format_args!("blt src={} dst={}x{}", sources, width, height),
            );
        }
    }

    /// Non-destructive copy of all captured state.
    pub fn snapshot(&self) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            power: self.power_state(),
            identity: self.identity.get(),
            status: self.status.current(),
            last_error: self.status.last_error(),
            blt: self.blt.peek(),
            cache_status_every_irq: self.status.every_irq(),
        }
    }
}
