// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs::{self, IrqAck, MMU_UNITS};
use crate::{PowerState, RegisterAccess};
use serde::Serialize;
use spin::Mutex;
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// What caused a status capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    UserRequest,
    PowerOff,
    InterruptDriven,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerKind::UserRequest => "GC_DEBUG_USER_REQUEST",
            TriggerKind::PowerOff => "GC_DEBUG_DRIVER_POWEROFF",
            TriggerKind::InterruptDriven => "GC_DEBUG_DRIVER_IRQ",
        };
        f.write_str(name)
    }
}

/// One generation of dynamic GPU status registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusSnapshot {
    pub valid: bool,
    pub trigger: TriggerKind,
    pub idle: u32,
    pub dma_state: u32,
    pub dma_addr: u32,
    pub dma_low_data: u32,
    pub dma_high_data: u32,
    pub total_reads: u32,
    pub total_writes: u32,
    pub total_read_bursts: u32,
    pub total_write_bursts: u32,
    pub total_read_reqs: u32,
    pub total_write_reqs: u32,
    pub irq_acknowledge: u32,
    /// Zero unless captured on an MMU error interrupt
    pub mmu_status: u32,
    pub exception_address: [u32; MMU_UNITS],
}

impl StatusSnapshot {
    /// Read a full generation from hardware. `has_error` gates the MMU
    /// registers, which are only meaningful during a translation fault.
    fn sample(
        regs: &dyn RegisterAccess,
        trigger: TriggerKind,
        irq_acknowledge: u32,
        has_error: bool,
    ) -> Self {
        let mut snap = StatusSnapshot {
            valid: false,
            trigger,
            idle: regs.read_reg(regs::GCREG_HI_IDLE),
            dma_state: regs.read_reg(regs::GCREG_FE_DEBUG_STATE),
            dma_addr: regs.read_reg(regs::GCREG_FE_DEBUG_CUR_CMD_ADR),
            dma_low_data: regs.read_reg(regs::GCREG_FE_DEBUG_CMD_LOW_REG),
            dma_high_data: regs.read_reg(regs::GCREG_FE_DEBUG_CMD_HI_REG),
            total_reads: regs.read_reg(regs::GC_TOTAL_READS),
            total_writes: regs.read_reg(regs::GC_TOTAL_WRITES),
            total_read_bursts: regs.read_reg(regs::GC_TOTAL_READ_BURSTS),
            total_write_bursts: regs.read_reg(regs::GC_TOTAL_WRITE_BURSTS),
            total_read_reqs: regs.read_reg(regs::GC_TOTAL_READ_REQS),
            total_write_reqs: regs.read_reg(regs::GC_TOTAL_WRITE_REQS),
            irq_acknowledge,
            mmu_status: 0,
            exception_address: [0; MMU_UNITS],
        };

        if has_error && IrqAck::from(irq_acknowledge).mmu_error() {
            snap.mmu_status = regs.read_reg(regs::GCREG_MMU_STATUS);
            for (unit, addr) in snap.exception_address.iter_mut().enumerate() {
                *addr = regs.read_reg(regs::GCREG_MMU_EXCEPTION + unit as u32);
            }
        }

        snap.valid = true;
        snap
    }

    pub fn mmu_error(&self) -> bool {
        IrqAck::from(self.irq_acknowledge).mmu_error()
    }

    fn render(&self, name: &str, power: PowerState, out: &mut String) -> fmt::Result {
        writeln!(out, "GC gpu current power status: {}", power)?;

        if !self.valid {
            return writeln!(out, "{}: not valid.", name);
        }

        writeln!(out, "{}: cached at: {}", name, self.trigger)?;
        writeln!(out, "idle = 0x{:08X}", self.idle)?;
        writeln!(out, "DMA state = 0x{:08X}", self.dma_state)?;
        writeln!(out, "DMA address = 0x{:08X}", self.dma_addr)?;
        writeln!(out, "DMA low data = 0x{:08X}", self.dma_low_data)?;
        writeln!(out, "DMA high data = 0x{:08X}", self.dma_high_data)?;
        writeln!(out, "Total memory reads = {}", self.total_reads)?;
        writeln!(out, "Total memory writes = {}", self.total_writes)?;
        writeln!(
            out,
            "Total memory read 64-bit bursts = {}",
            self.total_read_bursts
        )?;
        writeln!(
            out,
            "Total memory write 64-bit bursts = {}",
            self.total_write_bursts
        )?;
        writeln!(out, "Total memory read requests = {}", self.total_read_reqs)?;
        writeln!(out, "Total memory write requests = {}", self.total_write_reqs)?;
        writeln!(out, "irq acknowledge = 0x{:08X}", self.irq_acknowledge)?;

        if self.mmu_error() {
            writeln!(out, "mmu status = 0x{:08X}", self.mmu_status)?;
            for (unit, addr) in self.exception_address.iter().enumerate() {
                writeln!(out, "exception address {} = 0x{:08X}", unit, addr)?;
            }
        }

        Ok(())
    }
}

/// Current status snapshot plus the latched copy of the last error.
///
/// Both snapshots sit behind spin locks. A capture samples registers into a
/// local record first and only takes the locks to publish it, so the
/// interrupt handler never spins for longer than a struct copy and readers
/// always get a complete generation.
#[derive(Debug)]
pub struct StatusCache {
    current: Mutex<StatusSnapshot>,
    last_error: Mutex<StatusSnapshot>,
    every_irq: AtomicBool,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCache {
    pub const CURRENT_NAME: &'static str = "GPU status";
    pub const LAST_ERROR_NAME: &'static str = "GPU last error status";

    pub fn new() -> Self {
        Self {
            current: Mutex::new(StatusSnapshot::default()),
            last_error: Mutex::new(StatusSnapshot::default()),
            every_irq: AtomicBool::new(false),
        }
    }

    pub fn every_irq(&self) -> bool {
        self.every_irq.load(Ordering::SeqCst)
    }

    /// Toggle continuous capture: sample on every interrupt, not only on
    /// error interrupts.
    pub fn set_every_irq(&self, enabled: bool) {
        self.every_irq.store(enabled, Ordering::SeqCst);
    }

    /// Throttle policy. Interrupts without an error are only sampled when
    /// continuous capture is on.
    pub fn should_sample(&self, trigger: TriggerKind, irq_acknowledge: u32) -> bool {
        trigger != TriggerKind::InterruptDriven
            || IrqAck::from(irq_acknowledge).has_error()
            || self.every_irq()
    }

    /// Sample the status registers. Returns false when throttled, in which
    /// case no register was read and nothing changed.
    ///
    /// Safe to call from the interrupt handler: no allocation, no logging and
    /// no blocking beyond the publish copy.
    pub fn capture(
        &self,
        regs: &dyn RegisterAccess,
        trigger: TriggerKind,
        irq_acknowledge: u32,
    ) -> bool {
        if !self.should_sample(trigger, irq_acknowledge) {
            return false;
        }

        let has_error =
            trigger == TriggerKind::InterruptDriven && IrqAck::from(irq_acknowledge).has_error();
        let snap = StatusSnapshot::sample(regs, trigger, irq_acknowledge, has_error);

        let mut current = self.current.lock();
        *current = snap;
        if has_error {
            *self.last_error.lock() = snap;
        }

        true
    }

    /// Capture on user request, but only while the GPU can answer.
    pub fn refresh_if_powered_on(&self, regs: &dyn RegisterAccess, power: PowerState) {
        if power == PowerState::On {
            self.capture(regs, TriggerKind::UserRequest, 0);
        }
    }

    pub fn current(&self) -> StatusSnapshot {
        *self.current.lock()
    }

    pub fn last_error(&self) -> StatusSnapshot {
        *self.last_error.lock()
    }

    pub fn describe(snapshot: &StatusSnapshot, name: &str, power: PowerState) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = snapshot.render(name, power, &mut out);
        out
    }
}
