// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs;
use crate::{PowerMonitor, PowerState, RegisterAccess};
use gcxdebug_config::ChipProfile;
use spin::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Register file and power state of a simulated GPU.
///
/// Unset registers read as zero, as does every register while the chip is
/// not powered on. Every read is counted.
#[derive(Debug)]
pub struct SimulatedGpu {
    registers: Mutex<HashMap<u32, u32>>,
    power: AtomicU8,
    reads: AtomicUsize,
}

fn power_to_u8(state: PowerState) -> u8 {
    match state {
        PowerState::Unknown => 0,
        PowerState::Off => 1,
        PowerState::On => 2,
        PowerState::Low => 3,
    }
}

fn power_from_u8(raw: u8) -> PowerState {
    match raw {
        1 => PowerState::Off,
        2 => PowerState::On,
        3 => PowerState::Low,
        _ => PowerState::Unknown,
    }
}

impl Default for SimulatedGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGpu {
    pub fn new() -> Self {
        Self {
            registers: Mutex::new(HashMap::new()),
            power: AtomicU8::new(power_to_u8(PowerState::Unknown)),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn from_profile(profile: &ChipProfile) -> Self {
        let gpu = Self::new();
        {
            let mut registers = gpu.registers.lock();
            registers.insert(regs::GC_CHIP_ID, profile.model);
            registers.insert(regs::GC_CHIP_REV, profile.revision);
            registers.insert(regs::GC_CHIP_DATE, profile.date);
            registers.insert(regs::GC_CHIP_TIME, profile.time);
            registers.insert(regs::GC_FEATURES, profile.features);
            registers.insert(regs::GC_MINOR_FEATURES0, profile.minor_features);
            registers.extend(profile.registers.iter().map(|(&addr, &val)| (addr, val)));
        }
        gpu
    }

    pub fn set_register(&self, address: u32, value: u32) {
        self.registers.lock().insert(address, value);
    }

    pub fn set_power(&self, state: PowerState) {
        let prev = power_from_u8(self.power.swap(power_to_u8(state), Ordering::SeqCst));
        if prev != state {
            tracing::debug!("GPU power {} -> {}", prev, state);
        }
    }

    /// Number of register reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl RegisterAccess for SimulatedGpu {
    fn read_reg(&self, address: u32) -> u32 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.power_state() != PowerState::On {
            return 0;
        }
        self.registers.lock().get(&address).copied().unwrap_or(0)
    }
}

impl PowerMonitor for SimulatedGpu {
    fn power_state(&self) -> PowerState {
        power_from_u8(self.power.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_registers() {
        let mut profile = ChipProfile {
            model: 0x320,
            revision: 0x5007,
            ..Default::default()
        };
        profile.registers.insert(regs::GCREG_FE_DEBUG_STATE, 0x9);

        let gpu = SimulatedGpu::from_profile(&profile);
        gpu.set_power(PowerState::On);
        assert_eq!(gpu.read_reg(regs::GC_CHIP_ID), 0x320);
        assert_eq!(gpu.read_reg(regs::GC_CHIP_REV), 0x5007);
        assert_eq!(gpu.read_reg(regs::GCREG_FE_DEBUG_STATE), 0x9);
        assert_eq!(gpu.read_reg(0x3FF), 0);
        assert_eq!(gpu.read_count(), 4);
    }

    #[test]
    fn test_unpowered_reads_zero() {
        let gpu = SimulatedGpu::new();
        gpu.set_register(regs::GC_CHIP_ID, 0x880);
        assert_eq!(gpu.power_state(), PowerState::Unknown);
        assert_eq!(gpu.read_reg(regs::GC_CHIP_ID), 0);

        gpu.set_power(PowerState::Low);
        assert_eq!(gpu.read_reg(regs::GC_CHIP_ID), 0);

        gpu.set_power(PowerState::On);
        assert_eq!(gpu.read_reg(regs::GC_CHIP_ID), 0x880);
    }
}
