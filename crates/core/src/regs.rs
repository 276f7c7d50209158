// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! GPU register map.
//!
//! Addresses are word addresses (byte offset >> 2), the unit the register
//! access collaborator takes.

// Chip identification, readable only while powered.
pub const GC_FEATURES: u32 = 0x007;
pub const GC_CHIP_ID: u32 = 0x008;
pub const GC_CHIP_REV: u32 = 0x009;
pub const GC_CHIP_DATE: u32 = 0x00A;
pub const GC_CHIP_TIME: u32 = 0x00B;
pub const GC_MINOR_FEATURES0: u32 = 0x00D;

pub const GCREG_HI_IDLE: u32 = 0x001;

// Memory transaction counters
pub const GC_TOTAL_READS: u32 = 0x010;
pub const GC_TOTAL_WRITES: u32 = 0x011;
pub const GC_TOTAL_WRITE_BURSTS: u32 = 0x013;
pub const GC_TOTAL_WRITE_REQS: u32 = 0x014;
pub const GC_TOTAL_READ_BURSTS: u32 = 0x016;
pub const GC_TOTAL_READ_REQS: u32 = 0x017;

pub const GCREG_MMU_STATUS: u32 = 0x062;
/// First of `MMU_UNITS` consecutive exception address registers.
pub const GCREG_MMU_EXCEPTION: u32 = 0x064;

// Front-end (command fetch) debug registers
pub const GCREG_FE_DEBUG_STATE: u32 = 0x198;
pub const GCREG_FE_DEBUG_CUR_CMD_ADR: u32 = 0x199;
pub const GCREG_FE_DEBUG_CMD_LOW_REG: u32 = 0x19A;
pub const GCREG_FE_DEBUG_CMD_HI_REG: u32 = 0x19B;

pub const MMU_UNITS: usize = 4;

bitflags::bitflags! {
    /// Interrupt acknowledge word as delivered to the interrupt handler.
    ///
    /// The two top bits report errors; the rest are event completion bits
    /// and are kept as-is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IrqAck: u32 {
        const BUS_ERROR = 1 << 31;
        const MMU_ERROR = 1 << 30;
        const _ = !0;
    }
}

impl IrqAck {
    pub const ERROR_MASK: IrqAck = IrqAck::BUS_ERROR.union(IrqAck::MMU_ERROR);

    pub fn has_error(self) -> bool {
        self.intersects(Self::ERROR_MASK)
    }

    pub fn mmu_error(self) -> bool {
        self.contains(Self::MMU_ERROR)
    }
}

impl From<u32> for IrqAck {
    fn from(raw: u32) -> Self {
        IrqAck::from_bits_retain(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_bits() {
        assert!(!IrqAck::from(0x3FFF_FFFF).has_error());
        assert!(IrqAck::from(0x8000_0000).has_error());
        assert!(!IrqAck::from(0x8000_0000).mmu_error());
        assert!(IrqAck::from(0x4000_0001).mmu_error());
        assert_eq!(IrqAck::ERROR_MASK.bits(), 0xC000_0000);
    }

    #[test]
    fn test_raw_bits_retained() {
        assert_eq!(IrqAck::from(0x1234_5678).bits(), 0x1234_5678);
    }
}
