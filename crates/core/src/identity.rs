// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs::{
    GC_CHIP_DATE, GC_CHIP_ID, GC_CHIP_REV, GC_CHIP_TIME, GC_FEATURES, GC_MINOR_FEATURES0,
};
use crate::RegisterAccess;
use serde::Serialize;
use spin::Once;
use std::fmt;

/// Chip identification registers. Never change once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChipIdentity {
    pub valid: bool,
    pub model: u32,
    pub revision: u32,
    pub date: u32,
    pub time: u32,
    pub features: u32,
    pub minor_features: u32,
}

impl fmt::Display for ChipIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return writeln!(
                f,
                "GC gpu id cache not valid.  GC must be powered on once."
            );
        }

        writeln!(f, "model={:X}", self.model)?;
        writeln!(f, "revision={:X}", self.revision)?;
        writeln!(f, "date={:X}", self.date)?;
        writeln!(f, "time={:X}", self.time)?;
        writeln!(f, "chipFeatures=0x{:08X}", self.features)?;
        writeln!(f, "chipMinorFeatures=0x{:08X}", self.minor_features)
    }
}

/// Write-once cache of [`ChipIdentity`].
#[derive(Debug)]
pub struct IdentityCache {
    cell: Once<ChipIdentity>,
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityCache {
    pub fn new() -> Self {
        Self { cell: Once::new() }
    }

    /// Read the identity registers on the first call only.
    pub fn capture(&self, regs: &dyn RegisterAccess) {
        self.cell.call_once(|| {
            let id = ChipIdentity {
                valid: true,
                model: regs.read_reg(GC_CHIP_ID),
                revision: regs.read_reg(GC_CHIP_REV),
                date: regs.read_reg(GC_CHIP_DATE),
                time: regs.read_reg(GC_CHIP_TIME),
                features: regs.read_reg(GC_FEATURES),
                minor_features: regs.read_reg(GC_MINOR_FEATURES0),
            };
            tracing::debug!(
                "GPU id cached: model={:#x} revision={:#x}",
                id.model,
                id.revision
            );
            id
        });
    }

    pub fn is_valid(&self) -> bool {
        self.cell.is_completed()
    }

    /// Copy of the cached identity, or an invalid one before capture.
    pub fn get(&self) -> ChipIdentity {
        self.cell.get().copied().unwrap_or_default()
    }

    pub fn describe(&self) -> String {
        self.get().to_string()
    }
}
