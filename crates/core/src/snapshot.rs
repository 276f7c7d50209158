// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::identity::ChipIdentity;
use crate::metrics::BltStatistics;
use crate::status::StatusSnapshot;
use crate::PowerState;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSnapshot {
    pub power: PowerState,
    pub identity: ChipIdentity,
    pub status: StatusSnapshot,
    pub last_error: StatusSnapshot,
    pub blt: BltStatistics,
    pub cache_status_every_irq: bool,
}

impl DiagnosticSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
