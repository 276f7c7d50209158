// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::Serialize;
use spin::Mutex;
use std::fmt;

pub const MAX_BLT_SOURCES: usize = 8;

/// Blit histogram indexed by number of input surfaces. Slot 0 is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BltStatistics {
    pub total_count: i64,
    pub total_pixels: i64,
    pub source_count: [i64; MAX_BLT_SOURCES + 1],
    pub source_pixels: [i64; MAX_BLT_SOURCES + 1],
}

fn percent(part: i64, total: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (part as i128 * 100 / total as i128) as i64
    }
}

impl BltStatistics {
    fn record(&mut self, sources: usize, pixels: i64) {
        self.source_count[sources] += 1;
        self.source_pixels[sources] = self.source_pixels[sources].saturating_add(pixels);
        self.total_count += 1;
        self.total_pixels = self.total_pixels.saturating_add(pixels);
    }
}

impl fmt::Display for BltStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total blts: {}", self.total_count)?;
        if self.total_count > 0 {
            for i in 1..=MAX_BLT_SOURCES {
                let count = self.source_count[i];
                writeln!(
                    f,
                    " {} src: {} ({}%)",
                    i,
                    count,
                    percent(count, self.total_count)
                )?;
            }
        }

        writeln!(f, "total dst pixels: {}", self.total_pixels)?;
        if self.total_pixels > 0 {
            for i in 1..=MAX_BLT_SOURCES {
                let pixels = self.source_pixels[i];
                writeln!(
                    f,
                    " {} src: {} ({}%)",
                    i,
                    pixels,
                    percent(pixels, self.total_pixels)
                )?;
            }
        }
        Ok(())
    }
}

/// Blit statistics fed by the submission path and drained by readers.
#[derive(Debug)]
pub struct BltMetrics {
    stats: Mutex<BltStatistics>,
}

impl Default for BltMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BltMetrics {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(BltStatistics::default()),
        }
    }

    /// Account one blit. Source counts outside 1..=8 are dropped and
    /// reported as `false`.
    pub fn record(&self, sources: u32, width: u32, height: u32) -> bool {
        let sources = sources as usize;
        if sources == 0 || sources > MAX_BLT_SOURCES {
            tracing::debug!("Dropping blt with {} sources", sources);
            return false;
        }

        let pixels = (width as i64).saturating_mul(height as i64);
        self.stats.lock().record(sources, pixels);
        true
    }

    pub fn peek(&self) -> BltStatistics {
        *self.stats.lock()
    }

    /// Take the counters, leaving them zeroed.
    pub fn drain(&self) -> BltStatistics {
        std::mem::take(&mut *self.stats.lock())
    }
}
