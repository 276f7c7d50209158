// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Control of the driver's debug log.
//!
//! The log itself is a collaborator behind [`DebugLog`]; this module parses
//! the `log/enable` text protocol and forwards requests. [`MemoryLog`] is an
//! in-memory implementation with a bounded dump buffer.

use crate::{DebugError, DebugResult};
use spin::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Longest control line accepted; anything beyond is ignored.
pub const MAX_CONTROL_LEN: usize = 127;

/// Trait representing the driver's debug log
pub trait DebugLog: fmt::Debug + Send + Sync {
    fn enable(&self);
    fn disable(&self);
    fn set_filter(&self, name: &str, level: u32);
    fn reset(&self);
    /// Write buffered messages to `sink` and empty the buffer.
    fn flush(&self, sink: &mut dyn fmt::Write) -> fmt::Result;
    fn show_enabled(&self, sink: &mut dyn fmt::Write) -> fmt::Result;
    fn write_message(&self, _zone: &str, _level: u32, _args: fmt::Arguments<'_>) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogCommand {
    Enable,
    Disable,
    SetFilter { name: String, level: u32 },
}

/// Parse an unsigned integer the way the kernel's `kstrtoul(s, 0, ..)`
/// does: `0x` hex, leading `0` octal, otherwise decimal, with one optional
/// trailing newline.
fn parse_ulong(s: &str) -> Option<u64> {
    let s = s.strip_suffix('\n').unwrap_or(s);
    let s = s.strip_prefix('+').unwrap_or(s);
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

impl FromStr for LogCommand {
    type Err = DebugError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        if let Some(value) = parse_ulong(line) {
            return Ok(if value != 0 {
                LogCommand::Enable
            } else {
                LogCommand::Disable
            });
        }

        // "<filter> <level>": only the first space counts, and never the
        // final character.
        let search = &line.as_bytes()[..line.len().saturating_sub(1)];
        let split = search
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| DebugError::InvalidArgument(format!("{:?}", line.trim_end())))?;

        let (name, rest) = (&line[..split], &line[split + 1..]);
        let level = parse_ulong(rest)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| DebugError::InvalidArgument(format!("bad filter level {:?}", rest.trim_end())))?;
        if name.is_empty() {
            return Err(DebugError::InvalidArgument("empty filter name".to_string()));
        }

        Ok(LogCommand::SetFilter {
            name: name.to_string(),
            level,
        })
    }
}

/// Forwards log control requests to a [`DebugLog`].
#[derive(Debug, Clone)]
pub struct LogControl {
    log: Arc<dyn DebugLog>,
}

impl LogControl {
    pub fn new(log: Arc<dyn DebugLog>) -> Self {
        Self { log }
    }

    pub fn logger(&self) -> &dyn DebugLog {
        self.log.as_ref()
    }

    /// Handle a write to `log/enable`. Returns the number of bytes consumed,
    /// which is always the full payload.
    pub fn write_control(&self, payload: &[u8]) -> DebugResult<usize> {
        let len = payload.len().min(MAX_CONTROL_LEN);
        let line = std::str::from_utf8(&payload[..len])
            .map_err(|e| DebugError::InvalidArgument(e.to_string()))?;

        match line.parse::<LogCommand>()? {
            LogCommand::Enable => self.log.enable(),
            LogCommand::Disable => self.log.disable(),
            LogCommand::SetFilter { name, level } => self.log.set_filter(&name, level),
        }
        Ok(payload.len())
    }

    pub fn reset_log(&self) {
        self.log.reset();
    }

    pub fn dump_log(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        self.log.flush(sink)
    }

    pub fn show_enabled(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        self.log.show_enabled(sink)
    }
}

#[derive(Debug, Default)]
struct MemoryLogState {
    enabled: bool,
    filters: BTreeMap<String, u32>,
    messages: VecDeque<String>,
    dropped: u64,
}

/// In-memory debug log.
///
/// Messages pass when logging is enabled and their level does not exceed
/// the level of their zone's filter (zones without a filter pass level 0
/// only). Once `capacity` messages are buffered the oldest are dropped.
#[derive(Debug)]
pub struct MemoryLog {
    state: Mutex<MemoryLogState>,
    capacity: usize,
}

impl MemoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(MemoryLogState::default()),
            capacity,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    pub fn filter(&self, name: &str) -> Option<u32> {
        self.state.lock().filters.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DebugLog for MemoryLog {
    fn enable(&self) {
        self.state.lock().enabled = true;
        tracing::info!("Debug log enabled");
    }

    fn disable(&self) {
        self.state.lock().enabled = false;
        tracing::info!("Debug log disabled");
    }

    fn set_filter(&self, name: &str, level: u32) {
        self.state.lock().filters.insert(name.to_string(), level);
        tracing::info!("Debug log filter {} set to {}", name, level);
    }

    fn reset(&self) {
        let mut state = self.state.lock();
        state.messages.clear();
        state.dropped = 0;
    }

    fn flush(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        let (messages, dropped) = {
            let mut state = self.state.lock();
            let dropped = std::mem::take(&mut state.dropped);
            (std::mem::take(&mut state.messages), dropped)
        };

        if dropped > 0 {
            writeln!(sink, "[{} older messages dropped]", dropped)?;
        }
        for message in messages {
            writeln!(sink, "{}", message)?;
        }
        Ok(())
    }

    fn show_enabled(&self, sink: &mut dyn fmt::Write) -> fmt::Result {
        let state = self.state.lock();
        writeln!(sink, "logging {}", if state.enabled { "enabled" } else { "disabled" })?;
        for (name, level) in &state.filters {
            writeln!(sink, "  {} = {}", name, level)?;
        }
        Ok(())
    }

    fn write_message(&self, zone: &str, level: u32, args: fmt::Arguments<'_>) {
        let mut state = self.state.lock();
        if !state.enabled || level > state.filters.get(zone).copied().unwrap_or(0) {
            return;
        }

        tracing::trace!(zone, level, "{}", args);
        if self.capacity == 0 {
            state.dropped += 1;
            return;
        }
        if state.messages.len() == self.capacity {
            state.messages.pop_front();
            state.dropped += 1;
        }
        state.messages.push_back(format!("[{}] {}", zone, args));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ulong_radixes() {
        assert_eq!(parse_ulong("7"), Some(7));
        assert_eq!(parse_ulong("7\n"), Some(7));
        assert_eq!(parse_ulong("0x1F"), Some(31));
        assert_eq!(parse_ulong("017"), Some(15));
        assert_eq!(parse_ulong("0"), Some(0));
        assert_eq!(parse_ulong("08"), None);
        assert_eq!(parse_ulong(""), None);
        assert_eq!(parse_ulong("-1"), None);
        assert_eq!(parse_ulong("7 "), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("7".parse::<LogCommand>().unwrap(), LogCommand::Enable);
        assert_eq!("0\n".parse::<LogCommand>().unwrap(), LogCommand::Disable);
        assert_eq!(
            "blit 3".parse::<LogCommand>().unwrap(),
            LogCommand::SetFilter {
                name: "blit".to_string(),
                level: 3
            }
        );
        assert_eq!(
            "mmu 0x10\n".parse::<LogCommand>().unwrap(),
            LogCommand::SetFilter {
                name: "mmu".to_string(),
                level: 16
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for line in ["blit", "blit x", "blit 3 4", " 3", "", "blit "] {
            let err = line.parse::<LogCommand>().unwrap_err();
            assert!(
                matches!(err, DebugError::InvalidArgument(_)),
                "{:?} gave {:?}",
                line,
                err
            );
        }
    }

    #[test]
    fn test_write_control_forwards() {
        let log = Arc::new(MemoryLog::new(8));
        let control = LogControl::new(log.clone());

        assert_eq!(control.write_control(b"7\n").unwrap(), 2);
        assert!(log.is_enabled());

        control.write_control(b"blit 3").unwrap();
        assert_eq!(log.filter("blit"), Some(3));

        control.write_control(b"0").unwrap();
        assert!(!log.is_enabled());
        assert_eq!(log.filter("blit"), Some(3));

        assert!(matches!(
            control.write_control(b"blit"),
            Err(DebugError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_write_control_truncates_long_payload() {
        let log = Arc::new(MemoryLog::new(8));
        let control = LogControl::new(log.clone());

        let mut payload = b"1".to_vec();
        payload.extend(std::iter::repeat(b'0').take(MAX_CONTROL_LEN - 1));
        payload.extend(b"garbage beyond the limit");
        // Truncated to 127 digits, which overflows u64 and is rejected.
        assert!(control.write_control(&payload).is_err());

        let mut payload = b"zone 5".to_vec();
        payload.resize(200, b'\n');
        assert!(control.write_control(&payload).is_err());
    }

    #[test]
    fn test_memory_log_filters_and_flush() {
        let log = MemoryLog::new(8);
        log.write_message("blit", 0, format_args!("before enable"));
        assert!(log.is_empty());

        log.enable();
        log.set_filter("blit", 2);
        log.write_message("blit", 2, format_args!("kept"));
        log.write_message("blit", 3, format_args!("too verbose"));
        log.write_message("power", 0, format_args!("default zone"));
        log.write_message("power", 1, format_args!("filtered"));

        let mut out = String::new();
        log.flush(&mut out).unwrap();
        assert_eq!(out, "[blit] kept\n[power] default zone\n");
        assert!(log.is_empty());
    }

    #[test]
    fn test_memory_log_drops_oldest() {
        let log = MemoryLog::new(2);
        log.enable();
        for i in 0..4 {
            log.write_message("core", 0, format_args!("msg {}", i));
        }

        let mut out = String::new();
        log.flush(&mut out).unwrap();
        assert_eq!(out, "[2 older messages dropped]\n[core] msg 2\n[core] msg 3\n");

        log.write_message("core", 0, format_args!("again"));
        log.reset();
        let mut out = String::new();
        log.flush(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_show_enabled() {
        let log = MemoryLog::new(2);
        log.set_filter("mmu", 1);
        let mut out = String::new();
        log.show_enabled(&mut out).unwrap();
        assert_eq!(out, "logging disabled\n  mmu = 1\n");
    }
}
