// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Named read/write endpoints over the diagnostic context.
//!
//! Mirrors a debugfs directory: a root directory with one file per cache
//! and a `log/` subdirectory for log control.

use crate::{DebugError, DebugResult, GcDebug};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Largest payload copied in from a writer.
pub const MAX_WRITE_LEN: usize = 4096;

pub trait Endpoint: fmt::Debug + Send + Sync {
    fn read(&self, _ctx: &GcDebug) -> Option<String> {
        None
    }

    fn write(&self, _ctx: &GcDebug, _payload: &[u8]) -> Option<DebugResult<usize>> {
        None
    }
}

#[derive(Debug)]
struct ChipId;

impl Endpoint for ChipId {
    fn read(&self, ctx: &GcDebug) -> Option<String> {
        Some(ctx.identity().describe())
    }
}

#[derive(Debug)]
struct Status;

impl Endpoint for Status {
    fn read(&self, ctx: &GcDebug) -> Option<String> {
        Some(ctx.describe_status())
    }
}

#[derive(Debug)]
struct LastError;

impl Endpoint for LastError {
    fn read(&self, ctx: &GcDebug) -> Option<String> {
        Some(ctx.describe_last_error())
    }
}

#[derive(Debug)]
struct BltStats;

impl Endpoint for BltStats {
    fn read(&self, ctx: &GcDebug) -> Option<String> {
        Some(ctx.blt().drain().to_string())
    }
}

/// Boolean file, `Y`/`N` on read.
#[derive(Debug)]
struct EveryIrq;

fn parse_bool(payload: &[u8]) -> DebugResult<bool> {
    match payload {
        [b'Y' | b'y' | b'1', ..] => Ok(true),
        [b'N' | b'n' | b'0', ..] => Ok(false),
        [b'o' | b'O', b'n' | b'N', ..] => Ok(true),
        [b'o' | b'O', b'f' | b'F', ..] => Ok(false),
        _ => Err(DebugError::InvalidArgument(
            String::from_utf8_lossy(payload).trim_end().to_string(),
        )),
    }
}

impl Endpoint for EveryIrq {
    fn read(&self, ctx: &GcDebug) -> Option<String> {
        let flag = if ctx.status().every_irq() { "Y" } else { "N" };
        Some(format!("{}\n", flag))
    }

    fn write(&self, ctx: &GcDebug, payload: &[u8]) -> Option<DebugResult<usize>> {
        Some(parse_bool(payload).map(|enabled| {
            ctx.status().set_every_irq(enabled);
            tracing::debug!("cache_status_every_irq = {}", enabled);
            payload.len()
        }))
    }
}

#[derive(Debug)]
struct LogEnable;

impl Endpoint for LogEnable {
    fn read(&self, ctx: &GcDebug) -> Option<String> {
        let mut out = String::new();
        let _ = ctx.log().show_enabled(&mut out);
        Some(out)
    }

    fn write(&self, ctx: &GcDebug, payload: &[u8]) -> Option<DebugResult<usize>> {
        Some(ctx.log().write_control(payload))
    }
}

/// Any access resets the log buffer.
#[derive(Debug)]
struct LogReset;

impl Endpoint for LogReset {
    fn read(&self, ctx: &GcDebug) -> Option<String> {
        ctx.log().reset_log();
        Some(String::new())
    }

    fn write(&self, ctx: &GcDebug, payload: &[u8]) -> Option<DebugResult<usize>> {
        ctx.log().reset_log();
        Some(Ok(payload.len()))
    }
}

#[derive(Debug)]
struct LogDump;

impl Endpoint for LogDump {
    fn read(&self, ctx: &GcDebug) -> Option<String> {
        let mut out = String::new();
        let _ = ctx.log().dump_log(&mut out);
        Some(out)
    }
}

#[derive(Debug)]
pub struct EndpointEntry {
    pub path: String,
    pub mode: u32,
    pub node: Box<dyn Endpoint>,
}

/// Endpoint tree bound to one diagnostic context.
#[derive(Debug)]
pub struct DebugFs {
    root: String,
    ctx: Arc<GcDebug>,
    entries: Vec<EndpointEntry>,
}

impl DebugFs {
    /// Create the root directory and register every endpoint under it.
    ///
    /// Fails with `InitializationFailure` when the root cannot be created;
    /// no endpoint is registered in that case.
    pub fn mount(root: &str, ctx: Arc<GcDebug>) -> DebugResult<Self> {
        if root.is_empty() || root.contains('/') || root.chars().any(char::is_whitespace) {
            return Err(DebugError::InitializationFailure(root.to_string()));
        }

        let mut fs = Self {
            root: root.to_string(),
            ctx,
            entries: Vec::new(),
        };
        fs.create_file("id", 0o664, Box::new(ChipId));
        fs.create_file("status", 0o664, Box::new(Status));
        fs.create_file("blt_stats", 0o664, Box::new(BltStats));
        fs.create_file("last_error", 0o664, Box::new(LastError));
        fs.create_file("cache_status_every_irq", 0o666, Box::new(EveryIrq));
        fs.create_file("log/enable", 0o664, Box::new(LogEnable));
        fs.create_file("log/reset", 0o664, Box::new(LogReset));
        fs.create_file("log/dump", 0o664, Box::new(LogDump));

        tracing::info!("Registered {} debug endpoints under {}/", fs.entries.len(), fs.root);
        Ok(fs)
    }

    fn create_file(&mut self, path: &str, mode: u32, node: Box<dyn Endpoint>) {
        tracing::debug!("debugfs: {}/{} ({:o})", self.root, path, mode);
        self.entries.push(EndpointEntry {
            path: path.to_string(),
            mode,
            node,
        });
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn context(&self) -> &Arc<GcDebug> {
        &self.ctx
    }

    /// Paths of all endpoints, relative to the root.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    fn lookup(&self, path: &str) -> DebugResult<&EndpointEntry> {
        let rel = path
            .strip_prefix(self.root.as_str())
            .and_then(|p| p.strip_prefix('/'))
            .unwrap_or(path);
        self.entries
            .iter()
            .find(|e| e.path == rel)
            .ok_or_else(|| DebugError::NotFound(path.to_string()))
    }

    pub fn read(&self, path: &str) -> DebugResult<String> {
        let entry = self.lookup(path)?;
        entry
            .node
            .read(&self.ctx)
            .ok_or_else(|| DebugError::PermissionDenied(path.to_string()))
    }

    /// Write a payload. Returns the number of bytes consumed.
    pub fn write(&self, path: &str, payload: &[u8]) -> DebugResult<usize> {
        let entry = self.lookup(path)?;
        entry
            .node
            .write(&self.ctx, payload)
            .ok_or_else(|| DebugError::PermissionDenied(path.to_string()))?
    }

    /// Copy a payload in from `reader`, then write it.
    pub fn write_from(&self, path: &str, reader: &mut dyn Read) -> DebugResult<usize> {
        let mut payload = Vec::new();
        reader
            .take(MAX_WRITE_LEN as u64)
            .read_to_end(&mut payload)?;
        self.write(path, &payload)
    }
}

impl Drop for DebugFs {
    fn drop(&mut self) {
        tracing::debug!("Removing debug endpoints under {}/", self.root);
    }
}
