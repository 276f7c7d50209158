// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_ROOT: &str = "gcx";
pub const DEFAULT_DUMP_CAPACITY: usize = 256;

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_dump_capacity() -> usize {
    DEFAULT_DUMP_CAPACITY
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub filters: HashMap<String, u32>,
    /// Number of messages kept for `log/dump` before the oldest are dropped
    #[serde(default = "default_dump_capacity")]
    pub dump_capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filters: HashMap::new(),
            dump_capacity: DEFAULT_DUMP_CAPACITY,
        }
    }
}

/// Startup configuration of the diagnostic subsystem.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Name of the root directory the endpoints are registered under
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub cache_status_every_irq: bool,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            cache_status_every_irq: false,
            log: LogConfig::default(),
        }
    }
}

impl DebugConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open debug config at {:?}", path.as_ref()))?;
        serde_yaml::from_reader(f).context("Failed to parse Debug Config")
    }
}

/// Register contents of a simulated chip.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ChipProfile {
    #[serde(default)]
    pub model: u32,
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub date: u32,
    #[serde(default)]
    pub time: u32,
    #[serde(default)]
    pub features: u32,
    #[serde(default)]
    pub minor_features: u32,
    /// Raw register values keyed by word address
    #[serde(default)]
    pub registers: HashMap<u32, u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PowerMode {
    Unknown,
    Off,
    On,
    Low,
}

/// Change the simulated power state. Leaving `on` for `off` runs the
/// pre-power-off hook first.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PowerStep {
    pub power: PowerMode,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RegisterWrite {
    pub address: u32,
    pub value: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SetRegisterStep {
    pub set_register: RegisterWrite,
}

/// Deliver an interrupt with the given acknowledge word
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IrqStep {
    pub irq: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BltRequest {
    pub sources: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BltStep {
    pub blt: BltRequest,
}

/// Read an endpoint and print its contents
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReadStep {
    pub read: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EndpointWrite {
    pub path: String,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WriteStep {
    pub write: EndpointWrite,
}

/// One scenario step, written as a single-key map (`- irq: 0x40000000`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Step {
    Power(PowerStep),
    SetRegister(SetRegisterStep),
    Irq(IrqStep),
    Blt(BltStep),
    Read(ReadStep),
    Write(WriteStep),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub schema_version: String,
    #[serde(default)]
    pub chip: ChipProfile,
    #[serde(default)]
    pub debug: DebugConfig,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open scenario at {:?}", path.as_ref()))?;
        let scenario: Self =
            serde_yaml::from_reader(f).context("Failed to parse Scenario YAML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.steps.is_empty() {
            anyhow::bail!("Scenario must contain at least one step");
        }

        for (idx, step) in self.steps.iter().enumerate() {
            let path = match step {
                Step::Read(ReadStep { read }) => read,
                Step::Write(WriteStep { write }) => &write.path,
                _ => continue,
            };
            if path.trim().is_empty() {
                anyhow::bail!("Step {} has an empty endpoint path", idx);
            }
        }

        Ok(())
    }
}
