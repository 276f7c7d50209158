// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Result;
use gcxdebug_config::{
    BltStep, DebugConfig, IrqStep, PowerStep, ReadStep, Scenario, SetRegisterStep, Step,
    WriteStep,
};
use gcxdebug_core::debugfs::DebugFs;
use gcxdebug_core::log::MemoryLog;
use gcxdebug_core::sim::SimulatedGpu;
use gcxdebug_core::{GcDebug, PowerMonitor, PowerState};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Replay `scenario` against a simulated GPU, printing every endpoint read
/// to `out`. Returns the context for final inspection.
pub fn run_scenario(
    scenario: &Scenario,
    config: &DebugConfig,
    out: &mut dyn Write,
) -> Result<Arc<GcDebug>> {
    let gpu = Arc::new(SimulatedGpu::from_profile(&scenario.chip));
    let log = Arc::new(MemoryLog::new(config.log.dump_capacity));
    let ctx = Arc::new(GcDebug::from_config(config, gpu.clone(), gpu.clone(), log));

    // A missing root only costs us the endpoints, not the run.
    let fs = match DebugFs::mount(&config.root, ctx.clone()) {
        Ok(fs) => Some(fs),
        Err(e) => {
            warn!("Debug endpoints disabled: {}", e);
            None
        }
    };

    info!("Replaying {} steps", scenario.steps.len());
    for (idx, step) in scenario.steps.iter().enumerate() {
        debug!("step {}: {:?}", idx, step);
        match step {
            Step::Power(PowerStep { power }) => {
                let next = PowerState::from(*power);
                if next == PowerState::Off && gpu.power_state() == PowerState::On {
                    ctx.poweroff_cache();
                }
                gpu.set_power(next);
            }
            Step::SetRegister(SetRegisterStep { set_register }) => {
                gpu.set_register(set_register.address, set_register.value)
            }
            Step::Irq(IrqStep { irq }) => ctx.capture_on_interrupt(*irq),
            Step::Blt(BltStep { blt }) => ctx.record_blt(blt.sources, blt.width, blt.height),
            Step::Read(ReadStep { read: path }) => {
                writeln!(out, "==> {}", path)?;
                match fs.as_ref().map(|fs| fs.read(path)) {
                    Some(Ok(text)) => write!(out, "{}", text)?,
                    Some(Err(e)) => writeln!(out, "error: {}", e)?,
                    None => writeln!(out, "error: debug endpoints unavailable")?,
                }
            }
            Step::Write(WriteStep { write }) => {
                let path = &write.path;
                match fs.as_ref().map(|fs| fs.write(path, write.data.as_bytes())) {
                    Some(Ok(n)) => debug!("wrote {} bytes to {}", n, path),
                    Some(Err(e)) => writeln!(out, "<== {}: error: {}", path, e)?,
                    None => writeln!(out, "<== {}: error: debug endpoints unavailable", path)?,
                }
            }
        }
    }

    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(yaml: &str) -> Scenario {
        let dir = std::env::temp_dir().join("gcxdebug-runner-tests");
        let _ = std::fs::create_dir_all(&dir);
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = dir.join(format!("scenario-{:?}-{}.yaml", std::thread::current().id(), nonce));
        std::fs::write(&path, yaml).unwrap();
        let scenario = Scenario::from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        scenario
    }

    #[test]
    fn test_power_cycle_keeps_identity() {
        let s = scenario(
            r#"
schema_version: "1.0"
chip:
  model: 0x320
steps:
  - power: on
  - power: off
  - read: id
  - read: status
"#,
        );
        let mut out = Vec::new();
        let ctx = run_scenario(&s, &s.debug, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(ctx.identity().is_valid());
        assert!(text.contains("==> id\nmodel=320\n"));
        assert!(text.contains("GCPWR_OFF"));
        assert!(text.contains("cached at: GC_DEBUG_DRIVER_POWEROFF"));
    }

    #[test]
    fn test_bad_root_disables_endpoints() {
        let s = scenario(
            r#"
schema_version: "1.0"
debug:
  root: ""
steps:
  - blt: { sources: 1, width: 2, height: 2 }
  - read: blt_stats
  - write: { path: log/enable, data: "1" }
"#,
        );
        let mut out = Vec::new();
        let ctx = run_scenario(&s, &s.debug, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("==> blt_stats\nerror: debug endpoints unavailable"));
        assert!(text.contains("<== log/enable: error: debug endpoints unavailable"));
        assert_eq!(ctx.blt().peek().total_count, 1);
    }

    #[test]
    fn test_write_errors_reported() {
        let s = scenario(
            r#"
schema_version: "1.0"
steps:
  - write: { path: log/enable, data: "blit" }
  - read: nope
"#,
        );
        let mut out = Vec::new();
        run_scenario(&s, &s.debug, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("<== log/enable: error: Invalid argument"));
        assert!(text.contains("==> nope\nerror: No such endpoint: nope"));
    }
}
