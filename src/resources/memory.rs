//! Process memory usage against a configured ceiling.

use async_trait::async_trait;
use serde_json::json;
use sysinfo::System;

use crate::lifecycle::{ManagedResource, ProbeOutcome, ReleaseOutcome};

pub const MEMORY_RESOURCE: &str = "memory";

/// Local, synchronous check of resident memory.
pub struct MemoryResource {
    ceiling_mb: u64,
    threshold: f64,
}

impl MemoryResource {
    pub fn new(ceiling_mb: u64, threshold: f64) -> Self {
        Self {
            ceiling_mb,
            threshold,
        }
    }
}

#[async_trait]
impl ManagedResource for MemoryResource {
    fn name(&self) -> &str {
        MEMORY_RESOURCE
    }

    async fn probe(&self) -> ProbeOutcome {
        match resident_memory_mb() {
            Ok(used_mb) => classify(used_mb, self.ceiling_mb, self.threshold),
            Err(e) => ProbeOutcome::unhealthy(format!("memory usage unavailable: {}", e)),
        }
    }

    async fn release(&self) -> ReleaseOutcome {
        ReleaseOutcome::Closed
    }
}

/// Unhealthy once usage reaches `threshold` of the ceiling.
pub fn classify(used_mb: f64, ceiling_mb: u64, threshold: f64) -> ProbeOutcome {
    let max = ceiling_mb as f64;
    let details = json!({
        "used": format!("{}MB", (used_mb * 100.0).round() / 100.0),
        "max": format!("{}MB", ceiling_mb),
        "percentage": format!("{}%", ((used_mb / max) * 100.0).round()),
    });

    if used_mb < max * threshold {
        ProbeOutcome::healthy_with(details)
    } else {
        ProbeOutcome::unhealthy(details)
    }
}

/// Resident set size of this process, in megabytes.
fn resident_memory_mb() -> Result<f64, String> {
    let pid = sysinfo::get_current_pid().map_err(|e| e.to_string())?;
    let mut sys = System::new();
    if !sys.refresh_process(pid) {
        return Err(format!("process {} not visible", pid));
    }
    let process = sys
        .process(pid)
        .ok_or_else(|| format!("process {} not visible", pid))?;
    Ok(process.memory() as f64 / (1024.0 * 1024.0))
}
