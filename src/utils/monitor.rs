#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ResourceStats {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

/// Logs process CPU and memory at stage boundaries when enabled.
#[cfg(feature = "cli")]
pub struct ResourceMonitor {
    state: Option<Mutex<MonitorState>>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl ResourceMonitor {
    pub fn new(enabled: bool) -> Self {
        let state = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => {
                    let mut system = System::new();
                    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                    Some(Mutex::new(MonitorState {
                        system,
                        pid,
                        peak_memory_mb: 0,
                    }))
                }
                Err(e) => {
                    tracing::warn!("Resource monitoring unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            state,
            start_time: Instant::now(),
        }
    }

    pub fn stats(&self) -> Option<ResourceStats> {
        let mut state = self.state.as_ref()?.lock().ok()?;
        let pid = state.pid;
        state
            .system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let process = state.system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let cpu_usage = process.cpu_usage();
        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);

        Some(ResourceStats {
            cpu_usage,
            memory_mb,
            peak_memory_mb: state.peak_memory_mb,
            elapsed: self.start_time.elapsed(),
        })
    }

    pub fn log_stage(&self, stage: &str) {
        if let Some(stats) = self.stats() {
            tracing::info!(
                stage,
                "📊 CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                stats.cpu_usage,
                stats.memory_mb,
                stats.peak_memory_mb,
                stats.elapsed
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

// 非 CLI 建置不帶 sysinfo
#[cfg(not(feature = "cli"))]
pub struct ResourceMonitor;

#[cfg(not(feature = "cli"))]
impl ResourceMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stage(&self, _stage: &str) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
