use sysinfo::System;

/// Host memory readings. Any field may be missing on platforms or sandboxes
/// that do not expose it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct HostSample {
    pub rss_bytes: Option<u64>,
    pub system_used_percent: Option<f64>,
}

/// Reusable host sampler; keeps one `sysinfo::System` alive between samples.
pub(crate) struct HostSampler {
    system: Option<System>,
}

impl HostSampler {
    pub fn new() -> Self {
        let system = sysinfo::IS_SUPPORTED_SYSTEM.then(System::new);
        if system.is_none() {
            tracing::debug!(
                target = "fanws.memory",
                "sysinfo does not support this platform; host memory stats will be zeroed"
            );
        }
        Self { system }
    }

    pub fn sample(&mut self) -> HostSample {
        let mut sample = HostSample {
            rss_bytes: current_rss_bytes(),
            system_used_percent: None,
        };

        let Some(system) = self.system.as_mut() else {
            return sample;
        };

        system.refresh_memory();
        let total = system.total_memory();
        if total > 0 {
            let used = system.used_memory().min(total);
            sample.system_used_percent = Some((used as f64 / total as f64) * 100.0);
        }

        if sample.rss_bytes.is_none() {
            if let Ok(pid) = sysinfo::get_current_pid() {
                if system.refresh_process(pid) {
                    sample.rss_bytes = system.process(pid).map(|process| process.memory());
                }
            }
        }

        sample
    }
}

/// Resident set size read from procfs. `None` outside Linux or when procfs is unavailable.
pub(crate) fn current_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let status = match std::fs::read_to_string("/proc/self/status") {
            Ok(status) => status,
            Err(err) => {
                // `/proc` may be missing in sandboxes; only log unexpected errors.
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(
                        target = "fanws.memory",
                        error = %err,
                        "failed to read /proc/self/status while sampling rss"
                    );
                }
                return None;
            }
        };
        parse_vm_rss(&status)
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    for line in status.lines() {
        let line = line.trim_start();
        let Some(rest) = line.strip_prefix("VmRSS:") else {
            continue;
        };
        let kb = rest.split_whitespace().next()?;
        return match kb.parse::<u64>() {
            Ok(kb) => Some(kb.saturating_mul(1024)),
            Err(err) => {
                static REPORTED: std::sync::OnceLock<()> = std::sync::OnceLock::new();
                if REPORTED.set(()).is_ok() {
                    tracing::debug!(
                        target = "fanws.memory",
                        value = kb,
                        error = %err,
                        "failed to parse VmRSS from /proc/self/status"
                    );
                }
                None
            }
        };
    }
    None
}
