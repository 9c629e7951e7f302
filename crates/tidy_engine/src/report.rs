//! System report - a short host summary gathered in-process.

use sysinfo::System;
use tracing::info;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SystemReport {
    pub hostname: String,
    pub platform: String,
    pub arch: String,
    pub os_version: String,
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub total_memory_gb: f64,
    pub free_memory_gb: f64,
    pub uptime_hours: f64,
}

impl SystemReport {
    /// Blocking: sysinfo reads /proc or WMI synchronously
    pub fn collect() -> Self {
        info!("Collecting system report");
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        let cpu_model = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            os_version: System::long_os_version()
                .or_else(System::os_version)
                .unwrap_or_else(|| "unknown".to_string()),
            cpu_model,
            cpu_cores: sys.cpus().len(),
            total_memory_gb: sys.total_memory() as f64 / GIB,
            free_memory_gb: sys.available_memory() as f64 / GIB,
            uptime_hours: System::uptime() as f64 / 3600.0,
        }
    }

    /// `key: value` lines, one per field
    pub fn render(&self) -> String {
        [
            format!("Hostname: {}", self.hostname),
            format!("Platform: {}", self.platform),
            format!("Architecture: {}", self.arch),
            format!("OS Version: {}", self.os_version),
            format!("CPU: {}", self.cpu_model),
            format!("Cores: {}", self.cpu_cores),
            format!("Total Memory: {:.2} GB", self.total_memory_gb),
            format!("Free Memory: {:.2} GB", self.free_memory_gb),
            format!("Uptime: {:.2} hours", self.uptime_hours),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let report = SystemReport {
            hostname: "build-01".to_string(),
            platform: "windows".to_string(),
            arch: "x86_64".to_string(),
            os_version: "Windows 11 Pro".to_string(),
            cpu_model: "Ryzen 7".to_string(),
            cpu_cores: 16,
            total_memory_gb: 31.9,
            free_memory_gb: 12.25,
            uptime_hours: 5.5,
        };
        let text = report.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "Hostname: build-01");
        assert_eq!(lines[5], "Cores: 16");
        assert_eq!(lines[6], "Total Memory: 31.90 GB");
        assert_eq!(lines[8], "Uptime: 5.50 hours");
    }

    #[test]
    fn test_collect_live_host() {
        let report = SystemReport::collect();
        assert_eq!(report.platform, std::env::consts::OS);
        assert!(!report.hostname.is_empty());
        assert!(report.total_memory_gb >= 0.0);
    }
}
