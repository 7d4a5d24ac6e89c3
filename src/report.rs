use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sysinfo::{Disks, System};
use uuid::Uuid;

use crate::util::time;

/// Host application identity included in every report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub version: String,
    pub build: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            build: "dev".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryState {
    Charging,
    Discharging,
    Full,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryInfo {
    /// 0.0 to 1.0
    pub level: f32,
    pub state: BatteryState,
}

/// Snapshot of the device a report was filed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub model: String,
    pub os_version: String,
    pub app_version: String,
    pub build: String,
    pub locale: String,
    pub timezone: String,
    pub free_disk_bytes: Option<u64>,
    pub battery: Option<BatteryInfo>,
    pub uptime: Duration,
}

impl DeviceMetadata {
    /// Gather what the host OS exposes portably. Battery is left unset for
    /// the host to fill in.
    pub fn collect(app: &AppInfo) -> Self {
        let disks = Disks::new_with_refreshed_list();
        let free_disk_bytes = if disks.list().is_empty() {
            None
        } else {
            Some(disks.list().iter().map(|disk| disk.available_space()).sum())
        };

        Self {
            model: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            os_version: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            app_version: app.version.clone(),
            build: app.build.clone(),
            locale: current_locale(),
            timezone: chrono::Local::now().offset().to_string(),
            free_disk_bytes,
            battery: None,
            uptime: Duration::from_secs(System::uptime()),
        }
    }

    pub fn with_battery(mut self, battery: BatteryInfo) -> Self {
        self.battery = Some(battery);
        self
    }

    /// Label/value pairs in the order they appear in the device snapshot
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Model", self.model.clone()),
            ("OS", self.os_version.clone()),
            ("App Version", format!("{} ({})", self.app_version, self.build)),
            ("Battery", self.battery_label()),
            ("Free Disk", self.free_disk_label()),
            ("Locale / Timezone", format!("{} / {}", self.locale, self.timezone)),
            ("Uptime", time::format_uptime(self.uptime)),
        ]
    }

    fn battery_label(&self) -> String {
        match self.battery {
            Some(battery) => {
                let percent = (battery.level.clamp(0.0, 1.0) * 100.0).round() as u32;
                format!("{}% ({:?})", percent, battery.state)
            }
            None => "unknown".to_string(),
        }
    }

    fn free_disk_label(&self) -> String {
        match self.free_disk_bytes {
            Some(bytes) => format!("{:.1} GB", bytes as f64 / 1_000_000_000.0),
            None => "unknown".to_string(),
        }
    }
}

fn current_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.split('.').next().unwrap_or_default().to_string())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .unwrap_or_else(|| "en_US".to_string())
}

/// Where report metadata comes from
pub trait MetadataSource: Send + Sync {
    fn device_metadata(&self) -> DeviceMetadata;
}

/// Reads metadata from the running system
#[derive(Debug, Clone, Default)]
pub struct SystemMetadata {
    pub app: AppInfo,
}

impl MetadataSource for SystemMetadata {
    fn device_metadata(&self) -> DeviceMetadata {
        DeviceMetadata::collect(&self.app)
    }
}

impl MetadataSource for DeviceMetadata {
    fn device_metadata(&self) -> DeviceMetadata {
        self.clone()
    }
}

/// One feedback submission, produced per shake
#[derive(Debug, Clone)]
pub struct Report {
    id: Uuid,
    note: String,
    image: RgbaImage,
    metadata: DeviceMetadata,
}

impl Report {
    pub fn new(note: impl Into<String>, image: RgbaImage, metadata: DeviceMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            note: note.into(),
            image,
            metadata,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn metadata(&self) -> &DeviceMetadata {
        &self.metadata
    }
}
