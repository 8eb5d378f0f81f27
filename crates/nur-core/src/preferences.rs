//! Per-prayer reminder preferences.
//!
//! Owned by the settings store (the TOML config); the reminder scheduler
//! only reads them. Missing entries fall back to "enabled, at prayer time".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::prayer::Prayer;

/// Lead times offered by the settings UI, in minutes before the prayer.
pub const LEAD_TIME_OPTIONS: [u32; 4] = [0, 5, 10, 15];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPreferences {
    #[serde(default = "default_enabled")]
    pub enabled: BTreeMap<Prayer, bool>,
    #[serde(default = "default_lead_minutes")]
    pub lead_minutes: BTreeMap<Prayer, u32>,
}

fn default_enabled() -> BTreeMap<Prayer, bool> {
    Prayer::ALL.into_iter().map(|p| (p, true)).collect()
}

fn default_lead_minutes() -> BTreeMap<Prayer, u32> {
    Prayer::ALL.into_iter().map(|p| (p, 0)).collect()
}

impl Default for ReminderPreferences {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            lead_minutes: default_lead_minutes(),
        }
    }
}

impl ReminderPreferences {
    pub fn is_enabled(&self, prayer: Prayer) -> bool {
        self.enabled.get(&prayer).copied().unwrap_or(true)
    }

    pub fn lead_minutes(&self, prayer: Prayer) -> u32 {
        self.lead_minutes.get(&prayer).copied().unwrap_or(0)
    }

    pub fn set_enabled(&mut self, prayer: Prayer, enabled: bool) {
        self.enabled.insert(prayer, enabled);
    }

    pub fn set_lead_minutes(&mut self, prayer: Prayer, minutes: u32) {
        self.lead_minutes.insert(prayer, minutes);
    }

    pub fn enabled_count(&self) -> usize {
        Prayer::ALL.into_iter().filter(|p| self.is_enabled(*p)).count()
    }
}

/// Label shown next to a lead time option.
pub fn lead_time_label(minutes: u32) -> String {
    match minutes {
        0 => "At prayer time".to_string(),
        m => format!("{m} minutes before"),
    }
}
