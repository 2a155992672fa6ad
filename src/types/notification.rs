use serde::{Deserialize, Serialize};

/// Importance level handed to the notification layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationImportance {
    Min,
    Low,
    Default,
    High,
}

impl NotificationImportance {
    /// Integer level carried in the job payload.
    pub fn level(&self) -> i32 {
        match self {
            NotificationImportance::Min => 1,
            NotificationImportance::Low => 2,
            NotificationImportance::Default => 3,
            NotificationImportance::High => 4,
        }
    }

    pub fn from_level(level: i32) -> Self {
        match level {
            1 => NotificationImportance::Min,
            2 => NotificationImportance::Low,
            l if l >= 4 => NotificationImportance::High,
            _ => NotificationImportance::Default,
        }
    }
}

impl Default for NotificationImportance {
    fn default() -> Self {
        NotificationImportance::Default
    }
}

/// Who a notification is about, plus the presentation hints from the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    pub id: i32,
    pub file_name: String,
    pub icon: i32,
    pub importance: NotificationImportance,
}
