use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Planned,
    InProgress,
    Completed,
    Delayed,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 4] = [
        DeliveryStatus::Planned,
        DeliveryStatus::InProgress,
        DeliveryStatus::Completed,
        DeliveryStatus::Delayed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Planned => "planned",
            DeliveryStatus::InProgress => "in-progress",
            DeliveryStatus::Completed => "completed",
            DeliveryStatus::Delayed => "delayed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "planned" => Some(DeliveryStatus::Planned),
            "in-progress" => Some(DeliveryStatus::InProgress),
            "completed" => Some(DeliveryStatus::Completed),
            "delayed" => Some(DeliveryStatus::Delayed),
            _ => None,
        }
    }
}

// External rows sometimes carry status values this build does not know about.
// Those normalize to `planned` with a logged warning instead of failing the row.
impl<'de> Deserialize<'de> for DeliveryStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(DeliveryStatus::parse(&raw).unwrap_or_else(|| {
            tracing::warn!(value = %raw, "unknown delivery status, defaulting to planned");
            DeliveryStatus::Planned
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub driver: String,
    pub vehicle: String,
    pub origin: String,
    pub destination: String,
    pub status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
