use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Fixed key of the scrape job settings record
pub const SCRAPE_SETTINGS_KEY: &str = "scrap_settings";

/// Persisted status of the scrape job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Stopped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Stopped => "stopped",
        }
    }

}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(JobStatus::Running),
            "stopped" => Ok(JobStatus::Stopped),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// Scrape job settings record
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::scrape_settings)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeSettings {
    #[serde(skip)]
    pub id: i64,
    pub key: String,
    /// Interval between scrape cycles in milliseconds
    #[serde(rename = "interval")]
    pub interval_ms: i64,
    /// "running" or "stopped"
    pub status: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
}

impl ScrapeSettings {
    pub fn job_status(&self) -> Option<JobStatus> {
        self.status.parse().ok()
    }
}

/// New settings record written on every start
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::scrape_settings)]
pub struct NewScrapeSettings {
    pub key: String,
    pub interval_ms: i64,
    pub status: String,
    pub started_at: DateTime<Utc>,
}

impl NewScrapeSettings {
    /// Fresh running record for the scrape job
    pub fn running(interval_ms: i64, started_at: DateTime<Utc>) -> Self {
        Self {
            key: SCRAPE_SETTINGS_KEY.to_string(),
            interval_ms,
            status: JobStatus::Running.as_str().to_string(),
            started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_settings() {
        let now = Utc::now();
        let settings = NewScrapeSettings::running(5000, now);

        assert_eq!(settings.key, SCRAPE_SETTINGS_KEY);
        assert_eq!(settings.interval_ms, 5000);
        assert_eq!(settings.status, "running");
        assert_eq!(settings.status.parse::<JobStatus>(), Ok(JobStatus::Running));
    }

    #[test]
    fn test_job_status_parse() {
        assert_eq!("stopped".parse::<JobStatus>(), Ok(JobStatus::Stopped));
        assert!("paused".parse::<JobStatus>().is_err());
        assert_eq!(JobStatus::Running.as_str().parse::<JobStatus>(), Ok(JobStatus::Running));
    }

    #[test]
    fn test_settings_serialize_shape() {
        let settings = ScrapeSettings {
            id: 1,
            key: SCRAPE_SETTINGS_KEY.to_string(),
            interval_ms: 3000,
            status: "stopped".to_string(),
            started_at: Utc::now(),
            stopped_at: None,
        };

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["interval"], 3000);
        assert_eq!(json["status"], "stopped");
        assert!(json.get("startedAt").is_some());
        assert!(json.get("stoppedAt").is_none());
        assert!(json.get("id").is_none());
    }
}
