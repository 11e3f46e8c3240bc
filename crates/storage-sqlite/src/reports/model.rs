//! Database models for the offline report queue.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use nirogya_core::reports::{OfflineReportRecord, ReportPayload, ReportStatus};
use nirogya_core::Result;

use crate::errors::StorageError;

#[derive(
    Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::offline_reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OfflineReportDB {
    pub id: i64,
    pub client_ref: String,
    pub patient: String,
    pub meta: String,
    pub status: String,
    pub attempt_count: i32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<String>,
    pub created_at: String,
    pub synced_at: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::offline_reports)]
pub struct NewOfflineReportDB {
    pub client_ref: String,
    pub patient: String,
    pub meta: String,
    pub status: String,
    pub attempt_count: i32,
    pub created_at: String,
}

impl NewOfflineReportDB {
    pub fn pending(client_ref: String, payload: &ReportPayload, created_at: String) -> Result<Self> {
        Ok(Self {
            client_ref,
            patient: serde_json::to_string(&payload.patient)?,
            meta: serde_json::to_string(&payload.meta)?,
            status: ReportStatus::Pending.as_str().to_string(),
            attempt_count: 0,
            created_at,
        })
    }
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::InvalidData(format!("Bad {} timestamp '{}': {}", column, value, e))
                .into()
        })
}

fn parse_optional_timestamp(column: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(column, v)).transpose()
}

impl TryFrom<OfflineReportDB> for OfflineReportRecord {
    type Error = nirogya_core::Error;

    fn try_from(row: OfflineReportDB) -> Result<Self> {
        let status = ReportStatus::parse(&row.status).ok_or_else(|| {
            StorageError::InvalidData(format!(
                "Unknown status '{}' on report {}",
                row.status, row.id
            ))
        })?;
        Ok(OfflineReportRecord {
            id: row.id,
            payload: ReportPayload {
                patient: serde_json::from_str(&row.patient)?,
                meta: serde_json::from_str(&row.meta)?,
            },
            status,
            attempt_count: row.attempt_count,
            last_error: row.last_error,
            last_attempt_at: parse_optional_timestamp(
                "last_attempt_at",
                row.last_attempt_at.as_deref(),
            )?,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            synced_at: parse_optional_timestamp("synced_at", row.synced_at.as_deref())?,
            client_ref: row.client_ref,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> OfflineReportDB {
        OfflineReportDB {
            id: 3,
            client_ref: "0190-abc".to_string(),
            patient: r#"{"name":"Rina","age":34}"#.to_string(),
            meta: r#"{"village":"Majuli"}"#.to_string(),
            status: "pending".to_string(),
            attempt_count: 1,
            last_error: Some("timeout".to_string()),
            last_attempt_at: Some("2025-03-01T10:00:00+00:00".to_string()),
            created_at: "2025-03-01T09:59:00+00:00".to_string(),
            synced_at: None,
        }
    }

    #[test]
    fn converts_row_to_record() {
        let record = OfflineReportRecord::try_from(row()).unwrap();
        assert_eq!(record.id, 3);
        assert_eq!(record.status, ReportStatus::Pending);
        assert_eq!(record.payload.patient["age"], 34);
        assert!(record.last_attempt_at.unwrap() > record.created_at);
    }

    #[test]
    fn rejects_unknown_status() {
        let mut bad = row();
        bad.status = "dead".to_string();
        assert!(OfflineReportRecord::try_from(bad).is_err());
    }
}
