//! Repository for the offline report queue.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

use nirogya_core::reports::{
    OfflineReportRecord, ReportId, ReportPayload, ReportStatus, ReportStoreTrait,
};
use nirogya_core::Result;

use super::model::{NewOfflineReportDB, OfflineReportDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::offline_reports;

pub struct OfflineReportRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl OfflineReportRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ReportStoreTrait for OfflineReportRepository {
    async fn save_report(&self, payload: ReportPayload) -> Result<ReportId> {
        let row = NewOfflineReportDB::pending(
            Uuid::now_v7().to_string(),
            &payload,
            Utc::now().to_rfc3339(),
        )?;

        self.writer
            .exec(move |conn| {
                let id = diesel::insert_into(offline_reports::table)
                    .values(&row)
                    .returning(offline_reports::id)
                    .get_result::<i64>(conn)
                    .map_err(StorageError::from)?;
                Ok(id)
            })
            .await
    }

    fn get_pending_count(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = offline_reports::table
            .filter(offline_reports::status.eq(ReportStatus::Pending.as_str()))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count)
    }

    fn get_pending_reports(&self) -> Result<Vec<OfflineReportRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = offline_reports::table
            .filter(offline_reports::status.eq(ReportStatus::Pending.as_str()))
            .order(offline_reports::id.asc())
            .select(OfflineReportDB::as_select())
            .load::<OfflineReportDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter().map(OfflineReportRecord::try_from).collect()
    }

    fn get_report(&self, id: ReportId) -> Result<Option<OfflineReportRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let row = offline_reports::table
            .find(id)
            .select(OfflineReportDB::as_select())
            .first::<OfflineReportDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        row.map(OfflineReportRecord::try_from).transpose()
    }

    async fn mark_as_synced(&self, id: ReportId) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(
                    offline_reports::table
                        .find(id)
                        .filter(offline_reports::status.eq(ReportStatus::Pending.as_str())),
                )
                .set((
                    offline_reports::status.eq(ReportStatus::Synced.as_str()),
                    offline_reports::synced_at.eq(Some(Utc::now().to_rfc3339())),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn update_sync_attempt(&self, id: ReportId, error_message: String) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(
                    offline_reports::table
                        .find(id)
                        .filter(offline_reports::status.eq(ReportStatus::Pending.as_str())),
                )
                .set((
                    offline_reports::attempt_count.eq(offline_reports::attempt_count + 1),
                    offline_reports::last_error.eq(Some(error_message)),
                    offline_reports::last_attempt_at.eq(Some(Utc::now().to_rfc3339())),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn clear_synced_reports(&self) -> Result<usize> {
        self.writer
            .exec(|conn| {
                let removed = diesel::delete(
                    offline_reports::table
                        .filter(offline_reports::status.eq(ReportStatus::Synced.as_str())),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }
}
