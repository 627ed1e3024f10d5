use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{JobStatus, NewScrapeSettings, ScrapeSettings};
use crate::database::schema::scrape_settings;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;

/// Settings repository trait - persistence of the scrape job configuration
pub trait SettingsRepository: Send + Sync {
    /// Find settings record by key
    fn find(&self, key: &str) -> Result<Option<ScrapeSettings>, DatabaseError>;

    /// Insert a new settings record
    fn insert(&self, new_settings: NewScrapeSettings) -> Result<ScrapeSettings, DatabaseError>;

    /// Delete settings record by key, returns true if a record was removed
    fn delete(&self, key: &str) -> Result<bool, DatabaseError>;

    /// Mark a record stopped, returns number of records updated
    fn mark_stopped(&self, key: &str, stopped_at: DateTime<Utc>) -> Result<usize, DatabaseError>;

    /// Mark every running record stopped (shutdown reconciliation)
    fn stop_all_running(&self, stopped_at: DateTime<Utc>) -> Result<usize, DatabaseError>;
}

/// Diesel implementation of SettingsRepository
pub struct SettingsRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl SettingsRepositoryImpl {
    /// Create new settings repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

impl SettingsRepository for SettingsRepositoryImpl {
    fn find(&self, key: &str) -> Result<Option<ScrapeSettings>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        scrape_settings::table
            .filter(scrape_settings::key.eq(key))
            .select(ScrapeSettings::as_select())
            .first::<ScrapeSettings>(&mut conn)
            .optional()
            .map_err(DatabaseError::from)
    }

    fn insert(&self, new_settings: NewScrapeSettings) -> Result<ScrapeSettings, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        diesel::insert_into(scrape_settings::table)
            .values(&new_settings)
            .returning(ScrapeSettings::as_returning())
            .get_result::<ScrapeSettings>(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let deleted = diesel::delete(scrape_settings::table)
            .filter(scrape_settings::key.eq(key))
            .execute(&mut conn)?;

        Ok(deleted > 0)
    }

    fn mark_stopped(&self, key: &str, stopped_at: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let updated = diesel::update(scrape_settings::table)
            .filter(scrape_settings::key.eq(key))
            .set((
                scrape_settings::status.eq(JobStatus::Stopped.as_str()),
                scrape_settings::stopped_at.eq(Some(stopped_at)),
            ))
            .execute(&mut conn)?;

        Ok(updated)
    }

    fn stop_all_running(&self, stopped_at: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let updated = diesel::update(scrape_settings::table)
            .filter(scrape_settings::status.eq(JobStatus::Running.as_str()))
            .set((
                scrape_settings::status.eq(JobStatus::Stopped.as_str()),
                scrape_settings::stopped_at.eq(Some(stopped_at)),
            ))
            .execute(&mut conn)?;

        tracing::info!("Marked {} running settings record(s) stopped", updated);

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    // Tests require actual database connection - the in-memory store covers the contract
    #[test]
    #[ignore]
    fn test_settings_repository() {}
}
