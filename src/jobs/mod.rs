//! Scheduled Jobs
//!
//! Background jobs for periodic maintenance. The offer archival sweep runs on
//! a fixed interval and is idempotent, so a missed or repeated tick is
//! harmless.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;

use crate::error::AppError;
use crate::stock::StockManager;

/// Archive every offer whose cutoff has passed.
///
/// Delegates to the stock manager's sweep; returns the number of offers
/// archived in this pass.
pub async fn archive_due_offers(pool: &PgPool) -> Result<u64, JobError> {
    let archived = StockManager::new(pool.clone()).archive_due().await?;
    Ok(archived)
}

/// Delete expired auth tokens.
pub async fn delete_expired_auth_tokens(pool: &PgPool) -> Result<u64, JobError> {
    let result = sqlx::query(
        r#"
        DELETE FROM auth_tokens
        WHERE expires_at < NOW()
        "#,
    )
    .execute(pool)
    .await
    .map_err(AppError::from)?;

    let rows_deleted = result.rows_affected();

    if rows_deleted > 0 {
        tracing::info!(rows_deleted, "Deleted expired auth tokens");
    }

    Ok(rows_deleted)
}

/// Configuration for the job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval between archival sweeps (default: 5 minutes)
    pub archive_interval: Duration,
    /// Interval between auth token cleanups (default: 1 hour)
    pub token_cleanup_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            archive_interval: Duration::from_secs(300),
            token_cleanup_interval: Duration::from_secs(3600),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    pool: PgPool,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a scheduler with the default intervals
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            config: JobSchedulerConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(pool: PgPool, config: JobSchedulerConfig) -> Self {
        Self { pool, config }
    }

    /// Start the job scheduler in the background.
    /// Returns a handle that can be used to abort the scheduler.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!("Job scheduler started");

        let mut archive_interval = interval(self.config.archive_interval);
        let mut token_interval = interval(self.config.token_cleanup_interval);

        loop {
            tokio::select! {
                _ = archive_interval.tick() => {
                    if let Err(e) = archive_due_offers(&self.pool).await {
                        tracing::error!(error = %e, "Offer archival sweep failed");
                    }
                }
                _ = token_interval.tick() => {
                    if let Err(e) = delete_expired_auth_tokens(&self.pool).await {
                        tracing::error!(error = %e, "Auth token cleanup failed");
                    }
                }
            }
        }
    }

    /// Run all maintenance jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match archive_due_offers(&self.pool).await {
            Ok(count) => report.offers_archived = count,
            Err(e) => report.errors.push(format!("Offer archival: {}", e)),
        }

        match delete_expired_auth_tokens(&self.pool).await {
            Ok(count) => report.auth_tokens_deleted = count,
            Err(e) => report.errors.push(format!("Token cleanup: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running maintenance jobs
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub offers_archived: u64,
    pub auth_tokens_deleted: u64,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_scheduler_config_default() {
        let config = JobSchedulerConfig::default();
        assert_eq!(config.archive_interval, Duration::from_secs(300));
        assert_eq!(config.token_cleanup_interval, Duration::from_secs(3600));
    }

    #[test]
    fn test_maintenance_report_default() {
        let report = MaintenanceReport::default();
        assert_eq!(report.offers_archived, 0);
        assert_eq!(report.auth_tokens_deleted, 0);
        assert!(report.errors.is_empty());
    }
}
