//! SQLite implementation of [`QuotaStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use throttler_common::{ChannelId, Result, RoleId, ThrottlerError, UserId};
use throttler_config::DatabaseConfig;
use tracing::{debug, info, instrument};

use super::QuotaStore;
use crate::clock::{Clock, RolloverSchedule};
use crate::model::{ChannelSettings, RoleQuota, UserRecord};

/// Database schema version for migrations
const SCHEMA_VERSION: i32 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

trait DbContext<T> {
    fn db_context(self, what: &str) -> Result<T>;
}

impl<T> DbContext<T> for std::result::Result<T, sqlx::Error> {
    fn db_context(self, what: &str) -> Result<T> {
        self.map_err(|e| ThrottlerError::database_with_source(what, e))
    }
}

// Snowflakes fit in 63 bits; the cast only reinterprets the sign bit.
#[allow(clippy::cast_possible_wrap)]
const fn sql_id(id: u64) -> i64 {
    id as i64
}

#[allow(clippy::cast_sign_loss)]
const fn from_sql_id(id: i64) -> u64 {
    id as u64
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Persistent quota store on a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteQuotaStore {
    pool: SqlitePool,
    schedule: RolloverSchedule,
    clock: Arc<dyn Clock>,
}

impl SqliteQuotaStore {
    /// Open (creating if needed) the database file and bootstrap the schema.
    pub async fn connect(
        config: &DatabaseConfig,
        schedule: RolloverSchedule,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        info!(path = %config.path.display(), "opening quota database");

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .db_context("failed to open quota database")?;

        Self::with_pool(pool, schedule, clock).await
    }

    /// Private in-memory database, for tests and dry runs.
    pub async fn in_memory(schedule: RolloverSchedule, clock: Arc<dyn Clock>) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .db_context("invalid in-memory database options")?;
        // Every connection to `:memory:` is a separate database, so pin one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .db_context("failed to open in-memory database")?;

        Self::with_pool(pool, schedule, clock).await
    }

    /// Wrap an existing pool and bootstrap the schema.
    pub async fn with_pool(
        pool: SqlitePool,
        schedule: RolloverSchedule,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = Self {
            pool,
            schedule,
            clock,
        };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize the database schema
    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await
        .db_context("failed to create schema_version table")?;

        let current_version: Option<i32> =
            sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .db_context("failed to read schema version")?;

        match current_version {
            Some(version) if version >= SCHEMA_VERSION => {
                debug!("Database schema is up to date (version {})", version);
                return Ok(());
            }
            Some(version) => {
                info!("Upgrading database schema from version {} to {}", version, SCHEMA_VERSION);
            }
            None => {
                info!("Creating initial database schema (version {})", SCHEMA_VERSION);
            }
        }

        let statements = [
            r"
            CREATE TABLE IF NOT EXISTS quota_usage (
                user_id INTEGER NOT NULL,
                channel_id INTEGER NOT NULL,
                count INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0),
                last_reset_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, channel_id)
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS channel_settings (
                channel_id INTEGER PRIMARY KEY,
                enabled BOOLEAN NOT NULL DEFAULT 0,
                suppress_bot BOOLEAN NOT NULL DEFAULT 1
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                hinted INTEGER NOT NULL DEFAULT 0,
                next_hint_at INTEGER NOT NULL DEFAULT 0
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS role_quotas (
                role_id INTEGER NOT NULL,
                channel_id INTEGER NOT NULL,
                quota INTEGER NOT NULL DEFAULT -1,
                priority INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (role_id, channel_id)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_role_quotas_channel ON role_quotas (channel_id, priority DESC)",
        ];

        let mut tx = self.pool.begin().await.db_context("failed to begin schema transaction")?;
        for statement in statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .db_context("failed to create table")?;
        }
        sqlx::query("INSERT OR REPLACE INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(&mut *tx)
            .await
            .db_context("failed to record schema version")?;
        tx.commit().await.db_context("failed to commit schema")?;

        info!("Database schema initialized");
        Ok(())
    }

    fn now_wall(&self) -> i64 {
        self.schedule.wall_millis(self.clock.now())
    }
}

#[async_trait]
impl QuotaStore for SqliteQuotaStore {
    #[instrument(skip(self), level = "trace")]
    async fn try_rollover_if_due(&self, user: UserId, channel: ChannelId) -> Result<bool> {
        let now = self.clock.now();
        let result = sqlx::query(
            r"
            UPDATE quota_usage
            SET count = 0, last_reset_at = ?1
            WHERE user_id = ?2 AND channel_id = ?3 AND last_reset_at < ?4
            ",
        )
        .bind(self.schedule.wall_millis(now))
        .bind(sql_id(user.get()))
        .bind(sql_id(channel.get()))
        .bind(self.schedule.boundary_millis(now))
        .execute(&self.pool)
        .await
        .db_context("failed to roll over quota usage")?;

        let rolled = result.rows_affected() > 0;
        if rolled {
            debug!(%user, %channel, "daily usage reset");
        }
        Ok(rolled)
    }

    async fn get_usage(&self, user: UserId, channel: ChannelId) -> Result<Option<i64>> {
        self.try_rollover_if_due(user, channel).await?;

        sqlx::query_scalar("SELECT count FROM quota_usage WHERE user_id = ?1 AND channel_id = ?2")
            .bind(sql_id(user.get()))
            .bind(sql_id(channel.get()))
            .fetch_optional(&self.pool)
            .await
            .db_context("failed to read quota usage")
    }

    async fn reset_usage(&self, user: UserId, channel: ChannelId) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO quota_usage (user_id, channel_id, count, last_reset_at)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT (user_id, channel_id)
            DO UPDATE SET count = 0, last_reset_at = excluded.last_reset_at
            ",
        )
        .bind(sql_id(user.get()))
        .bind(sql_id(channel.get()))
        .bind(self.now_wall())
        .execute(&self.pool)
        .await
        .db_context("failed to reset quota usage")?;
        Ok(())
    }

    async fn increase_usage(&self, user: UserId, channel: ChannelId, delta: u32) -> Result<i64> {
        sqlx::query_scalar(
            r"
            INSERT INTO quota_usage (user_id, channel_id, count, last_reset_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id, channel_id)
            DO UPDATE SET count = count + excluded.count
            RETURNING count
            ",
        )
        .bind(sql_id(user.get()))
        .bind(sql_id(channel.get()))
        .bind(i64::from(delta))
        .bind(self.now_wall())
        .fetch_one(&self.pool)
        .await
        .db_context("failed to increase quota usage")
    }

    async fn decrease_usage(&self, user: UserId, channel: ChannelId, delta: u32) -> Result<Option<i64>> {
        sqlx::query_scalar(
            r"
            UPDATE quota_usage
            SET count = count - ?3
            WHERE user_id = ?1 AND channel_id = ?2 AND count >= ?3
            RETURNING count
            ",
        )
        .bind(sql_id(user.get()))
        .bind(sql_id(channel.get()))
        .bind(i64::from(delta))
        .fetch_optional(&self.pool)
        .await
        .db_context("failed to decrease quota usage")
    }

    async fn channel_settings(&self, channel: ChannelId) -> Result<Option<ChannelSettings>> {
        let row: Option<(bool, bool)> =
            sqlx::query_as("SELECT enabled, suppress_bot FROM channel_settings WHERE channel_id = ?1")
                .bind(sql_id(channel.get()))
                .fetch_optional(&self.pool)
                .await
                .db_context("failed to read channel settings")?;

        Ok(row.map(|(enabled, suppress_bot)| ChannelSettings {
            channel_id: channel,
            enabled,
            suppress_bot,
        }))
    }

    async fn set_channel_enabled(&self, channel: ChannelId, enabled: bool) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO channel_settings (channel_id, enabled) VALUES (?1, ?2)
            ON CONFLICT (channel_id) DO UPDATE SET enabled = excluded.enabled
            ",
        )
        .bind(sql_id(channel.get()))
        .bind(enabled)
        .execute(&self.pool)
        .await
        .db_context("failed to update channel enabled flag")?;
        Ok(())
    }

    async fn set_channel_suppress_bot(&self, channel: ChannelId, suppress_bot: bool) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO channel_settings (channel_id, suppress_bot) VALUES (?1, ?2)
            ON CONFLICT (channel_id) DO UPDATE SET suppress_bot = excluded.suppress_bot
            ",
        )
        .bind(sql_id(channel.get()))
        .bind(suppress_bot)
        .execute(&self.pool)
        .await
        .db_context("failed to update channel suppress_bot flag")?;
        Ok(())
    }

    async fn user_record(&self, user: UserId) -> Result<Option<UserRecord>> {
        let row: Option<(i64, i64)> =
            sqlx::query_as("SELECT hinted, next_hint_at FROM users WHERE user_id = ?1")
                .bind(sql_id(user.get()))
                .fetch_optional(&self.pool)
                .await
                .db_context("failed to read user record")?;

        Ok(row.map(|(hinted, next_hint_at)| UserRecord {
            user_id: user,
            hinted: u32::try_from(hinted).unwrap_or(u32::MAX),
            next_hint_at: from_millis(next_hint_at),
        }))
    }

    async fn record_hint(&self, user: UserId, next_hint_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (user_id, hinted, next_hint_at) VALUES (?1, 1, ?2)
            ON CONFLICT (user_id)
            DO UPDATE SET hinted = hinted + 1, next_hint_at = excluded.next_hint_at
            ",
        )
        .bind(sql_id(user.get()))
        .bind(next_hint_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .db_context("failed to record hint")?;
        Ok(())
    }

    async fn role_quotas(&self, channel: ChannelId) -> Result<Vec<RoleQuota>> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            r"
            SELECT role_id, quota, priority FROM role_quotas
            WHERE channel_id = ?1
            ORDER BY priority DESC, role_id ASC
            ",
        )
        .bind(sql_id(channel.get()))
        .fetch_all(&self.pool)
        .await
        .db_context("failed to list role quotas")?;

        Ok(rows
            .into_iter()
            .map(|(role_id, quota, priority)| RoleQuota {
                role_id: RoleId(from_sql_id(role_id)),
                channel_id: channel,
                quota,
                priority,
            })
            .collect())
    }

    async fn top_role_quota(&self, channel: ChannelId, roles: &[RoleId]) -> Result<Option<RoleQuota>> {
        if roles.is_empty() {
            return Ok(None);
        }

        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT role_id, quota, priority FROM role_quotas WHERE channel_id = ");
        builder.push_bind(sql_id(channel.get()));
        builder.push(" AND role_id IN (");
        let mut separated = builder.separated(", ");
        for role in roles {
            separated.push_bind(sql_id(role.get()));
        }
        separated.push_unseparated(") ORDER BY priority DESC, role_id ASC LIMIT 1");

        let row: Option<(i64, i64, i64)> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .db_context("failed to resolve role quota")?;

        Ok(row.map(|(role_id, quota, priority)| RoleQuota {
            role_id: RoleId(from_sql_id(role_id)),
            channel_id: channel,
            quota,
            priority,
        }))
    }

    async fn configure_role_quota(&self, quota: RoleQuota) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO role_quotas (role_id, channel_id, quota, priority) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (role_id, channel_id)
            DO UPDATE SET quota = excluded.quota, priority = excluded.priority
            ",
        )
        .bind(sql_id(quota.role_id.get()))
        .bind(sql_id(quota.channel_id.get()))
        .bind(quota.quota)
        .bind(quota.priority)
        .execute(&self.pool)
        .await
        .db_context("failed to configure role quota")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    async fn store() -> SqliteQuotaStore {
        let schedule = RolloverSchedule::from_offset_hours(8).unwrap();
        SqliteQuotaStore::in_memory(schedule, Arc::new(SystemClock)).await.unwrap()
    }

    #[tokio::test]
    async fn test_schema_bootstrap_is_repeatable() {
        let store = store().await;
        store.initialize_schema().await.unwrap();

        let version: i32 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_missing_rows_are_none() {
        let store = store().await;
        assert_eq!(store.get_usage(UserId(1), ChannelId(2)).await.unwrap(), None);
        assert_eq!(store.channel_settings(ChannelId(2)).await.unwrap(), None);
        assert_eq!(store.user_record(UserId(1)).await.unwrap(), None);
        assert_eq!(store.top_role_quota(ChannelId(2), &[]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_large_snowflakes_survive() {
        let store = store().await;
        let user = UserId(1_290_664_871_993_806_932);
        let channel = ChannelId(1_100_000_000_000_000_001);
        store.increase_usage(user, channel, 2).await.unwrap();
        assert_eq!(store.get_usage(user, channel).await.unwrap(), Some(2));

        let role = RoleId(1_200_000_000_000_000_002);
        store
            .configure_role_quota(RoleQuota { role_id: role, channel_id: channel, quota: 4, priority: 1 })
            .await
            .unwrap();
        let top = store.top_role_quota(channel, &[role]).await.unwrap().unwrap();
        assert_eq!(top.role_id, role);
    }
}
