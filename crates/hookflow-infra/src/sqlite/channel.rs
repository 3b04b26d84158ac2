//! SQLite channel repository implementation.

use sqlx::Row;

use hookflow_core::repository::channel::ChannelRepository;
use hookflow_types::error::RepositoryError;
use hookflow_types::id::{ChannelId, TenantId};
use hookflow_types::message::Channel;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

pub struct SqliteChannelRepository {
    pool: DatabasePool,
}

impl SqliteChannelRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn channel_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Channel, RepositoryError> {
    let created_at: String = row.try_get("created_at").map_err(query_error)?;
    Ok(Channel {
        id: ChannelId::from(row.try_get::<String, _>("id").map_err(query_error)?),
        tenant_id: TenantId::from(row.try_get::<String, _>("tenant_id").map_err(query_error)?),
        channel_type: row.try_get("channel_type").map_err(query_error)?,
        name: row.try_get("name").map_err(query_error)?,
        provider: row.try_get("provider").map_err(query_error)?,
        is_active: row.try_get("is_active").map_err(query_error)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl ChannelRepository for SqliteChannelRepository {
    async fn find_channel(
        &self,
        tenant_id: &TenantId,
        channel_id: &ChannelId,
    ) -> Result<Option<Channel>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM channels WHERE id = ? AND tenant_id = ?")
            .bind(channel_id.as_str())
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(channel_from_row).transpose()
    }

    async fn save_channel(&self, channel: &Channel) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO channels (id, tenant_id, channel_type, name, provider, is_active, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 channel_type = excluded.channel_type,
                 name = excluded.name,
                 provider = excluded.provider,
                 is_active = excluded.is_active
               WHERE channels.tenant_id = excluded.tenant_id"#,
        )
        .bind(channel.id.as_str())
        .bind(channel.tenant_id.as_str())
        .bind(&channel.channel_type)
        .bind(&channel.name)
        .bind(&channel.provider)
        .bind(channel.is_active)
        .bind(format_datetime(&channel.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }
}
