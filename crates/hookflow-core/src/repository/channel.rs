//! Channel lookup port.

use hookflow_types::error::RepositoryError;
use hookflow_types::id::{ChannelId, TenantId};
use hookflow_types::message::Channel;

/// Repository trait for messaging channel descriptors.
pub trait ChannelRepository: Send + Sync {
    fn find_channel(
        &self,
        tenant_id: &TenantId,
        channel_id: &ChannelId,
    ) -> impl std::future::Future<Output = Result<Option<Channel>, RepositoryError>> + Send;

    fn save_channel(
        &self,
        channel: &Channel,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
