use crate::domain::model::{Collection, GameId, GameInfo, Guild, Member};
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;

/// Remote hobby-tracking service: guild membership, collections and game metadata.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_guild(&self, guild_id: u64) -> std::result::Result<Guild, ServiceError>;
    async fn fetch_collection(&self, member: &Member)
        -> std::result::Result<Collection, ServiceError>;
    async fn fetch_game(&self, game_id: GameId) -> std::result::Result<GameInfo, ServiceError>;
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
