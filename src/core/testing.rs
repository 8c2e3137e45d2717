//! In-memory data source for pipeline tests.

use crate::domain::model::{Collection, CollectionItem, GameId, GameInfo, Guild, Member};
use crate::domain::ports::DataSource;
use crate::utils::error::ServiceError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn item(id: GameId, name: &str, rating: Option<f64>) -> CollectionItem {
    CollectionItem {
        id,
        name: name.to_string(),
        rating,
    }
}

pub fn full_game(id: GameId, rating: Option<f64>) -> GameInfo {
    GameInfo {
        id,
        name: None,
        rating,
        categories: Some(vec!["Strategy".to_string()]),
    }
}

pub fn expansion(id: GameId) -> GameInfo {
    GameInfo {
        id,
        name: None,
        rating: Some(7.0),
        categories: Some(vec!["Expansion for Base-game".to_string()]),
    }
}

#[derive(Default)]
pub struct FakeSource {
    guilds: HashMap<u64, Guild>,
    collections: HashMap<Member, Result<Collection, ServiceError>>,
    games: HashMap<GameId, Result<GameInfo, ServiceError>>,
    stalled: HashSet<GameId>,
    transient: Mutex<HashMap<Member, u32>>,
    calls: Mutex<HashMap<Member, u32>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guild(mut self, id: u64, members: &[&str]) -> Self {
        self.guilds.insert(
            id,
            Guild {
                id,
                name: format!("Guild {}", id),
                members: members.iter().map(|m| m.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_collection(mut self, member: &str, items: Vec<CollectionItem>) -> Self {
        self.collections
            .insert(member.to_string(), Ok(Collection { items }));
        self
    }

    pub fn with_collection_error(mut self, member: &str, error: ServiceError) -> Self {
        self.collections.insert(member.to_string(), Err(error));
        self
    }

    /// The next `count` fetches for `member` fail with a retryable error.
    pub fn with_transient_failures(self, member: &str, count: u32) -> Self {
        if let Ok(mut transient) = self.transient.lock() {
            transient.insert(member.to_string(), count);
        }
        self
    }

    pub fn with_game(mut self, info: GameInfo) -> Self {
        self.games.insert(info.id, Ok(info));
        self
    }

    pub fn with_game_error(mut self, id: GameId, error: ServiceError) -> Self {
        self.games.insert(id, Err(error));
        self
    }

    /// Metadata lookups for `id` never complete.
    pub fn with_stalled_game(mut self, id: GameId) -> Self {
        self.stalled.insert(id);
        self
    }

    pub fn collection_calls(&self, member: &str) -> u32 {
        self.calls
            .lock()
            .map(|calls| calls.get(member).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn fetch_guild(&self, guild_id: u64) -> Result<Guild, ServiceError> {
        self.guilds
            .get(&guild_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                resource: format!("guild/{}", guild_id),
            })
    }

    async fn fetch_collection(&self, member: &Member) -> Result<Collection, ServiceError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(member.clone()).or_insert(0) += 1;
        }
        if let Ok(mut transient) = self.transient.lock() {
            if let Some(remaining) = transient.get_mut(member) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ServiceError::Retryable {
                        message: "collection queued".to_string(),
                    });
                }
            }
        }
        self.collections
            .get(member)
            .cloned()
            .unwrap_or_else(|| {
                Err(ServiceError::NotFound {
                    resource: format!("collection/{}", member),
                })
            })
    }

    async fn fetch_game(&self, game_id: GameId) -> Result<GameInfo, ServiceError> {
        if self.stalled.contains(&game_id) {
            std::future::pending::<()>().await;
        }
        self.games.get(&game_id).cloned().unwrap_or_else(|| {
            Err(ServiceError::NotFound {
                resource: format!("thing/{}", game_id),
            })
        })
    }
}
