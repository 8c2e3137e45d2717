use crate::adapters::cache::ResponseCache;
use crate::config::settings::Settings;
use crate::domain::model::{Collection, GameId, GameInfo, Guild, Member};
use crate::domain::ports::DataSource;
use crate::utils::error::{GuildError, Result, ServiceError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// `DataSource` backed by the service's JSON HTTP API.
pub struct HttpDataSource {
    client: Client,
    base_url: Url,
    cache: Option<ResponseCache>,
}

impl HttpDataSource {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| GuildError::InvalidConfigValueError {
            field: "service.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            cache: None,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let source = Self::new(
            &settings.service.base_url,
            settings.request_timeout(),
            &settings.service.user_agent,
        )?;
        Ok(match &settings.cache.directory {
            Some(dir) => source.with_cache(ResponseCache::new(dir, settings.cache.ttl_hours)?),
            None => source,
        })
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        tracing::debug!("Caching responses in {}", cache.directory().display());
        self.cache = Some(cache);
        self
    }

    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Fatal {
                message: format!("base URL {} cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> std::result::Result<T, ServiceError> {
        let cache_key = segments.join("/");

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(&cache_key).await {
                match serde_json::from_str(&body) {
                    Ok(value) => return Ok(value),
                    Err(e) => tracing::debug!("Cached body for {} unusable: {}", cache_key, e),
                }
            }
        }

        let url = self.endpoint(segments)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        tracing::debug!("{} -> {}", cache_key, status);

        if let Some(err) = status_error(status, &cache_key) {
            return Err(err);
        }

        let body = response.text().await.map_err(transport_error)?;
        let value = serde_json::from_str(&body).map_err(|e| ServiceError::Decode {
            message: format!("{}: {}", cache_key, e),
        })?;

        if let Some(cache) = &self.cache {
            cache.put(&cache_key, &body).await;
        }

        Ok(value)
    }
}

/// 202 表示服務端仍在排隊產生資料，需要稍後重試
fn status_error(status: StatusCode, resource: &str) -> Option<ServiceError> {
    if status == StatusCode::ACCEPTED
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        return Some(ServiceError::Retryable {
            message: format!("{} returned {}", resource, status),
        });
    }
    if status == StatusCode::NOT_FOUND {
        return Some(ServiceError::NotFound {
            resource: resource.to_string(),
        });
    }
    if !status.is_success() {
        return Some(ServiceError::Fatal {
            message: format!("{} returned {}", resource, status),
        });
    }
    None
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() || e.is_connect() {
        ServiceError::Retryable {
            message: e.to_string(),
        }
    } else {
        ServiceError::Fatal {
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_guild(&self, guild_id: u64) -> std::result::Result<Guild, ServiceError> {
        let id = guild_id.to_string();
        self.get_json(&["guild", id.as_str()]).await
    }

    async fn fetch_collection(
        &self,
        member: &Member,
    ) -> std::result::Result<Collection, ServiceError> {
        self.get_json(&["collection", member.as_str()]).await
    }

    async fn fetch_game(&self, game_id: GameId) -> std::result::Result<GameInfo, ServiceError> {
        let id = game_id.to_string();
        self.get_json(&["thing", id.as_str()]).await
    }
}
