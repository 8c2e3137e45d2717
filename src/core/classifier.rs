use crate::domain::model::{GameClassification, GameId, GameInfo, GameMeta, RatingTable};
use crate::domain::ports::DataSource;
use crate::utils::retry::{retry_transient, RetryPolicy};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};

/// Missing categories mean the game cannot be classified and is left out.
pub fn classify(info: &GameInfo, expansion_category: &str, default_rating: f64) -> GameClassification {
    match &info.categories {
        None => GameClassification::Unknown,
        Some(categories) if categories.iter().any(|c| c == expansion_category) => {
            GameClassification::Expansion
        }
        Some(_) => GameClassification::FullGame {
            id: info.id,
            rating: info.rating.unwrap_or(default_rating),
        },
    }
}

/// Formats a rating the way downstream consumers expect (`7.0`, not `7`).
pub fn format_rating(rating: f64) -> String {
    if rating.is_finite() && rating.fract() == 0.0 && rating.abs() < 1e16 {
        format!("{:.1}", rating)
    } else {
        rating.to_string()
    }
}

#[derive(Debug, Default)]
pub struct ClassifiedGames {
    /// Only full games remain.
    pub ratings: RatingTable,
    pub game_info: BTreeMap<GameId, GameMeta>,
    pub expansions: usize,
    pub unresolved: usize,
}

pub struct GameClassifier<'a, D: DataSource + ?Sized> {
    source: &'a D,
    retry: &'a RetryPolicy,
    expansion_category: &'a str,
    default_rating: f64,
    concurrency: usize,
}

impl<'a, D: DataSource + ?Sized> GameClassifier<'a, D> {
    pub fn new(
        source: &'a D,
        retry: &'a RetryPolicy,
        expansion_category: &'a str,
        default_rating: f64,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            retry,
            expansion_category,
            default_rating,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn classify_all(&self, mut ratings: RatingTable) -> ClassifiedGames {
        let ids = ratings.ids();

        let classifications: Vec<(GameId, GameClassification)> = stream::iter(ids)
            .map(|id| async move {
                let operation = format!("game {}", id);
                let result =
                    retry_transient(&operation, self.retry, || self.source.fetch_game(id)).await;
                let classification = match result {
                    Ok(info) => classify(&info, self.expansion_category, self.default_rating),
                    Err(e) => {
                        tracing::warn!("Could not classify game {}: {}", id, e);
                        GameClassification::Unknown
                    }
                };
                (id, classification)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut result = ClassifiedGames::default();
        let mut keep = BTreeSet::new();
        for (id, classification) in classifications {
            match classification {
                GameClassification::FullGame { rating, .. } => {
                    result.game_info.insert(
                        id,
                        GameMeta {
                            id: id.to_string(),
                            rating: format_rating(rating),
                        },
                    );
                    keep.insert(id);
                }
                GameClassification::Expansion => {
                    tracing::debug!("Game {} is an expansion, dropping", id);
                    result.expansions += 1;
                }
                GameClassification::Unknown => {
                    tracing::debug!("Game {} has no usable categories, dropping", id);
                    result.unresolved += 1;
                }
            }
        }

        ratings.retain(|id, _| keep.contains(&id));
        result.ratings = ratings;

        tracing::info!(
            "Classified games: {} full games, {} expansions, {} unresolved",
            result.ratings.len(),
            result.expansions,
            result.unresolved
        );

        result
    }
}
