use crate::config::settings::{DEFAULT_GAME_RATING, EXPANSION_CATEGORY, SIGNIFICANCE_RATIO};
use crate::core::classifier::GameClassifier;
use crate::core::collector::RatingCollector;
use crate::core::reporter::{build_report, ReportTotals};
use crate::core::significance::{filter_significant, significance_threshold};
use crate::domain::model::{GameId, Guild, RunReport};
use crate::domain::ports::DataSource;
use crate::utils::error::{GuildError, Result, ServiceError};
use crate::utils::monitor::ResourceMonitor;
use crate::utils::retry::{retry_transient, RetryPolicy};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct RankerOptions {
    pub ignored_games: BTreeSet<GameId>,
    pub significance_ratio: f64,
    pub expansion_category: String,
    pub default_rating: f64,
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Top-N cut applied to the ranked list only.
    pub limit: Option<usize>,
}

impl Default for RankerOptions {
    fn default() -> Self {
        Self {
            ignored_games: BTreeSet::new(),
            significance_ratio: SIGNIFICANCE_RATIO,
            expansion_category: EXPANSION_CATEGORY.to_string(),
            default_rating: DEFAULT_GAME_RATING,
            concurrency: 1,
            retry: RetryPolicy::default(),
            limit: None,
        }
    }
}

/// Runs collect → significance → classify → report for one guild.
pub struct GuildRanker<D: DataSource> {
    source: D,
    options: RankerOptions,
    monitor: ResourceMonitor,
}

impl<D: DataSource> GuildRanker<D> {
    pub fn new(source: D, options: RankerOptions) -> Self {
        Self {
            source,
            options,
            monitor: ResourceMonitor::new(false),
        }
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = ResourceMonitor::new(enabled);
        self
    }

    /// Only a failed guild lookup aborts the run; member and game failures
    /// just shrink the aggregates.
    pub async fn run(&self, guild_id: u64) -> Result<RunReport> {
        let guild = self.fetch_guild(guild_id).await?;
        tracing::info!(
            "Guild '{}' ({}) has {} members",
            guild.name,
            guild.id,
            guild.members.len()
        );

        let options = &self.options;

        let outcome = RatingCollector::new(
            &self.source,
            &options.ignored_games,
            &options.retry,
            options.concurrency,
        )
        .collect(&guild.members)
        .await;
        self.monitor.log_stage("collect");

        let fetched_collections = outcome.fetched_collections();
        let threshold = significance_threshold(fetched_collections, options.significance_ratio);
        let mut ratings = outcome.ratings;
        filter_significant(&mut ratings, threshold);

        let classified = GameClassifier::new(
            &self.source,
            &options.retry,
            &options.expansion_category,
            options.default_rating,
            options.concurrency,
        )
        .classify_all(ratings)
        .await;
        self.monitor.log_stage("classify");

        let totals = ReportTotals {
            threshold,
            total_members: guild.members.len(),
            fetched_collections,
        };
        let report = build_report(
            &classified.ratings,
            &classified.game_info,
            totals,
            options.limit,
        );
        self.monitor.log_stage("report");

        tracing::info!(
            "Ranked {} games from {} ratings",
            classified.ratings.len(),
            report.total_ratings
        );

        Ok(report)
    }

    async fn fetch_guild(&self, guild_id: u64) -> Result<Guild> {
        let operation = format!("guild {}", guild_id);
        retry_transient(&operation, &self.options.retry, || {
            self.source.fetch_guild(guild_id)
        })
        .await
        .map_err(|e| match e {
            ServiceError::NotFound { .. } => GuildError::GuildNotFound { guild_id },
            other => GuildError::GuildFetch {
                guild_id,
                source: other,
            },
        })
    }
}
