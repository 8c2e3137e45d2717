use crate::core::ranker::GuildRanker;
use crate::core::reporter::render_json;
use crate::domain::model::RunReport;
use crate::domain::ports::{DataSource, Storage};
use crate::utils::error::{GuildError, Result};
use std::future::Future;

/// Runs the ranking for one guild and writes the report once, after every
/// stage has finished.
pub struct RankingEngine<D: DataSource, S: Storage> {
    ranker: GuildRanker<D>,
    storage: S,
}

impl<D: DataSource, S: Storage> RankingEngine<D, S> {
    pub fn new(ranker: GuildRanker<D>, storage: S) -> Self {
        Self { ranker, storage }
    }

    pub async fn run(&self, guild_id: u64, output: &str) -> Result<String> {
        self.run_until(guild_id, output, std::future::pending::<()>())
            .await
    }

    /// Like [`run`](Self::run), but gives up when `shutdown` resolves while
    /// the report is still being produced.
    ///
    /// Once rendering is done the write is no longer raced, so a shutdown
    /// signal can never leave a partial report behind.
    pub async fn run_until<F>(&self, guild_id: u64, output: &str, shutdown: F) -> Result<String>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Ranking games for guild {}", guild_id);

        let (report, body) = tokio::select! {
            produced = self.produce(guild_id) => produced?,
            _ = shutdown => {
                tracing::warn!("Interrupted, discarding partial results");
                return Err(GuildError::Interrupted);
            }
        };

        let location = self.storage.write_file(output, &body).await?;
        tracing::info!(
            "Wrote {} ranked games ({} bytes) to {}",
            report.game_ratings.len(),
            body.len(),
            location
        );

        Ok(location)
    }

    async fn produce(&self, guild_id: u64) -> Result<(RunReport, Vec<u8>)> {
        let report = self.ranker.run(guild_id).await?;
        let body = render_json(&report)?;
        Ok((report, body))
    }
}
