use crate::domain::model::{Collection, GameId, Member, RatingTable};
use crate::domain::ports::DataSource;
use crate::utils::retry::{retry_transient, RetryPolicy};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};

/// Result of walking every guild member.
#[derive(Debug, Default)]
pub struct CollectionOutcome {
    pub ratings: RatingTable,
    /// Successfully fetched, non-empty collections.
    pub collections: BTreeMap<Member, Collection>,
    pub failed_members: Vec<Member>,
}

impl CollectionOutcome {
    pub fn fetched_collections(&self) -> usize {
        self.collections.len()
    }
}

/// Folds one member's collection into a partial table.
///
/// Ignored games are skipped outright; owned but unrated games still get an
/// (empty) entry.
pub fn tally_collection(collection: &Collection, ignored: &BTreeSet<GameId>) -> RatingTable {
    let mut table = RatingTable::new();
    for item in &collection.items {
        if ignored.contains(&item.id) {
            continue;
        }
        table.record(item.id, &item.name, item.rating);
    }
    table
}

pub struct RatingCollector<'a, D: DataSource + ?Sized> {
    source: &'a D,
    ignored: &'a BTreeSet<GameId>,
    retry: &'a RetryPolicy,
    concurrency: usize,
}

impl<'a, D: DataSource + ?Sized> RatingCollector<'a, D> {
    pub fn new(
        source: &'a D,
        ignored: &'a BTreeSet<GameId>,
        retry: &'a RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            ignored,
            retry,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn collect(&self, members: &[Member]) -> CollectionOutcome {
        let total = members.len();

        // buffered 保持成員順序，合併結果與抓取完成順序無關
        let fetches = stream::iter(members.iter().enumerate())
            .map(|(index, member)| async move {
                tracing::info!("[{}/{}] Fetching collection for {}", index + 1, total, member);
                let operation = format!("collection {}", member);
                let result = retry_transient(&operation, self.retry, || {
                    self.source.fetch_collection(member)
                })
                .await;
                (member, result)
            })
            .buffered(self.concurrency);

        let outcome = fetches
            .fold(
                CollectionOutcome::default(),
                |mut outcome, (member, result)| async move {
                    match result {
                        Ok(collection) if collection.is_empty() => {
                            tracing::warn!("Empty collection for {}, skipping", member);
                            outcome.failed_members.push(member.clone());
                        }
                        Ok(collection) => {
                            tracing::debug!(
                                "{} owns {} games",
                                member,
                                collection.items.len()
                            );
                            outcome
                                .ratings
                                .merge(tally_collection(&collection, self.ignored));
                            outcome.collections.insert(member.clone(), collection);
                        }
                        Err(e) => {
                            tracing::warn!("Skipping {}: {}", member, e);
                            outcome.failed_members.push(member.clone());
                        }
                    }
                    outcome
                },
            )
            .await;

        tracing::info!(
            "Collected {} collections ({} failed), {} distinct games, {} ratings",
            outcome.fetched_collections(),
            outcome.failed_members.len(),
            outcome.ratings.len(),
            outcome.ratings.total_ratings()
        );

        outcome
    }
}
