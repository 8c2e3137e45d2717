use crate::domain::model::{GameId, GameMeta, RankedEntry, RatingTable, RunReport};
use crate::utils::error::Result;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Counts used for the report header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTotals {
    pub threshold: usize,
    pub total_members: usize,
    pub fetched_collections: usize,
}

/// Report name per game: distinct games sharing a display name get `Name (#id)`.
///
/// Games whose name is already unique keep it. A suffixed name that would
/// clash with another game's literal title gets the suffix again until it is
/// free, so every returned name is distinct.
pub fn display_names(ratings: &RatingTable) -> BTreeMap<GameId, String> {
    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for (_, game) in ratings.iter() {
        *name_counts.entry(game.name.as_str()).or_insert(0) += 1;
    }
    let is_shared = |name: &str| name_counts.get(name).copied().unwrap_or(0) > 1;

    let mut names = BTreeMap::new();
    let mut used: HashSet<String> = HashSet::new();
    for (id, game) in ratings.iter() {
        if !is_shared(&game.name) {
            used.insert(game.name.clone());
            names.insert(id, game.name.clone());
        }
    }

    for (id, game) in ratings.iter() {
        if !is_shared(&game.name) {
            continue;
        }
        let mut name = format!("{} (#{})", game.name, id);
        while used.contains(&name) {
            name = format!("{} (#{})", name, id);
        }
        used.insert(name.clone());
        names.insert(id, name);
    }

    names
}

/// Mean rating per game, best first.
///
/// `sort_by` is stable, so equal means keep ascending game ID order.
pub fn rank(ratings: &RatingTable, names: &BTreeMap<GameId, String>) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = ratings
        .iter()
        .filter(|(_, game)| !game.ratings.is_empty())
        .map(|(id, game)| {
            let rater_count = game.ratings.len();
            let sum: f64 = game.ratings.iter().sum();
            RankedEntry {
                name: names.get(&id).cloned().unwrap_or_else(|| game.name.clone()),
                rater_count,
                mean_rating: sum / rater_count as f64,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.mean_rating.total_cmp(&a.mean_rating));
    entries
}

pub fn build_report(
    ratings: &RatingTable,
    game_meta: &BTreeMap<GameId, GameMeta>,
    totals: ReportTotals,
    limit: Option<usize>,
) -> RunReport {
    let names = display_names(ratings);
    let mut game_ratings = rank(ratings, &names);
    if let Some(limit) = limit {
        game_ratings.truncate(limit);
    }

    let game_info = ratings
        .iter()
        .filter_map(|(id, _)| {
            let meta = game_meta.get(&id)?;
            let name = names.get(&id)?;
            Some((name.clone(), meta.clone()))
        })
        .collect();

    RunReport {
        game_ratings,
        threshold: totals.threshold,
        total_members: totals.total_members,
        fetched_collections: totals.fetched_collections,
        total_ratings: ratings.total_ratings(),
        game_info,
    }
}

pub fn render_json(report: &RunReport) -> Result<Vec<u8>> {
    let mut body = serde_json::to_vec_pretty(report)?;
    body.push(b'\n');
    Ok(body)
}
