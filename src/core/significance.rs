use crate::domain::model::RatingTable;

/// `floor(fetched_collections * ratio)`; a game must have strictly more ratings.
pub fn significance_threshold(fetched_collections: usize, ratio: f64) -> usize {
    (fetched_collections as f64 * ratio).floor() as usize
}

/// Drops games at or below the threshold and returns how many were removed.
/// Games with no ratings never survive, whatever the threshold.
pub fn filter_significant(table: &mut RatingTable, threshold: usize) -> usize {
    let before = table.len();
    table.retain(|_, game| game.ratings.len() > threshold);
    let removed = before - table.len();
    tracing::info!(
        "Significance threshold {}: kept {} games, dropped {}",
        threshold,
        table.len(),
        removed
    );
    removed
}
