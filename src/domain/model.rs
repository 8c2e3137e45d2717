use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Service user name of a guild participant.
pub type Member = String;

pub type GameId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItem {
    pub id: GameId,
    pub name: String,
    /// `None` when the member owns the game but never rated it.
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub items: Vec<CollectionItem>,
}

impl Collection {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: GameId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameRatings {
    pub name: String,
    pub ratings: Vec<f64>,
}

/// Ratings grouped per game, keyed by the stable game ID.
///
/// The `BTreeMap` keeps iteration in ascending ID order, which is what makes
/// the ranked output reproducible between runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingTable {
    games: BTreeMap<GameId, GameRatings>,
}

impl RatingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers ownership of a game; the rating is appended only when present.
    /// The first name seen for an ID is kept.
    pub fn record(&mut self, id: GameId, name: &str, rating: Option<f64>) {
        let entry = self.games.entry(id).or_insert_with(|| GameRatings {
            name: name.to_string(),
            ratings: Vec::new(),
        });
        if let Some(rating) = rating {
            entry.ratings.push(rating);
        }
    }

    /// Combines another partial table into this one.
    pub fn merge(&mut self, other: RatingTable) {
        for (id, game) in other.games {
            match self.games.get_mut(&id) {
                Some(existing) => existing.ratings.extend(game.ratings),
                None => {
                    self.games.insert(id, game);
                }
            }
        }
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(GameId, &GameRatings) -> bool,
    {
        self.games.retain(|id, game| keep(*id, game));
    }

    pub fn get(&self, id: GameId) -> Option<&GameRatings> {
        self.games.get(&id)
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.games.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GameId, &GameRatings)> {
        self.games.iter().map(|(id, game)| (*id, game))
    }

    pub fn ids(&self) -> Vec<GameId> {
        self.games.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn total_ratings(&self) -> usize {
        self.games.values().map(|g| g.ratings.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameClassification {
    FullGame { id: GameId, rating: f64 },
    Expansion,
    /// Metadata was missing or could not be fetched.
    Unknown,
}

/// Stringified metadata recorded for every full game in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMeta {
    pub id: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub name: String,
    pub rater_count: usize,
    pub mean_rating: f64,
}

// 下游工具讀的是 [name, count, mean] 三元組
impl Serialize for RankedEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.name)?;
        tuple.serialize_element(&self.rater_count)?;
        tuple.serialize_element(&self.mean_rating)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub game_ratings: Vec<RankedEntry>,
    pub threshold: usize,
    pub total_members: usize,
    pub fetched_collections: usize,
    pub total_ratings: usize,
    pub game_info: BTreeMap<String, GameMeta>,
}
