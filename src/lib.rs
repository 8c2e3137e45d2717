pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{
    cache::ResponseCache,
    http::HttpDataSource,
    storage::{LocalStorage, StdoutStorage},
};
pub use config::Settings;
pub use core::{
    engine::RankingEngine,
    ranker::{GuildRanker, RankerOptions},
};
pub use domain::model::{RankedEntry, RunReport};
pub use domain::ports::{DataSource, Storage};
pub use utils::error::{GuildError, Result, ServiceError};
