pub mod settings;

pub use settings::Settings;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[cfg(feature = "cli")]
impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "guild-ratings")]
#[command(about = "Rank board games by the mean rating of a guild's members")]
pub struct CliConfig {
    /// Numeric guild ID
    pub guild_id: u64,

    /// Only keep the top N games in the ranked list
    #[arg(short = 'n', long = "number")]
    pub number: Option<usize>,

    /// Directory for cached service responses
    #[arg(long)]
    pub cache: Option<String>,

    /// Report file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// TOML settings file
    #[arg(long)]
    pub config: Option<String>,

    /// Game IDs to leave out, in addition to the settings file
    #[arg(long, value_delimiter = ',')]
    pub ignore: Vec<u64>,

    #[arg(long)]
    pub base_url: Option<String>,

    /// Parallel requests to the service
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Settings file (or defaults) with command-line values layered on top.
    pub fn load_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };

        if let Some(base_url) = &self.base_url {
            settings.service.base_url = base_url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            settings.service.concurrency = concurrency;
        }
        if let Some(cache) = &self.cache {
            settings.cache.directory = Some(cache.clone());
        }
        for id in &self.ignore {
            if !settings.filter.ignored_games.contains(id) {
                settings.filter.ignored_games.push(*id);
            }
        }

        Ok(settings)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(number) = self.number {
            validate_positive_number("number", number, 1)?;
        }
        if let Some(output) = &self.output {
            validate_path("output", output)?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        Ok(())
    }
}
