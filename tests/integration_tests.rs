use anyhow::Result;
use guild_ratings::utils::validation::Validate;
use guild_ratings::{
    GuildError, GuildRanker, HttpDataSource, LocalStorage, RankingEngine, Settings,
};
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::json;
use tempfile::TempDir;

fn settings_for(server: &MockServer, cache_dir: Option<&str>) -> Result<Settings> {
    let cache = match cache_dir {
        Some(dir) => format!("[cache]\ndirectory = \"{}\"\n", dir.replace('\\', "/")),
        None => String::new(),
    };
    let toml_content = format!(
        r#"
[service]
base_url = "{}"
timeout_seconds = 5

[retry]
max_attempts = 2
initial_delay_ms = 1
max_delay_ms = 2

{}
"#,
        server.base_url(),
        cache
    );
    let settings = Settings::from_toml_str(&toml_content)?;
    settings.validate()?;
    Ok(settings)
}

/// Guild 1290: alice, bob and carol rate things; dave's collection is
/// private (403) and erin's is permanently queued (202).
fn mock_service(server: &MockServer) -> Vec<Mock<'_>> {
    let mut mocks = Vec::new();

    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/guild/1290");
        then.status(200).json_body(json!({
            "id": 1290,
            "name": "Tabletop Club",
            "members": ["alice", "bob", "carol", "dave", "erin"]
        }));
    }));

    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/collection/alice");
        then.status(200).json_body(json!({
            "items": [
                {"id": 13, "name": "Catan", "rating": 3.0},
                {"id": 174430, "name": "Gloomhaven", "rating": 9.0},
                {"id": 926, "name": "Catan: Seafarers", "rating": 8.0},
                {"id": 1, "name": "Ignored Classic", "rating": 10.0}
            ]
        }));
    }));
    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/collection/bob");
        then.status(200).json_body(json!({
            "items": [
                {"id": 13, "name": "Catan", "rating": 4.0},
                {"id": 174430, "name": "Gloomhaven", "rating": 8.0},
                {"id": 926, "name": "Catan: Seafarers", "rating": 8.0},
                {"id": 1, "name": "Ignored Classic", "rating": 10.0}
            ]
        }));
    }));
    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/collection/carol");
        then.status(200).json_body(json!({
            "items": [
                {"id": 13, "name": "Catan", "rating": 5.0},
                {"id": 30549, "name": "Pandemic"}
            ]
        }));
    }));
    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/collection/dave");
        then.status(403);
    }));
    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/collection/erin");
        then.status(202);
    }));

    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/thing/13");
        then.status(200).json_body(json!({
            "id": 13, "name": "Catan", "rating": 7.1,
            "categories": ["Negotiation", "Economic"]
        }));
    }));
    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/thing/174430");
        then.status(200).json_body(json!({
            "id": 174430, "name": "Gloomhaven",
            "categories": ["Adventure", "Fantasy"]
        }));
    }));
    mocks.push(server.mock(|when, then| {
        when.method(GET).path("/thing/926");
        then.status(200).json_body(json!({
            "id": 926, "name": "Catan: Seafarers", "rating": 7.0,
            "categories": ["Expansion for Base-game"]
        }));
    }));

    mocks
}

#[tokio::test]
async fn test_end_to_end_report_over_http() -> Result<()> {
    let server = MockServer::start();
    let mocks = mock_service(&server);
    let temp_dir = TempDir::new()?;

    let settings = settings_for(&server, None)?;
    let mut options = settings.ranker_options(None);
    options.ignored_games.insert(1);
    let ranker = GuildRanker::new(HttpDataSource::from_settings(&settings)?, options);
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let engine = RankingEngine::new(ranker, storage);

    let location = engine.run(1290, "report.json").await?;

    let body = std::fs::read(&location)?;
    let report: serde_json::Value = serde_json::from_slice(&body)?;

    // 3 collections fetched -> threshold floor(0.15) = 0
    assert_eq!(report["threshold"], 0);
    assert_eq!(report["total_members"], 5);
    assert_eq!(report["fetched_collections"], 3);
    assert_eq!(
        report["game_ratings"],
        json!([["Gloomhaven", 2, 8.5], ["Catan", 3, 4.0]])
    );
    assert_eq!(report["total_ratings"], 5);
    assert_eq!(
        report["game_info"],
        json!({
            "Catan": {"id": "13", "rating": "7.1"},
            "Gloomhaven": {"id": "174430", "rating": "5.5"}
        })
    );

    // erin was retried up to the attempt limit, dave was not retried
    assert_eq!(mocks[5].hits(), 2);
    assert_eq!(mocks[4].hits(), 1);
    // Pandemic was never rated, so it never reached classification
    Ok(())
}

#[tokio::test]
async fn test_unknown_guild_writes_no_report() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/guild/42");
        then.status(404);
    });
    let temp_dir = TempDir::new()?;

    let settings = settings_for(&server, None)?;
    let ranker = GuildRanker::new(
        HttpDataSource::from_settings(&settings)?,
        settings.ranker_options(None),
    );
    let engine = RankingEngine::new(
        ranker,
        LocalStorage::new(temp_dir.path().to_str().unwrap().to_string()),
    );

    let err = engine.run(42, "report.json").await.unwrap_err();

    assert!(matches!(err, GuildError::GuildNotFound { guild_id: 42 }));
    assert_eq!(err.exit_code(), 2);
    assert!(!temp_dir.path().join("report.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_guild_server_error_is_fetch_failure() -> Result<()> {
    let server = MockServer::start();
    let guild_mock = server.mock(|when, then| {
        when.method(GET).path("/guild/7");
        then.status(503);
    });

    let settings = settings_for(&server, None)?;
    let ranker = GuildRanker::new(
        HttpDataSource::from_settings(&settings)?,
        settings.ranker_options(None),
    );

    let err = ranker.run(7).await.unwrap_err();

    assert!(matches!(err, GuildError::GuildFetch { guild_id: 7, .. }));
    assert_eq!(err.exit_code(), 2);
    guild_mock.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn test_result_limit_truncates_ranked_list() -> Result<()> {
    let server = MockServer::start();
    let _mocks = mock_service(&server);

    let settings = settings_for(&server, None)?;
    let ranker = GuildRanker::new(
        HttpDataSource::from_settings(&settings)?,
        settings.ranker_options(Some(1)),
    );

    let report = ranker.run(1290).await?;

    assert_eq!(report.game_ratings.len(), 1);
    assert_eq!(report.game_ratings[0].name, "Gloomhaven");
    assert_eq!(report.game_info.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_cached_responses_are_reused() -> Result<()> {
    let server = MockServer::start();
    let mocks = mock_service(&server);
    let cache_dir = TempDir::new()?;

    let settings = settings_for(&server, cache_dir.path().to_str())?;
    let first = GuildRanker::new(
        HttpDataSource::from_settings(&settings)?,
        settings.ranker_options(None),
    )
    .run(1290)
    .await?;
    let second = GuildRanker::new(
        HttpDataSource::from_settings(&settings)?,
        settings.ranker_options(None),
    )
    .run(1290)
    .await?;

    assert_eq!(first, second);
    // guild and successful collections come from the cache the second time
    assert_eq!(mocks[0].hits(), 1);
    assert_eq!(mocks[1].hits(), 1);
    assert_eq!(mocks[6].hits(), 1);
    // failures are never cached
    assert_eq!(mocks[4].hits(), 2);
    Ok(())
}
