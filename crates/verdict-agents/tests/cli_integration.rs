//! Integration tests that invoke the real Claude CLI.
//!
//! These tests are `#[ignore]` by default. They require:
//! - The `claude` CLI installed and on PATH
//! - Valid Anthropic credentials configured
//!
//! Run explicitly with:
//! ```bash
//! cargo test -p verdict-agents --test cli_integration -- --ignored
//! ```

use std::time::Duration;

use verdict_agents::claude_cli::{check_cli_available, invoke_claude, ClaudeCliConfig};
use verdict_agents::parser::extract_verdict;
use verdict_agents::{ClaudeModel, QueryPlanner, RatingEngine};
use verdict_models::{ExtractionTier, Rating};

#[tokio::test]
#[ignore]
async fn cli_is_available() {
    assert!(
        check_cli_available().await,
        "claude CLI not found on PATH"
    );
}

/// A real rating reply must come out of the extraction chain without falling back.
///
/// This catches changes in the CLI's output format (new wrapping, preambles)
/// that would otherwise only surface as a wave of HOLD verdicts.
#[tokio::test]
#[ignore]
async fn rating_reply_is_extractable() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let model = ClaudeModel::new(
        "claude-3-5-haiku-latest".to_string(),
        Duration::from_secs(60),
    );
    let engine = RatingEngine::new(std::sync::Arc::new(model));

    let rated = engine
        .rate_detailed(
            "ACME",
            "Revenue +18% YoY, operating margin 24%, net cash position.",
            "Coverage is positive: record quarter and raised guidance.",
            "Sector demand is stable with mild pricing pressure.",
        )
        .await;

    assert!(
        rated.tier.is_extracted(),
        "verdict was not extracted (tier {:?}): {}",
        rated.tier,
        rated.verdict.reasoning
    );
    assert!(Rating::ALL.contains(&rated.verdict.rating));
}

#[tokio::test]
#[ignore]
async fn planner_returns_queries() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let model = ClaudeModel::new(
        "claude-3-5-haiku-latest".to_string(),
        Duration::from_secs(60),
    )
    .with_max_queries(3);

    let queries = model
        .plan("AAPL", "Apple Inc. designs consumer electronics.")
        .await
        .expect("planner call failed");
    assert!(!queries.is_empty());
}

#[tokio::test]
#[ignore]
async fn raw_json_reply_parses_as_verdict() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let config = ClaudeCliConfig {
        model: "claude-3-5-haiku-latest".to_string(),
        timeout: Duration::from_secs(30),
    };
    let system_prompt = concat!(
        "Respond ONLY with this JSON object, no other text:\n",
        "{\"rating\": \"HOLD\", \"confidence\": 0.5, \"reasoning\": \"test\", ",
        "\"key_factors\": [\"a\"], \"risk_factors\": [\"b\"], ",
        "\"recommendation_summary\": \"test\"}"
    );

    let raw = invoke_claude(system_prompt, "ping", &config)
        .await
        .expect("Claude CLI invocation failed");

    let (verdict, tier) = extract_verdict(&raw);
    assert_ne!(tier, ExtractionTier::Fallback, "raw output:\n{raw}");
    assert_eq!(verdict.rating, Rating::Hold);
}

/// The CLI must exit non-zero for an unknown model and that must surface as an error.
#[tokio::test]
#[ignore]
async fn cli_reports_errors_for_invalid_model() {
    if !check_cli_available().await {
        eprintln!("Skipping: claude CLI not available");
        return;
    }

    let config = ClaudeCliConfig {
        model: "nonexistent-model-12345".to_string(),
        timeout: Duration::from_secs(15),
    };

    let result = invoke_claude("You are a test.", "hello", &config).await;

    assert!(
        result.is_err(),
        "Expected error for invalid model, got: {:?}",
        result.unwrap()
    );
}
