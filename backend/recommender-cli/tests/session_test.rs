//! End-to-end console session tests against an on-disk rating file

use recommender_cli::{Config, Session};
use recommender_core::RecommendationEngine;
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

fn ratings_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn run(engine: &RecommendationEngine, config: &Config, input: &str) -> String {
    colored::control::set_override(false);
    let mut output = Vec::new();
    Session::new(engine, config, Cursor::new(input.to_string()), &mut output)
        .run()
        .expect("session failed");
    String::from_utf8(output).unwrap()
}

#[test]
fn test_session_over_file_with_reload() {
    let mut file = ratings_file("1,101,5.0\n1,102,3.0\n2,101,5.0\n2,102,3.0\n2,103,4.0\n");
    let config = Config {
        data_path: file.path().to_path_buf(),
        ..Config::default()
    };
    let (engine, _) = RecommendationEngine::open(
        &config.data_path,
        &config.load_options(),
        config.recommender_config(),
    )
    .unwrap();

    let output = run(&engine, &config, "1\n");
    assert!(output.contains("Available user IDs: 1 2"));
    assert!(output.contains("📦 Item 103   → Score: 4.00"));

    // A new user shows up after the file is reloaded
    file.write_all(b"3,101,4.0\n3,102,2.0\n").unwrap();
    file.flush().unwrap();

    let output = run(&engine, &config, "3\nreload\n3\nusers\n0\n");
    assert!(output.contains("No recommendations found for user ID: 3"));
    assert!(output.contains("Reloaded 7 ratings from 3 users over 3 items"));
    assert!(output.contains("Top Recommendations for User 3:"));
    assert!(output.contains("Available user IDs: 1 2 3"));
}

#[test]
fn test_reload_failure_keeps_serving() {
    let file = ratings_file("1,101,5.0\n1,102,3.0\n2,101,5.0\n2,102,3.0\n2,103,4.0\n");
    let config = Config {
        data_path: file.path().to_path_buf(),
        ..Config::default()
    };
    let (engine, _) = RecommendationEngine::open(
        &config.data_path,
        &config.load_options(),
        config.recommender_config(),
    )
    .unwrap();

    let broken = Config {
        data_path: file.path().with_extension("missing"),
        ..config.clone()
    };
    let output = run(&engine, &broken, "reload\n1\n0\n");

    assert!(output.contains("Error retrieving recommendations: Rating source unavailable"));
    assert!(output.contains("Top Recommendations for User 1:"));
}
