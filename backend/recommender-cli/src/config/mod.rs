use anyhow::{bail, Result};
use recommender_core::{
    DuplicatePolicy, LoadOptions, MalformedPolicy, RecommenderConfig, SimilarityMetric,
    DEFAULT_NEIGHBORHOOD_SIZE, MAX_RECOMMENDATIONS,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::Args;

const ENV_PREFIX: &str = "RECOMMENDER_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_neighborhood_size")]
    pub neighborhood_size: usize,
    #[serde(default = "default_result_count")]
    pub result_count: i64,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default)]
    pub min_similarity: Option<f64>,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    #[serde(default)]
    pub malformed: MalformedPolicy,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data.csv")
}

fn default_neighborhood_size() -> usize {
    DEFAULT_NEIGHBORHOOD_SIZE
}

fn default_result_count() -> i64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            neighborhood_size: default_neighborhood_size(),
            result_count: default_result_count(),
            metric: SimilarityMetric::default(),
            min_similarity: None,
            duplicates: DuplicatePolicy::default(),
            malformed: MalformedPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Read `RECOMMENDER_*` variables, after loading a `.env` file if present
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::prefixed(ENV_PREFIX).from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }

    /// Command-line flags take precedence over the environment
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(path) = &args.data {
            self.data_path = path.clone();
        }
        if let Some(k) = args.neighbors {
            self.neighborhood_size = k;
        }
        if let Some(count) = args.count {
            self.result_count = count;
        }
        if let Some(metric) = args.metric {
            self.metric = metric;
        }
        if args.min_similarity.is_some() {
            self.min_similarity = args.min_similarity;
        }
        if let Some(duplicates) = args.duplicates {
            self.duplicates = duplicates;
        }
        if let Some(malformed) = args.malformed {
            self.malformed = malformed;
        }
    }

    /// Reject settings that would make every query fail
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_RECOMMENDATIONS).contains(&self.result_count) {
            bail!(
                "result count must be between 1 and {}, got {}",
                MAX_RECOMMENDATIONS,
                self.result_count
            );
        }
        Ok(())
    }

    pub fn recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig {
            neighborhood_size: self.neighborhood_size,
            metric: self.metric,
            min_similarity: self.min_similarity,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            duplicates: self.duplicates,
            malformed: self.malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_vars(Vec::new()).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.data_path, PathBuf::from("data.csv"));
        assert_eq!(config.neighborhood_size, 3);
        assert_eq!(config.result_count, 5);
    }

    #[test]
    fn test_reads_prefixed_vars() {
        let config = Config::from_vars(vars(&[
            ("RECOMMENDER_DATA_PATH", "/srv/ratings.csv"),
            ("RECOMMENDER_NEIGHBORHOOD_SIZE", "10"),
            ("RECOMMENDER_METRIC", "jaccard"),
            ("RECOMMENDER_MIN_SIMILARITY", "0.2"),
            ("RECOMMENDER_MALFORMED", "skip"),
            ("RECOMMENDER_LOG_FORMAT", "json"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.data_path, PathBuf::from("/srv/ratings.csv"));
        assert_eq!(config.neighborhood_size, 10);
        assert_eq!(config.metric, SimilarityMetric::Jaccard);
        assert_eq!(config.min_similarity, Some(0.2));
        assert_eq!(config.malformed, MalformedPolicy::Skip);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_number_is_error() {
        let result = Config::from_vars(vars(&[("RECOMMENDER_NEIGHBORHOOD_SIZE", "many")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_args_override_env() {
        let mut config = Config::from_vars(vars(&[
            ("RECOMMENDER_NEIGHBORHOOD_SIZE", "10"),
            ("RECOMMENDER_RESULT_COUNT", "8"),
        ]))
        .unwrap();
        let args = Args {
            neighbors: Some(2),
            metric: Some(SimilarityMetric::Cosine),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.neighborhood_size, 2);
        assert_eq!(config.result_count, 8);
        assert_eq!(config.recommender_config().metric, SimilarityMetric::Cosine);
        assert_eq!(config.load_options(), LoadOptions::default());
    }

    #[test]
    fn test_result_count_bounds() {
        assert!(Config::default().validate().is_ok());

        for count in [0, -5, MAX_RECOMMENDATIONS + 1] {
            let config = Config {
                result_count: count,
                ..Config::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("result count"), "count {count}");
        }
    }
}
