use clap::Parser;
use recommender_core::{DuplicatePolicy, MalformedPolicy, SimilarityMetric};
use std::path::PathBuf;

/// Interactive user-based collaborative filtering recommender.
///
/// Flags override the matching RECOMMENDER_* environment variables.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "cf-recommender", version, about)]
pub struct Args {
    /// Rating file with `user,item,rating[,timestamp]` records
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Number of nearest neighbors used per query
    #[arg(short = 'k', long)]
    pub neighbors: Option<usize>,

    /// Number of recommendations per query
    #[arg(short = 'n', long)]
    pub count: Option<i64>,

    /// Similarity metric: pearson, cosine or jaccard
    #[arg(long)]
    pub metric: Option<SimilarityMetric>,

    /// Drop neighbors below this similarity
    #[arg(long, allow_hyphen_values = true)]
    pub min_similarity: Option<f64>,

    /// Duplicate (user, item) records: overwrite or reject
    #[arg(long)]
    pub duplicates: Option<DuplicatePolicy>,

    /// Malformed records: fail or skip
    #[arg(long)]
    pub malformed: Option<MalformedPolicy>,

    /// Print recommendations for this user once and exit
    #[arg(short, long)]
    pub user: Option<i64>,

    /// Print one-shot results as JSON
    #[arg(long, requires = "user")]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
