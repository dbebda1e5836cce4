//! Colored terminal output

use colored::Colorize;
use recommender_core::{Recommendation, StoreMetadata, UserId};
use std::fmt::Display;
use std::io::{self, Write};

pub fn banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        "\n🔍 Welcome to the Real-Time Product Recommender System"
            .cyan()
            .bold()
    )
}

pub fn user_ids<W: Write>(out: &mut W, ids: &[UserId]) -> io::Result<()> {
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{}{}", "\n📊 Available user IDs: ".yellow(), joined)
}

pub fn prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(
        out,
        "{}",
        "\nEnter your User ID to get recommendations (or 0 to exit): ".green()
    )?;
    out.flush()
}

pub fn invalid_input<W: Write>(out: &mut W, hint: &str) -> io::Result<()> {
    writeln!(out, "{}", format!("❌ Invalid input. {}", hint).red())
}

pub fn goodbye<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        "\n👋 Thank you for using the Recommender System. Goodbye!".yellow()
    )
}

pub fn no_recommendations<W: Write>(out: &mut W, user_id: UserId) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("⚠️ No recommendations found for user ID: {}", user_id).red()
    )
}

pub fn recommendations<W: Write>(
    out: &mut W,
    user_id: UserId,
    items: &[Recommendation],
) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("\n✅ Top Recommendations for User {}:", user_id)
            .green()
            .bold()
    )?;
    for item in items {
        writeln!(out, "{}", item_line(item).cyan())?;
    }
    Ok(())
}

pub fn item_line(item: &Recommendation) -> String {
    format!("📦 Item {:<5} → Score: {:.2}", item.item_id, item.score)
}

pub fn retrieval_error<W: Write>(out: &mut W, err: impl Display) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("❌ Error retrieving recommendations: {}", err).red()
    )
}

pub fn init_failure<W: Write>(out: &mut W, err: impl Display) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!("❌ Failed to initialize the recommender system: {}", err).red()
    )
}

pub fn rating_recorded<W: Write>(
    out: &mut W,
    user_id: UserId,
    item_id: i64,
    value: f64,
    previous: Option<f64>,
) -> io::Result<()> {
    let message = match previous {
        Some(old) => format!(
            "✓ Rating updated: user {} item {} = {} (was {})",
            user_id, item_id, value, old
        ),
        None => format!("✓ Rating recorded: user {} item {} = {}", user_id, item_id, value),
    };
    writeln!(out, "{}", message.green())
}

pub fn reloaded<W: Write>(out: &mut W, metadata: &StoreMetadata) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        format!(
            "✓ Reloaded {} ratings from {} users over {} items",
            metadata.rating_count, metadata.user_count, metadata.item_count
        )
        .green()
    )
}

pub fn help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "Commands:".bold())?;
    writeln!(out, "  <user id>                    show recommendations")?;
    writeln!(out, "  users                        list user IDs")?;
    writeln!(out, "  rate <user> <item> <value>   record a rating")?;
    writeln!(out, "  reload                       re-read the rating file")?;
    writeln!(out, "  0 | exit                     quit")
}
