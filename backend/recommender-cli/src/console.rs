//! Interactive prompt loop and one-shot query output

use anyhow::{Context, Result};
use recommender_core::{RecommendationEngine, RecommenderError, UserId};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::render;

const NUMERIC_HINT: &str = "Please enter a numeric User ID.";
const RATE_USAGE: &str = "Usage: rate <user> <item> <value>";

/// One line of user input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Exit,
    Recommend(UserId),
    Users,
    Help,
    Reload,
    Rate { user_id: i64, item_id: i64, value: f64 },
}

impl FromStr for Command {
    type Err = RecommenderError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(RecommenderError::InvalidQuery(NUMERIC_HINT.to_string()));
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "exit" | "quit" => Command::Exit,
            "users" => Command::Users,
            "help" | "?" => Command::Help,
            "reload" => Command::Reload,
            "rate" => {
                let fields: Vec<&str> = words.by_ref().collect();
                let &[user, item, value] = fields.as_slice() else {
                    return Err(RecommenderError::InvalidQuery(RATE_USAGE.to_string()));
                };
                let usage = || RecommenderError::InvalidQuery(RATE_USAGE.to_string());
                Command::Rate {
                    user_id: user.parse::<i64>().map_err(|_| usage())?,
                    item_id: item.parse::<i64>().map_err(|_| usage())?,
                    value: value.parse::<f64>().map_err(|_| usage())?,
                }
            }
            _ => match head.parse::<i64>() {
                Ok(0) => Command::Exit,
                Ok(id) if id > 0 => Command::Recommend(id),
                _ => return Err(RecommenderError::InvalidQuery(NUMERIC_HINT.to_string())),
            },
        };

        if words.next().is_some() {
            return Err(RecommenderError::InvalidQuery(NUMERIC_HINT.to_string()));
        }
        Ok(command)
    }
}

pub struct Session<'a, R, W> {
    engine: &'a RecommendationEngine,
    config: &'a Config,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(engine: &'a RecommendationEngine, config: &'a Config, input: R, output: W) -> Self {
        Self {
            engine,
            config,
            input,
            output,
        }
    }

    /// Run until the user exits or input ends
    pub fn run(mut self) -> Result<()> {
        render::banner(&mut self.output)?;
        render::user_ids(&mut self.output, &self.engine.list_user_ids())?;

        let mut line = String::new();
        loop {
            render::prompt(&mut self.output)?;

            line.clear();
            let read = self
                .input
                .read_line(&mut line)
                .context("Failed to read from input")?;
            if read == 0 {
                render::goodbye(&mut self.output)?;
                break;
            }

            match line.parse::<Command>() {
                Ok(Command::Exit) => {
                    render::goodbye(&mut self.output)?;
                    break;
                }
                Ok(command) => self.dispatch(command)?,
                Err(RecommenderError::InvalidQuery(hint)) => {
                    render::invalid_input(&mut self.output, &hint)?
                }
                Err(other) => render::retrieval_error(&mut self.output, other)?,
            }
        }

        self.output.flush()?;
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Exit => {}
            Command::Recommend(user_id) => {
                show_recommendations(
                    self.engine,
                    user_id,
                    self.config.result_count,
                    &mut self.output,
                )?;
            }
            Command::Users => {
                render::user_ids(&mut self.output, &self.engine.list_user_ids())?;
            }
            Command::Help => render::help(&mut self.output)?,
            Command::Reload => {
                match self
                    .engine
                    .reload(&self.config.data_path, &self.config.load_options())
                {
                    Ok(_) => render::reloaded(&mut self.output, &self.engine.metadata())?,
                    Err(err) => render::retrieval_error(&mut self.output, err)?,
                }
            }
            Command::Rate {
                user_id,
                item_id,
                value,
            } => match self.engine.rate(user_id, item_id, value) {
                Ok(previous) => {
                    render::rating_recorded(&mut self.output, user_id, item_id, value, previous)?
                }
                Err(err) => render::invalid_input(&mut self.output, &err.to_string())?,
            },
        }
        Ok(())
    }
}

/// Print recommendations for one user; unknown users count as "no recommendations".
///
/// Returns whether the query succeeded.
pub fn show_recommendations<W: Write>(
    engine: &RecommendationEngine,
    user_id: UserId,
    count: i64,
    out: &mut W,
) -> Result<bool> {
    match engine.recommend(user_id, count) {
        Ok(items) if items.is_empty() => {
            render::no_recommendations(out, user_id)?;
            Ok(true)
        }
        Ok(items) => {
            info!(user_id, returned = items.len(), "Recommendations served");
            render::recommendations(out, user_id, &items)?;
            Ok(true)
        }
        Err(RecommenderError::UnknownUser(_)) => {
            debug!(user_id, "Query for user without ratings");
            render::no_recommendations(out, user_id)?;
            Ok(true)
        }
        Err(err) => {
            warn!(user_id, error = %err, "Recommendation query failed");
            render::retrieval_error(out, err)?;
            Ok(false)
        }
    }
}

/// Print recommendations for one user as JSON: a list on success, an error report otherwise
pub fn print_json<W: Write>(
    engine: &RecommendationEngine,
    user_id: UserId,
    count: i64,
    out: &mut W,
) -> Result<bool> {
    let (json, ok) = match engine.recommend(user_id, count) {
        Ok(items) => (serde_json::to_string_pretty(&items)?, true),
        Err(err) => (serde_json::to_string_pretty(&err.report())?, false),
    };
    writeln!(out, "{}", json)?;
    Ok(ok)
}
