//! Mealwise CLI
//!
//! Usage:
//! ```bash
//! # Nutrition facts for a food (cached for an hour)
//! mealwise lookup kimchi
//!
//! # Bypass the lookup cache
//! mealwise lookup kimchi --no-cache
//!
//! # Teach the knowledge store new foods
//! mealwise add-food kimchi bibimbap bulgogi
//!
//! # Foods similar to a query (needs an embedding backend)
//! mealwise similar "kimchi stew" --top-k 3
//!
//! # Nutrition advice
//! mealwise advise kimchi
//!
//! # Recipe from a pantry, using user 1's preferences
//! mealwise recipe --pantry pantry.json --preferences users.json --user-index 1
//! ```
//!
//! Output is JSON on stdout. Failures print `{"error": ...}` and exit non-zero.

mod app;
mod telemetry;

use clap::{Parser, Subcommand};
use mealwise_context::{load_pantry, load_preferences, RecipeRequest, RecipeResponse};
use mealwise_core::{LlmError, MealwiseConfig, MealwiseResult, UserPreferences};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "mealwise",
    about = "Nutrition lookup, similar-food search, and AI meal advice",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML config file (defaults to $MEALWISE_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Nutrition facts for a food name
    Lookup {
        food: String,

        /// Skip the lookup cache for both reading and writing
        #[arg(long)]
        no_cache: bool,
    },

    /// Add foods to the knowledge store
    AddFood {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Stored foods most similar to a query
    Similar {
        query: String,

        /// Neighbors to rank before threshold filtering (defaults to retrieval.max_results)
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum cosine similarity (defaults to retrieval.similarity_threshold)
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Nutrition advice for a food
    #[command(visible_alias = "chat")]
    Advise { food: String },

    /// Generate a recipe from a pantry list
    Recipe {
        /// JSON file: [{"name": .., "count": ..}]
        #[arg(long)]
        pantry: PathBuf,

        /// JSON file: {"users": [{"good": .., "bad": ..}]}
        #[arg(long)]
        preferences: Option<PathBuf>,

        /// Which user in the preferences file
        #[arg(long, default_value_t = 0)]
        user_index: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return report(Err(format!("failed to start runtime: {}", e))),
    };

    report(runtime.block_on(run(cli)).map_err(|e| e.to_string()))
}

fn report(result: Result<Value, String>) -> ExitCode {
    match result {
        Ok(value) => {
            println!("{}", to_pretty(&value));
            ExitCode::SUCCESS
        }
        Err(message) => {
            tracing::error!(error = %message, "Command failed");
            println!("{}", to_pretty(&json!({ "error": message })));
            ExitCode::FAILURE
        }
    }
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> MealwiseResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        mealwise_core::ValidationError::MalformedJson {
            reason: e.to_string(),
        }
        .into()
    })
}

async fn run(cli: Cli) -> MealwiseResult<Value> {
    let config = MealwiseConfig::load(cli.config.as_deref())?;
    let registry = app::build_registry(&config)?;

    match cli.command {
        Command::Lookup { food, no_cache } => {
            let store = app::open_store(&config, &registry)?;
            let outcome = store.lookup(&food, !no_cache).await;
            let warning = outcome.cause().map(|c| c.to_string());
            Ok(json!({
                "food": food,
                "facts": to_json(outcome.value())?,
                "warning": warning,
            }))
        }

        Command::AddFood { names } => {
            let mut store = app::open_store(&config, &registry)?;
            let mut results = Vec::with_capacity(names.len());
            for name in names {
                let outcome = store.add_food(&name).await;
                results.push(json!({ "name": name, "result": to_json(&outcome)? }));
            }
            Ok(json!({ "foods": results, "stored": store.len() }))
        }

        Command::Similar {
            query,
            top_k,
            threshold,
        } => {
            let store = app::open_store(&config, &registry)?;
            if !store.has_embedder() {
                tracing::warn!("Similarity search needs embedding.base_url; returning no matches");
            }
            let neighbors = store
                .find_similar(
                    &query,
                    top_k.unwrap_or(config.retrieval.max_results),
                    threshold.unwrap_or(config.retrieval.similarity_threshold),
                )
                .await;
            Ok(json!({ "query": query, "neighbors": to_json(&neighbors)? }))
        }

        Command::Advise { food } => {
            let advisor = app::open_advisor(&config, &registry)?;
            to_json(&advisor.advise(&food).await)
        }

        Command::Recipe {
            pantry,
            preferences,
            user_index,
        } => {
            let request = RecipeRequest {
                pantry: load_pantry(&pantry)?,
                preferences: match preferences {
                    Some(path) => load_preferences(&path, user_index)?,
                    None => UserPreferences::default(),
                },
            };
            let advisor = app::open_advisor(&config, &registry)?;
            match advisor.recommend_recipe(&request).await {
                RecipeResponse::Generated { recipe } => to_json(&recipe),
                RecipeResponse::Failed { message } => {
                    Err(LlmError::GenerationFailed { reason: message }.into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lookup_no_cache() {
        let cli = Cli::try_parse_from(["mealwise", "lookup", "kimchi", "--no-cache"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Lookup { ref food, no_cache: true } if food == "kimchi"
        ));
    }

    #[test]
    fn test_parse_chat_alias() {
        let cli = Cli::try_parse_from(["mealwise", "chat", "tofu"]).unwrap();
        assert!(matches!(cli.command, Command::Advise { ref food } if food == "tofu"));
    }

    #[test]
    fn test_parse_recipe_defaults() {
        let cli =
            Cli::try_parse_from(["mealwise", "recipe", "--pantry", "pantry.json"]).unwrap();
        match cli.command {
            Command::Recipe {
                pantry,
                preferences,
                user_index,
            } => {
                assert_eq!(pantry, PathBuf::from("pantry.json"));
                assert!(preferences.is_none());
                assert_eq!(user_index, 0);
            }
            _ => panic!("expected recipe command"),
        }
    }

    #[test]
    fn test_add_food_requires_names() {
        assert!(Cli::try_parse_from(["mealwise", "add-food"]).is_err());
    }
}
