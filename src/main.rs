//! Bounded CLI surface (spec.md §6): reads one conversational turn from
//! `--input` or, if absent, as JSON from stdin; writes the resulting
//! `TurnResult` to stdout as JSON. Exit code 0 on any completed turn,
//! including a minimal-holding one; non-zero only for the catastrophic
//! startup failure the spec calls out (an unreadable atom catalog).

use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use dae_hyphae::{Config, Engine, TurnContextInput};

/// A turn read from stdin when `--input` is not supplied.
#[derive(serde::Deserialize)]
struct StdinTurn {
    user_id: String,
    user_input: String,
    #[serde(default)]
    user_satisfaction: Option<f64>,
    #[serde(default)]
    context: Option<TurnContextInput>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = dae_hyphae::config::CliArgs::parse();
    let mut config = Config::load();
    if let Some(state_dir) = args.state_dir.clone() {
        config.persistence.state_dir = state_dir;
    }

    let engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(error) => {
            tracing::error!(%error, "atom catalog failed to load, cannot start");
            return ExitCode::FAILURE;
        }
    };

    let (user_id, user_input, user_satisfaction, context) = match args.input {
        Some(input) => (
            args.user_id.unwrap_or_else(|| "anonymous".to_string()),
            input,
            args.satisfaction,
            None,
        ),
        None => match read_stdin_turn() {
            Ok(turn) => (turn.user_id, turn.user_input, turn.user_satisfaction, turn.context),
            Err(error) => {
                tracing::error!(%error, "failed to read turn from stdin");
                let minimal = engine
                    .process_turn(
                        args.user_id.as_deref().unwrap_or("anonymous"),
                        "",
                        None,
                        None,
                    )
                    .await;
                print_result(&minimal, args.pretty);
                return ExitCode::SUCCESS;
            }
        },
    };

    let result = engine
        .process_turn(&user_id, &user_input, user_satisfaction, context)
        .await;

    print_result(&result, args.pretty);
    ExitCode::SUCCESS
}

fn read_stdin_turn() -> io::Result<StdinTurn> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    serde_json::from_str(&buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn print_result(result: &dae_hyphae::TurnResult, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
    .expect("TurnResult always serializes");
    println!("{json}");
}
