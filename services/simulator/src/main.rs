//! Terminal front end for the classroom-conflict training simulator.
//!
//! Reads teacher responses from stdin, and prints the transcript, feedback
//! and progress as the session advances. Completions come either straight
//! from the provider or through a running API server (`--server-url`).

mod cli;
mod render;

use anyhow::Context;
use clap::Parser;
use cli::{Args, Command, HELP};
use colored::*;
use safeclass_core::{
    config::ProviderConfig,
    llm_client::{CompletionClient, client_from_config},
    relay_client::RelayClient,
    scenario::ScenarioCatalog,
    simulator::{SimulationError, SimulationEvent, Simulator},
};
use std::{
    future::Future,
    io::{self, Write},
    sync::Arc,
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_event(event: SimulationEvent) {
    match event {
        SimulationEvent::TranscriptReset {
            scenario_title,
            transcript,
        } => print!("{}", render::transcript(&scenario_title, &transcript)),
        SimulationEvent::TeacherTurn(turn) => println!("{}", render::turn(&turn)),
        SimulationEvent::Feedback {
            text,
            evaluation,
            tone,
        } => print!("{}", render::feedback(&text, &evaluation, tone)),
        SimulationEvent::StudentTurns(turns) => {
            println!();
            for turn in &turns {
                println!("{}", render::turn(turn));
            }
        }
        SimulationEvent::CommunicationError(message) => println!("{}", message.red()),
    }
}

/// Runs `action` to completion while printing the events it publishes as
/// they arrive.
async fn drive<F: Future>(action: F, events: &mut mpsc::Receiver<SimulationEvent>) -> F::Output {
    tokio::pin!(action);
    loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => print_event(event),
            output = &mut action => {
                while let Ok(event) = events.try_recv() {
                    print_event(event);
                }
                return output;
            }
        }
    }
}

fn build_client(args: &Args) -> anyhow::Result<Arc<dyn CompletionClient>> {
    match &args.server_url {
        Some(url) => {
            info!(server_url = %url, "Using relay server.");
            let client = RelayClient::new(url, Duration::from_secs(args.timeout_secs))
                .context("Failed to build relay client")?;
            Ok(Arc::new(client))
        }
        None => {
            let config = ProviderConfig::from_env().context("Failed to load provider configuration")?;
            client_from_config(&config).context("Failed to build completion client")
        }
    }
}

fn report(result: Result<(), SimulationError>) {
    match result {
        Ok(()) => {}
        Err(SimulationError::Communication(_)) => {
            // Already announced through the event channel.
        }
        Err(e) => println!("{}", e.to_string().red()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(io::stderr)
        .init();

    let catalog = match &args.scenarios {
        Some(path) => ScenarioCatalog::from_json_file(path)?,
        None => ScenarioCatalog::builtin(),
    };
    let client = build_client(&args)?;

    let (tx, mut events) = mpsc::channel(32);
    let mut simulator = Simulator::new(client, catalog)?
        .with_reply_delay(Duration::from_millis(args.reply_delay_ms))
        .with_events(tx);

    println!("{}", "SAFE CLASS TRAINING SIMULATOR".bright_cyan().bold());
    println!("{}", HELP.dimmed());
    let start = simulator.start_scenario(args.scenario);
    drive(start, &mut events)
        .await
        .with_context(|| format!("Failed to start scenario {}", args.scenario))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => println!("{}", HELP.dimmed()),
            Command::Unknown(cmd) => println!("{}", format!("Unknown command {}", cmd).red()),
            Command::Summary => print!("{}", render::summary(&simulator.summary())),
            Command::Hint => match drive(simulator.hint(), &mut events).await {
                Ok(hint) => println!("\n{} {}", "Hint:".bright_magenta().bold(), hint),
                Err(e) => println!("{}", e.to_string().red()),
            },
            Command::Next => report(drive(simulator.next_scenario(), &mut events).await),
            Command::Restart => report(drive(simulator.reset(), &mut events).await),
            Command::Respond(text) => {
                let outcome = drive(simulator.submit(text), &mut events).await;
                report(outcome.map(|_| ()));
                let progress = simulator.session().scores().progress_percent();
                println!("\n  {}", render::progress_bar(progress).dimmed());
            }
        }
    }

    print!("{}", render::summary(&simulator.summary()));
    Ok(())
}
