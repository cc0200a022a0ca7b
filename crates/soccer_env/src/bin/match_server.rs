//! # Match Server
//!
//! Hosts one match for two controllers.
//!
//! ```bash
//! # Local physics, default court
//! RUST_LOG=info match_server
//!
//! # Mirror a PHI simulator, stop after 5000 turns
//! match_server --config match.toml --simulator 127.0.0.1 --max-turns 5000
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use soccer_env::{MatchConfig, MatchServer};

#[derive(Parser)]
#[command(name = "match_server")]
#[command(about = "Serve a two-robot soccer match over TCP")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// PHI simulator host, overrides the configuration
    #[arg(long)]
    simulator: Option<String>,

    /// Stop after this many turns
    #[arg(long)]
    max_turns: Option<u64>,

    /// Seed for restart positions
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(args: &Args) -> Result<MatchConfig, soccer_env::ConfigError> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::from_toml_file(path)?,
        None => MatchConfig::default(),
    };
    if let Some(port) = args.port {
        config.network.server_port = port;
    }
    if let Some(host) = &args.simulator {
        config.network.simulator_host = Some(host.clone());
    }
    if let Some(max_turns) = args.max_turns {
        config.rules.max_turns = max_turns;
    }
    if args.seed.is_some() {
        config.rules.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = MatchServer::new(config).and_then(|mut server| {
        server.bind()?;
        server.run()
    });

    match result {
        Ok(summary) => {
            println!(
                "Final score: player 0 {} - {} player 1 after {} turns ({} faults, {} ball outs)",
                summary.scores[1],
                summary.scores[0],
                summary.turns,
                summary.fault_count,
                summary.ball_out_count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("match server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
