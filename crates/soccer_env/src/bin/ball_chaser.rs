//! # Ball Chaser
//!
//! Minimal controller: turn towards the ball, push it towards the goal this
//! robot attacks, back off walls. Plays until the server ends the match.
//!
//! ```bash
//! ball_chaser --host 127.0.0.1 --port 4000
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use soccer_env::{MatchSession, SessionConfig};

#[derive(Parser)]
#[command(name = "ball_chaser")]
#[command(about = "Drive a robot straight at the ball")]
struct Args {
    /// Match server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Match server port
    #[arg(short, long, default_value_t = soccer_env::DEFAULT_SERVER_PORT)]
    port: u16,

    /// Seconds to wait for the server during the handshake
    #[arg(long, default_value_t = 15)]
    handshake_timeout: u64,
}

/// Wheel forces for one turn, each in `[-1, 1]`.
fn steer(session: &MatchSession) -> (f32, f32) {
    // Close to a wall and facing it: reverse while turning away.
    if session.collision_distance() < session.robot_radius() && session.obstacle_angle().abs() < 0.5 {
        let away = -session.obstacle_angle().signum();
        return (-0.5 - 0.3 * away, -0.5 + 0.3 * away);
    }

    // Approach the ball slightly off-line so the push travels goalwards.
    let correction = 0.3 * session.target_angle(session.own_goal());
    let turn = (session.ball_angle() - correction).clamp(-1.0, 1.0);
    let speed = if turn.abs() > 0.8 { 0.2 } else { 0.8 };
    (
        (speed - turn).clamp(-1.0, 1.0),
        (speed + turn).clamp(-1.0, 1.0),
    )
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut session = MatchSession::with_config(SessionConfig {
        handshake_timeout: Duration::from_secs(args.handshake_timeout),
        ..SessionConfig::default()
    });

    if let Err(e) = session.connect(&args.host, args.port) {
        tracing::error!("cannot join the match: {}", e);
        return ExitCode::FAILURE;
    }
    println!("Playing as robot {:?}", session.id());

    let mut turns = 0_u64;
    loop {
        let (left, right) = steer(&session);
        if let Err(e) = session.act(left, right) {
            tracing::info!("match ended: {}", e);
            break;
        }
        turns += 1;
    }

    println!(
        "Played {} turns, score {} - {}",
        turns,
        session.own_score(),
        session.rival_score()
    );
    ExitCode::SUCCESS
}
