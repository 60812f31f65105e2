//! Vector Balls headless driver
//!
//! Runs one match at a fixed timestep without a window and prints the final
//! standings. Usage: `vector-balls [seed] [ball_count]`

use vector_balls::{
    MatchSettings,
    consts::*,
    sim::{MatchEvent, MatchState},
};

/// Simulated frame length fed to the accumulator (60 fps display)
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up on matches that run longer than this (simulated seconds)
const MAX_MATCH_SECONDS: f32 = 600.0;

/// Driver-side loop state
struct Game {
    state: MatchState,
    accumulator: f32,
}

impl Game {
    fn new(settings: MatchSettings) -> vector_balls::Result<Self> {
        Ok(Self {
            state: MatchState::new(settings)?,
            accumulator: 0.0,
        })
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) -> vector_balls::Result<()> {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS && !self.state.is_over() {
            for event in self.state.tick(SIM_DT)? {
                if let MatchEvent::Eliminated { ball_id, rank } = event {
                    let ball = &self.state.balls()[ball_id as usize];
                    println!(
                        "{:>7.2}s  Ball #{} ({}) is out, rank {}",
                        self.state.elapsed(),
                        ball_id + 1,
                        ball.color().name(),
                        rank
                    );
                }
            }
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let ball_count = args.next().and_then(|s| s.parse().ok()).unwrap_or(6);
    let settings = MatchSettings {
        ball_count,
        seed,
        ..MatchSettings::default()
    };

    if let Err(e) = run(settings) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(settings: MatchSettings) -> vector_balls::Result<()> {
    log::info!("Vector Balls (headless) starting...");
    let mut game = Game::new(settings)?;

    while !game.state.is_over() && game.state.elapsed() < MAX_MATCH_SECONDS {
        game.update(FRAME_DT)?;
    }

    if !game.state.is_over() {
        log::warn!("No winner after {MAX_MATCH_SECONDS}s, stopping");
        return Ok(());
    }

    match game.state.winner() {
        Some(ball) => println!("\nWINNER: Ball #{} ({})", ball.id + 1, ball.color().name()),
        None => println!("\nEveryone eliminated!"),
    }
    println!("\n{:<6} {:<6} {:<14} {:>13} {:>10}", "Place", "Ball", "Color", "Lines Removed", "Lines Lost");
    for entry in game.state.final_rankings()? {
        println!(
            "{:<6} {:<6} {:<14} {:>13} {:>10}",
            entry.place,
            format!("#{}", entry.ball_id + 1),
            entry.color.name(),
            entry.lines_removed,
            entry.lines_lost
        );
    }
    Ok(())
}
