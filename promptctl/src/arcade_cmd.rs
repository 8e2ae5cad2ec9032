use std::time::Duration;

use anyhow::{Context, Result};
use arcade::{
    ArcadeCommand, ArcadeInput, ArcadeSettings, Cell, Direction, HeadlessRunner, SettingsStore,
    SnakeCore, SnakeLogic, TickDriver,
};
use clap::{Args, Subcommand};
use tokio::sync::mpsc;
use tracing::info;

use crate::session::Session;

#[derive(Debug, Subcommand)]
pub enum ArcadeCommands {
    /// Plays one game from a move script and banks the credits it earns.
    Play(PlayArgs),
    /// Shows the arcade settings, updating any value given.
    Settings(SettingsArgs),
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Comma separated: a direction turns then ticks once, `.` ticks once,
    /// a number ticks that many times.
    #[arg(long, value_delimiter = ',')]
    pub moves: Vec<String>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Drive the game on the wall clock instead of stepping it.
    #[arg(long, default_value_t = false)]
    pub realtime: bool,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[arg(long)]
    pub grid_size: Option<u32>,
    #[arg(long)]
    pub tick_ms: Option<u64>,
    #[arg(long)]
    pub reward_threshold: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Turn(Direction),
    Wait(u32),
}

pub async fn run(session: &mut Session, command: ArcadeCommands) -> Result<()> {
    match command {
        ArcadeCommands::Play(args) => cmd_play(session, args).await,
        ArcadeCommands::Settings(args) => cmd_settings(&args),
    }
}

pub fn cmd_settings(args: &SettingsArgs) -> Result<()> {
    let store = SettingsStore::from_env();
    let mut settings = store.load();
    let changed =
        args.grid_size.is_some() || args.tick_ms.is_some() || args.reward_threshold.is_some();
    if let Some(size) = args.grid_size {
        settings.grid_size = size;
    }
    if let Some(ms) = args.tick_ms {
        settings.tick_period = Duration::from_millis(ms);
    }
    if let Some(threshold) = args.reward_threshold {
        settings.reward_threshold = threshold;
    }
    if changed {
        settings = settings.sanitized();
        store
            .save(&settings)
            .with_context(|| format!("Failed to write {}", store.path().display()))?;
    }

    println!("file:             {}", store.path().display());
    println!("grid size:        {}", settings.grid_size);
    println!("tick:             {} ms", settings.tick_period.as_millis());
    println!("reward threshold: {}", settings.reward_threshold);
    println!("food points:      {}", settings.food_points);
    Ok(())
}

async fn cmd_play(session: &mut Session, args: PlayArgs) -> Result<()> {
    let settings = SettingsStore::from_env().load();
    let steps = parse_moves(&args.moves)?;
    let seed = args
        .seed
        .unwrap_or_else(|| chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64);

    let (core, credits) = if args.realtime {
        play_realtime(&settings, seed, &steps).await
    } else {
        play_headless(&settings, seed, &steps)
    };

    println!("{}", render_board(&core));
    println!(
        "score {}  high score {}  credits earned {credits}",
        core.score(),
        core.high_score()
    );
    info!(seed, score = core.score(), credits, "arcade game finished");

    if credits == 0 {
        return Ok(());
    }
    if !session.store.is_signed_in() {
        println!("Sign in to bank arcade credits");
        return Ok(());
    }
    let balance = session.store.add_ai_credits(credits).await?;
    println!("Credits banked. Balance: {balance}");
    Ok(())
}

fn parse_moves(tokens: &[String]) -> Result<Vec<Step>> {
    tokens
        .iter()
        .map(|token| token.trim())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token == "." {
                return Ok(Step::Wait(1));
            }
            if let Ok(n) = token.parse::<u32>() {
                return Ok(Step::Wait(n));
            }
            let direction = token
                .parse::<Direction>()
                .with_context(|| format!("Bad move {token:?}"))?;
            Ok(Step::Turn(direction))
        })
        .collect()
}

/// Steps the game one frame per move, then lets the snake run straight until
/// the game ends. Returns the final state and the credits earned.
fn play_headless(settings: &ArcadeSettings, seed: u64, steps: &[Step]) -> (SnakeCore, u32) {
    let mut runner = HeadlessRunner::new(SnakeLogic::new(*settings, seed));
    runner.step(ArcadeInput::Start);

    'script: for step in steps {
        match *step {
            Step::Turn(direction) => {
                runner.step(ArcadeInput::Turn(direction));
            }
            Step::Wait(n) => {
                for _ in 0..n {
                    if runner.state().is_game_over() {
                        break 'script;
                    }
                    runner.step(ArcadeInput::Noop);
                }
            }
        }
        if runner.state().is_game_over() {
            break;
        }
    }

    // Going straight reaches a wall within one grid length.
    let limit = runner.state().grid_size().max(0) as usize + 1;
    for _ in 0..limit {
        if runner.state().is_game_over() {
            break;
        }
        runner.step(ArcadeInput::Noop);
    }

    let credits = credits_in(runner.history());
    (runner.state().clone(), credits)
}

/// Credits granted across a recorded game. Restarts reset the per-game
/// counter, so only increases are summed.
fn credits_in(history: &[SnakeCore]) -> u32 {
    history
        .windows(2)
        .map(|pair| {
            pair[1]
                .credits_earned()
                .saturating_sub(pair[0].credits_earned())
        })
        .sum()
}

async fn play_realtime(settings: &ArcadeSettings, seed: u64, steps: &[Step]) -> (SnakeCore, u32) {
    let settings = settings.sanitized();
    let period = settings.tick_period;
    let (tx, rx) = mpsc::unbounded_channel();

    let feeder = {
        let tx = tx.clone();
        let steps = steps.to_vec();
        tokio::spawn(async move {
            let _ = tx.send(ArcadeCommand::Start);
            for step in steps {
                match step {
                    Step::Turn(direction) => {
                        if tx.send(ArcadeCommand::Turn(direction)).is_err() {
                            return;
                        }
                        tokio::time::sleep(period).await;
                    }
                    Step::Wait(n) => tokio::time::sleep(period * n).await,
                }
            }
        })
    };
    let interrupt = {
        let tx = tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(ArcadeCommand::Stop);
            }
        })
    };

    let mut granted: Vec<u32> = Vec::new();
    let report = TickDriver::from_settings(&settings, seed)
        .stop_on_game_over(true)
        .run(rx, &mut granted)
        .await;

    feeder.abort();
    interrupt.abort();
    drop(tx);
    (report.core, report.credits)
}

fn render_board(core: &SnakeCore) -> String {
    let size = core.grid_size();
    let body: Vec<Cell> = core.body().collect();
    let width = size.max(0) as usize + 2;
    let mut out = String::new();
    out.push_str(&"#".repeat(width));
    out.push('\n');
    for y in 0..size {
        out.push('#');
        for x in 0..size {
            let cell = Cell::new(x, y);
            let glyph = if cell == core.head() {
                'O'
            } else if body.contains(&cell) {
                'o'
            } else if cell == core.food() {
                '*'
            } else {
                ' '
            };
            out.push(glyph);
        }
        out.push_str("#\n");
    }
    out.push_str(&"#".repeat(width));
    out
}
