use std::time::Duration;

use arcade::{
    ArcadeCommand, ArcadeSettings, Cell, Direction, Phase, SnakeCore, TickDriver, TickEvent,
};
use tokio::sync::mpsc;

const PERIOD: Duration = Duration::from_millis(5);

fn cheap_rewards() -> ArcadeSettings {
    ArcadeSettings {
        reward_threshold: 10,
        ..ArcadeSettings::default()
    }
}

#[tokio::test]
async fn queued_commands_apply_before_the_first_tick() {
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(ArcadeCommand::Start).unwrap();
    tx.send(ArcadeCommand::Turn(Direction::Left)).unwrap();
    tx.send(ArcadeCommand::Turn(Direction::Right)).unwrap();
    tx.send(ArcadeCommand::Turn(Direction::Down)).unwrap();

    let driver = TickDriver::new(SnakeCore::new(&cheap_rewards(), 1), PERIOD).stop_on_game_over(true);
    let mut granted: Vec<u32> = Vec::new();
    let report = tokio::time::timeout(Duration::from_secs(5), driver.run(rx, &mut granted))
        .await
        .expect("game should end");
    drop(tx);

    let core = report.core;
    assert_eq!(core.phase(), Phase::GameOver);
    assert_eq!(core.direction(), Direction::Right);
    assert_eq!(core.head().y, 10);
    assert_eq!(core.head().x, 19);
    assert!(core.score() >= 10);
    assert_eq!(granted.iter().sum::<u32>(), core.score() / 10);
    assert_eq!(report.credits, core.score() / 10);
}

#[tokio::test]
async fn stop_and_closed_channel_end_the_loop() {
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(ArcadeCommand::Stop).unwrap();
    let mut granted: Vec<u32> = Vec::new();
    let report = TickDriver::from_settings(&ArcadeSettings::default(), 1)
        .run(rx, &mut granted)
        .await;
    assert_eq!(report.ticks, 0);
    drop(tx);

    let (tx, rx) = mpsc::unbounded_channel::<ArcadeCommand>();
    drop(tx);
    let report = TickDriver::from_settings(&ArcadeSettings::default(), 1)
        .run(rx, &mut granted)
        .await;
    assert_eq!(report.ticks, 0);
    assert_eq!(report.core.phase(), Phase::Idle);
}

#[tokio::test]
async fn rewards_are_forwarded_to_a_channel_sink() {
    let (tx, rx) = mpsc::unbounded_channel();
    let (mut credit_tx, mut credit_rx) = mpsc::unbounded_channel::<u32>();
    tx.send(ArcadeCommand::Start).unwrap();

    let core = SnakeCore::new(&cheap_rewards(), 1).with_layout(
        &[Cell::new(3, 3)],
        Direction::Up,
        Cell::new(3, 2),
    );
    let report = TickDriver::new(core, PERIOD)
        .stop_on_game_over(true)
        .run(rx, &mut credit_tx)
        .await;
    drop(tx);

    assert!(report.core.score() >= 10);
    assert_eq!(credit_rx.recv().await, Some(1));
}

#[test]
fn tick_event_marks_terminal_outcomes() {
    assert!(TickEvent::HitWall.ended_game());
    assert!(TickEvent::BoardFull.ended_game());
    assert!(!TickEvent::Ate.ended_game());
}
