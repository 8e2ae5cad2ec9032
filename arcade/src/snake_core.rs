//! Grid snake with a seeded food spawner.
//!
//! The snake is a queue of cells with the head at the front. A turn is only
//! recorded as pending and takes effect on the next tick, so two quick turns
//! between ticks can never fold the snake back onto itself.

use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Cell, Direction};
use crate::rewards::RewardTracker;
use crate::settings::ArcadeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    Running,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Not running; nothing moved.
    Skipped,
    Moved,
    Ate,
    HitWall,
    HitSelf,
    /// Food could not be placed because the board is full.
    BoardFull,
}

impl TickEvent {
    pub fn ended_game(self) -> bool {
        matches!(
            self,
            TickEvent::HitWall | TickEvent::HitSelf | TickEvent::BoardFull
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub event: TickEvent,
    /// Credits earned by this tick.
    pub credits: u32,
}

#[derive(Debug, Clone)]
pub struct SnakeCore {
    grid_size: i32,
    food_points: u32,
    snake: VecDeque<Cell>,
    direction: Direction,
    pending_direction: Option<Direction>,
    food: Cell,
    score: u32,
    high_score: u32,
    phase: Phase,
    rewards: RewardTracker,
    rng: StdRng,
}

impl SnakeCore {
    pub fn new(settings: &ArcadeSettings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let grid_size = settings.grid_size as i32;
        Self {
            grid_size,
            food_points: settings.food_points,
            snake: VecDeque::from([start_cell(grid_size)]),
            direction: Direction::Up,
            pending_direction: None,
            food: first_food(grid_size),
            score: 0,
            high_score: 0,
            phase: Phase::Idle,
            rewards: RewardTracker::new(settings.reward_threshold),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn head(&self) -> Cell {
        self.snake[0]
    }

    pub fn body(&self) -> impl Iterator<Item = Cell> + '_ {
        self.snake.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.snake.len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending_direction
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn credits_earned(&self) -> u32 {
        self.rewards.granted()
    }

    pub fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Running;
        }
    }

    /// Queues a turn for the next tick. Turns onto the current axis are
    /// ignored; a later valid turn replaces an earlier one.
    pub fn turn(&mut self, direction: Direction) -> bool {
        if self.phase == Phase::GameOver || !direction.is_perpendicular(self.direction) {
            return false;
        }
        self.pending_direction = Some(direction);
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Running {
            return self.outcome(TickEvent::Skipped, 0);
        }

        if let Some(next) = self.pending_direction.take() {
            self.direction = next;
        }

        let head = self.head().step(self.direction);
        if !head.in_bounds(self.grid_size) {
            self.end_game();
            return self.outcome(TickEvent::HitWall, 0);
        }
        if self.snake.contains(&head) {
            self.end_game();
            return self.outcome(TickEvent::HitSelf, 0);
        }

        self.snake.push_front(head);
        if head != self.food {
            self.snake.pop_back();
            return self.outcome(TickEvent::Moved, 0);
        }

        self.score += self.food_points;
        let credits = self.rewards.observe(self.score);
        debug!(score = self.score, credits, "food eaten");
        match self.place_food() {
            Some(food) => {
                self.food = food;
                self.outcome(TickEvent::Ate, credits)
            }
            None => {
                self.end_game();
                self.outcome(TickEvent::BoardFull, credits)
            }
        }
    }

    /// Starts a fresh game from any phase. The high score is kept.
    pub fn restart(&mut self) {
        self.snake = VecDeque::from([start_cell(self.grid_size)]);
        self.direction = Direction::Up;
        self.pending_direction = None;
        self.score = 0;
        self.rewards.reset();
        if let Some(food) = self.place_food() {
            self.food = food;
        }
        self.phase = Phase::Running;
    }

    fn end_game(&mut self) {
        self.phase = Phase::GameOver;
        self.pending_direction = None;
        if self.score > self.high_score {
            self.high_score = self.score;
        }
        debug!(score = self.score, high_score = self.high_score, "game over");
    }

    fn outcome(&self, event: TickEvent, credits: u32) -> TickOutcome {
        TickOutcome { event, credits }
    }

    /// Uniform pick among cells the snake does not occupy.
    fn place_food(&mut self) -> Option<Cell> {
        let occupied: HashSet<Cell> = self.snake.iter().copied().collect();
        let free: Vec<Cell> = (0..self.grid_size)
            .flat_map(|y| (0..self.grid_size).map(move |x| Cell::new(x, y)))
            .filter(|cell| !occupied.contains(cell))
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[self.rng.gen_range(0..free.len())])
    }

    /// Replaces the board with a prepared position, head first. An empty
    /// `snake` keeps the current body.
    pub fn with_layout(mut self, snake: &[Cell], direction: Direction, food: Cell) -> Self {
        if !snake.is_empty() {
            self.snake = snake.iter().copied().collect();
        }
        self.direction = direction;
        self.food = food;
        self
    }
}

fn start_cell(grid_size: i32) -> Cell {
    Cell::new(grid_size / 2, grid_size / 2)
}

fn first_food(grid_size: i32) -> Cell {
    Cell::new(grid_size * 3 / 4, grid_size / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> SnakeCore {
        SnakeCore::new(&ArcadeSettings::default(), 7)
    }

    #[test]
    fn default_layout_matches_reference_board() {
        let core = core();
        assert_eq!(core.head(), Cell::new(10, 10));
        assert_eq!(core.food(), Cell::new(15, 10));
        assert_eq!(core.direction(), Direction::Up);
        assert_eq!(core.phase(), Phase::Idle);
    }

    #[test]
    fn full_board_ends_the_game() {
        let settings = ArcadeSettings {
            grid_size: 5,
            ..ArcadeSettings::default()
        };
        let mut snake = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                if (x, y) != (0, 0) && (x, y) != (1, 0) {
                    snake.push(Cell::new(x, y));
                }
            }
        }
        snake.insert(0, Cell::new(1, 0));
        let mut core = SnakeCore::new(&settings, 1).with_layout(
            &snake,
            Direction::Left,
            Cell::new(0, 0),
        );
        core.start();

        let outcome = core.tick();
        assert_eq!(outcome.event, TickEvent::BoardFull);
        assert!(core.is_game_over());
        assert_eq!(core.len(), 25);
    }

    #[test]
    fn food_never_lands_on_the_snake() {
        let mut core = core();
        core.start();
        for _ in 0..200 {
            if let Some(food) = core.place_food() {
                assert!(core.body().all(|c| c != food));
                assert!(food.in_bounds(core.grid_size()));
            }
        }
    }
}
