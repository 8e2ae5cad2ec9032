//! Frame-stepped play without a clock. Every input produces exactly one
//! recorded frame, which makes scripted games and replays deterministic.

use crate::grid::Direction;
use crate::settings::ArcadeSettings;
use crate::snake_core::SnakeCore;

/// A pure game: the next state depends only on the previous state and input.
pub trait GameLogic {
    type State;
    type Input;

    fn initial_state(&self) -> Self::State;
    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State;
}

/// Drives a [`GameLogic`] and keeps every frame it produced.
#[derive(Debug)]
pub struct HeadlessRunner<G: GameLogic> {
    game: G,
    frames: Vec<G::State>,
}

impl<G: GameLogic> HeadlessRunner<G> {
    pub fn new(game: G) -> Self {
        let first = game.initial_state();
        Self {
            game,
            frames: vec![first],
        }
    }

    /// Index of the latest frame; the initial state is frame 0.
    pub fn frame(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn state(&self) -> &G::State {
        // `frames` starts non-empty and only grows.
        &self.frames[self.frames.len() - 1]
    }

    pub fn history(&self) -> &[G::State] {
        &self.frames
    }

    pub fn step(&mut self, input: G::Input) -> usize {
        let next = self.game.step(self.state(), input);
        self.frames.push(next);
        self.frame()
    }

    pub fn run<I>(&mut self, inputs: I) -> usize
    where
        I: IntoIterator<Item = G::Input>,
    {
        for input in inputs {
            self.step(input);
        }
        self.frame()
    }
}

/// One frame of scripted play: an optional command, then one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcadeInput {
    Noop,
    Start,
    Turn(Direction),
    Restart,
}

#[derive(Debug, Clone)]
pub struct SnakeLogic {
    settings: ArcadeSettings,
    seed: u64,
}

impl SnakeLogic {
    pub fn new(settings: ArcadeSettings, seed: u64) -> Self {
        Self { settings, seed }
    }
}

impl GameLogic for SnakeLogic {
    type State = SnakeCore;
    type Input = ArcadeInput;

    fn initial_state(&self) -> Self::State {
        SnakeCore::new(&self.settings, self.seed)
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();
        match input {
            ArcadeInput::Noop => {}
            ArcadeInput::Start => next.start(),
            ArcadeInput::Turn(direction) => {
                next.turn(direction);
            }
            ArcadeInput::Restart => next.restart(),
        }
        next.tick();
        next
    }
}
