pub mod driver;
pub mod error;
pub mod grid;
pub mod logic;
pub mod rewards;
pub mod settings;
pub mod snake_core;
pub mod tick_millis;

pub use driver::{ArcadeCommand, DriverReport, RewardSink, TickDriver};
pub use error::ArcadeError;
pub use grid::{Cell, Direction};
pub use logic::{ArcadeInput, GameLogic, HeadlessRunner, SnakeLogic};
pub use rewards::RewardTracker;
pub use settings::{ArcadeSettings, SettingsStore};
pub use snake_core::{Phase, SnakeCore, TickEvent, TickOutcome};
