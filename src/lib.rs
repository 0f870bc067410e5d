//! Questline - streaks, missions and levels for engagement products
//!
//! Questline tracks three things per user:
//!
//! 1. **Streaks**: consecutive calendar days with at least one activity.
//! 2. **Missions**: daily and weekly sets sampled from a catalog, advanced by
//!    reported actions and claimed once for XP.
//! 3. **Levels**: derived from total XP against a configurable level table.
//!
//! All state lives behind [`store::GamificationStore`]; the bundled
//! [`store::SqliteStore`] is what the `questline` binary uses.

pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod levels;
pub mod missions;
pub mod store;
pub mod streaks;

pub use calendar::{Calendar, Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{EngineBuilder, GamificationEngine};
pub use error::{GamificationError, StoreError};
pub use levels::{LevelTable, LevelUp, PlayerStats};
pub use missions::{Catalog, ClaimOutcome, MissionTemplate, PeriodType};
pub use store::{GamificationStore, MissionInstance, SqliteStore, StreakRecord};
pub use streaks::StreakUpdate;
