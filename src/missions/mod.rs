//! Missions: templates, generation, progress and reward claiming

mod catalog;
mod claim;
mod generator;
mod progress;
mod random;

pub use catalog::{Catalog, CatalogError, MissionCategory, MissionTemplate, PeriodType};
pub use claim::{ClaimOutcome, RewardClaimer};
pub use generator::{MissionGenerator, DEFAULT_MISSIONS_PER_PERIOD};
pub use progress::MissionProgressTracker;
pub use random::{sample, FixedSequence, RandomSource};
