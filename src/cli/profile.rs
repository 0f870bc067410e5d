//! Profile command implementation

use anyhow::Result;
use serde::Serialize;

use questline::{PlayerStats, StreakRecord};

use super::Context;

#[derive(Serialize)]
struct Profile {
    #[serde(flatten)]
    stats: PlayerStats,
    progress_to_next: f32,
    streak: Option<StreakRecord>,
    streak_active: bool,
}

/// Show XP, level and streak for a user
pub fn profile_command(ctx: &Context, user: &str) -> Result<()> {
    let stats = ctx.engine.player_stats(user)?;
    let streak = ctx.engine.streak(user)?;
    let today = ctx.engine.calendar().today();

    let profile = Profile {
        progress_to_next: stats.progress_to_next(),
        streak_active: streak.as_ref().is_some_and(|s| s.is_active(today)),
        stats,
        streak,
    };

    ctx.emit(&profile, |p| {
        println!("{}: level {} ({})", user, p.stats.level, p.stats.title);
        match p.stats.next_level_xp {
            Some(next) => println!(
                "  XP: {} / {} ({:.0}%)",
                p.stats.total_xp,
                next,
                p.progress_to_next * 100.0
            ),
            None => println!("  XP: {} (max level)", p.stats.total_xp),
        }
        match &p.streak {
            Some(s) => println!(
                "  Streak: {} day(s){}  Longest: {}  Days active: {}",
                s.current_streak,
                if p.streak_active { "" } else { " (lapsed)" },
                s.longest_streak,
                s.total_days_active
            ),
            None => println!("  Streak: none yet"),
        }
    })
}
