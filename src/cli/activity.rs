//! Activity command implementation

use anyhow::Result;

use super::Context;

/// Record today's activity and print the resulting streak
pub fn activity_command(ctx: &Context, user: &str) -> Result<()> {
    let update = ctx.engine.record_activity(user)?;

    ctx.emit(&update, |u| {
        if !u.is_new_day {
            println!("Already active today. Streak: {} day(s)", u.current_streak);
        } else if u.streak_maintained {
            println!("Streak: {} day(s)", u.current_streak);
        } else {
            println!("Streak reset. Starting again at 1 day");
        }
        println!(
            "  Longest: {}  Days active: {}",
            u.longest_streak, u.total_days_active
        );
    })
}
