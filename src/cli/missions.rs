//! Mission commands: list, advance, claim, grant

use anyhow::{bail, Result};
use chrono::Duration;

use questline::{GamificationError, MissionInstance, PeriodType};

use super::Context;

fn print_mission(m: &MissionInstance) {
    let state = if m.is_claimed {
        "claimed"
    } else if m.is_completed {
        "ready to claim"
    } else {
        "in progress"
    };
    println!(
        "  {:<28} {:>3}/{:<3} {:>4} XP  [{}]",
        m.title, m.current, m.target, m.xp_reward, state
    );
    if let Some(bonus) = &m.bonus_reward {
        println!("    Bonus: {}", bonus);
    }
    println!("    {} ({})", m.id, m.mission_key);
}

fn print_grouped(missions: &[MissionInstance]) {
    if missions.is_empty() {
        println!("No active missions.");
        return;
    }
    for period in [PeriodType::Daily, PeriodType::Weekly, PeriodType::Special] {
        let group: Vec<_> = missions.iter().filter(|m| m.period_type == period).collect();
        if group.is_empty() {
            continue;
        }
        println!("{}:", period.label());
        for m in group {
            print_mission(m);
        }
        println!();
    }
}

/// List active missions, generating today's and this week's sets if due
pub fn missions_command(ctx: &Context, user: &str) -> Result<()> {
    let missions = ctx.engine.get_missions(user)?;
    ctx.emit(&missions, |m| print_grouped(m))
}

pub fn advance_command(ctx: &Context, user: &str, key: &str, amount: u32) -> Result<()> {
    let updated = ctx.engine.advance_mission(user, key, amount)?;
    ctx.emit(&updated, |missions| {
        if missions.is_empty() {
            println!("No open missions for {}", key);
            return;
        }
        for m in missions {
            print_mission(m);
        }
    })
}

pub fn claim_command(ctx: &Context, user: &str, mission_id: &str) -> Result<()> {
    let outcome = match ctx.engine.claim_mission(user, mission_id) {
        Ok(outcome) => outcome,
        Err(GamificationError::StoreUnavailable(e)) => return Err(e.into()),
        Err(e) => bail!("Cannot claim {}: {}", mission_id, e),
    };

    ctx.emit(&outcome, |o| {
        println!("+{} XP (total {})", o.xp_awarded, o.new_total_xp);
        if let Some(bonus) = &o.bonus_reward {
            println!("Bonus: {}", bonus);
        }
        if let Some(up) = &o.level_up {
            println!("Level up! {} -> {} ({})", up.old_level, up.new_level, up.new_title);
        }
    })
}

pub fn grant_command(ctx: &Context, user: &str, key: &str, days: i64) -> Result<()> {
    if days <= 0 {
        bail!("--days must be positive");
    }
    let expires_at = ctx.engine.calendar().now() + Duration::days(days);
    let mission = ctx.engine.grant_special_mission(user, key, expires_at)?;
    ctx.emit(&mission, |m| {
        println!("Granted special mission, expires {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
        print_mission(m);
    })
}
