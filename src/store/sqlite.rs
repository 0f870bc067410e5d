//! SQLite-backed gamification store
//!
//! Manages the questline database (`~/.questline/questline.db` by default) with automatic schema
//! migration. Every trait method takes the connection lock once, so each
//! call is a single atomic unit against the database.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{GamificationStore, MissionInstance, StreakRecord, XpRecord};
use crate::calendar::{day_string, parse_day};
use crate::error::StoreError;
use crate::missions::{MissionCategory, PeriodType};

/// Current schema version written by [`SqliteStore::open`]
const SCHEMA_VERSION: i32 = 2;

/// Database wrapper around a shared connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // WAL lets readers proceed while a request holds the write lock
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Self::from_connection(conn)
    }

    /// Private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema().context("Failed to initialize schema")?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Self::run_migrations(&conn)
    }

    fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Migration 2: record when a reward was claimed
        if version < 2 {
            let has_claimed_at: bool = conn
                .prepare("SELECT COUNT(*) FROM pragma_table_info('missions') WHERE name = 'claimed_at'")
                .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
                .map(|c| c > 0)
                .unwrap_or(false);

            if !has_claimed_at {
                conn.execute_batch("ALTER TABLE missions ADD COLUMN claimed_at INTEGER;")?;
            }
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (?1)", [SCHEMA_VERSION])?;
        }

        Ok(())
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }
}

impl ToSql for PeriodType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for PeriodType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        PeriodType::from_str(s).ok_or_else(|| FromSqlError::Other(format!("bad period: {s}").into()))
    }
}

impl ToSql for MissionCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for MissionCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        MissionCategory::from_str(s)
            .ok_or_else(|| FromSqlError::Other(format!("bad category: {s}").into()))
    }
}

const MISSION_COLUMNS: &str = "id, user_id, period_type, mission_key, title, category, target, \
    current, xp_reward, bonus_reward, expires_at, created_at, is_completed, is_claimed, claimed_at";

fn mission_from_row(row: &Row<'_>) -> rusqlite::Result<MissionInstance> {
    Ok(MissionInstance {
        id: row.get(0)?,
        user_id: row.get(1)?,
        period_type: row.get(2)?,
        mission_key: row.get(3)?,
        title: row.get(4)?,
        category: row.get(5)?,
        target: row.get(6)?,
        current: row.get(7)?,
        xp_reward: row.get(8)?,
        bonus_reward: row.get(9)?,
        expires_at: row.get(10)?,
        created_at: row.get(11)?,
        is_completed: row.get(12)?,
        is_claimed: row.get(13)?,
        claimed_at: row.get(14)?,
    })
}

fn insert_mission_row(conn: &Connection, m: &MissionInstance) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO missions ({MISSION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            m.id, m.user_id, m.period_type, m.mission_key, m.title, m.category, m.target,
            m.current, m.xp_reward, m.bonus_reward, m.expires_at, m.created_at, m.is_completed,
            m.is_claimed, m.claimed_at,
        ],
    )
}

fn query_missions(
    conn: &Connection,
    filter: &str,
    args: &[&dyn ToSql],
) -> Result<Vec<MissionInstance>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MISSION_COLUMNS} FROM missions WHERE {filter} ORDER BY created_at, rowid"
    ))?;
    let missions = stmt
        .query_map(args, mission_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(missions)
}

fn to_u64(table: &'static str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt {
        table,
        detail: format!("negative counter {value}"),
    })
}

fn to_i64(table: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Corrupt {
        table,
        detail: format!("counter {value} out of range"),
    })
}

impl GamificationStore for SqliteStore {
    fn get_streak(&self, user_id: &str) -> Result<Option<StreakRecord>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT current_streak, longest_streak, last_active_day, total_days_active, version
                 FROM streaks WHERE user_id = ?1",
                [user_id],
                |r| {
                    Ok((
                        r.get::<_, u32>(0)?,
                        r.get::<_, u32>(1)?,
                        r.get::<_, Option<String>>(2)?,
                        r.get::<_, u32>(3)?,
                        r.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((current, longest, last_day, total, version)) = row else {
            return Ok(None);
        };

        let last_active_date: Option<NaiveDate> = match last_day {
            Some(s) => Some(parse_day(&s).ok_or_else(|| StoreError::Corrupt {
                table: "streaks",
                detail: format!("bad day {s:?} for {user_id}"),
            })?),
            None => None,
        };

        Ok(Some(StreakRecord {
            user_id: user_id.to_string(),
            current_streak: current,
            longest_streak: longest,
            last_active_date,
            total_days_active: total,
            version: to_u64("streaks", version)?,
        }))
    }

    fn save_streak(&self, record: &StreakRecord) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let last_day = record.last_active_date.map(day_string);
        let now = Self::now_ms();

        let changed = if record.version == 0 {
            conn.execute(
                r#"
                INSERT INTO streaks (user_id, current_streak, longest_streak, last_active_day,
                                     total_days_active, version, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
                ON CONFLICT(user_id) DO NOTHING
                "#,
                params![
                    record.user_id, record.current_streak, record.longest_streak, last_day,
                    record.total_days_active, now,
                ],
            )?
        } else {
            let version = to_i64("streaks", record.version)?;
            conn.execute(
                r#"
                UPDATE streaks SET
                    current_streak = ?2, longest_streak = ?3, last_active_day = ?4,
                    total_days_active = ?5, version = version + 1, updated_at = ?6
                WHERE user_id = ?1 AND version = ?7
                "#,
                params![
                    record.user_id, record.current_streak, record.longest_streak, last_day,
                    record.total_days_active, now, version,
                ],
            )?
        };

        Ok(changed == 1)
    }

    fn list_active_missions(
        &self,
        user_id: &str,
        period: PeriodType,
        now_ms: i64,
    ) -> Result<Vec<MissionInstance>, StoreError> {
        let conn = self.conn()?;
        query_missions(
            &conn,
            "user_id = ?1 AND period_type = ?2 AND expires_at >= ?3",
            &[&user_id, &period, &now_ms],
        )
    }

    fn list_open_missions_by_key(
        &self,
        user_id: &str,
        mission_key: &str,
        now_ms: i64,
    ) -> Result<Vec<MissionInstance>, StoreError> {
        let conn = self.conn()?;
        query_missions(
            &conn,
            "user_id = ?1 AND mission_key = ?2 AND expires_at >= ?3 AND is_claimed = 0",
            &[&user_id, &mission_key, &now_ms],
        )
    }

    fn insert_missions_if_absent(
        &self,
        user_id: &str,
        period: PeriodType,
        window_start: NaiveDate,
        missions: &[MissionInstance],
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        // Take the write lock up front so other connections queue on busy_timeout
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let claimed_window = tx.execute(
            "INSERT OR IGNORE INTO mission_sets (user_id, period_type, window_start, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, period, day_string(window_start), Self::now_ms()],
        )?;
        if claimed_window == 0 {
            // Dropping the transaction rolls it back
            return Ok(false);
        }

        for mission in missions {
            insert_mission_row(&tx, mission)?;
        }
        tx.commit()?;
        Ok(true)
    }

    fn insert_mission(&self, mission: &MissionInstance) -> Result<(), StoreError> {
        let conn = self.conn()?;
        insert_mission_row(&conn, mission)?;
        Ok(())
    }

    fn get_mission(&self, id: &str) -> Result<Option<MissionInstance>, StoreError> {
        let conn = self.conn()?;
        let mission = conn
            .query_row(
                &format!("SELECT {MISSION_COLUMNS} FROM missions WHERE id = ?1"),
                [id],
                mission_from_row,
            )
            .optional()?;
        Ok(mission)
    }

    fn advance_mission(
        &self,
        id: &str,
        amount: u32,
        now_ms: i64,
    ) -> Result<Option<MissionInstance>, StoreError> {
        let conn = self.conn()?;
        // SET expressions all see the pre-update row
        let changed = conn.execute(
            r#"
            UPDATE missions SET
                current = MIN(current + ?2, target),
                is_completed = CASE WHEN is_completed = 1 OR current + ?2 >= target THEN 1 ELSE 0 END
            WHERE id = ?1 AND is_claimed = 0 AND expires_at >= ?3
            "#,
            params![id, amount, now_ms],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        let mission = conn
            .query_row(
                &format!("SELECT {MISSION_COLUMNS} FROM missions WHERE id = ?1"),
                [id],
                mission_from_row,
            )
            .optional()?;
        Ok(mission)
    }

    fn conditional_claim(&self, id: &str, now_ms: i64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE missions SET is_claimed = 1, claimed_at = ?2
             WHERE id = ?1 AND is_claimed = 0 AND is_completed = 1",
            params![id, now_ms],
        )?;
        Ok(changed == 1)
    }

    fn get_xp(&self, user_id: &str) -> Result<Option<XpRecord>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT total_xp, level FROM xp WHERE user_id = ?1",
                [user_id],
                |r| Ok((r.get::<_, i64>(0)?, r.get::<_, u32>(1)?)),
            )
            .optional()?;

        match row {
            Some((total, level)) => Ok(Some(XpRecord {
                user_id: user_id.to_string(),
                total_xp: to_u64("xp", total)?,
                level,
            })),
            None => Ok(None),
        }
    }

    fn increment_xp(
        &self,
        user_id: &str,
        amount: u64,
        initial_level: u32,
    ) -> Result<XpRecord, StoreError> {
        let amount = to_i64("xp", amount)?;
        let mut conn = self.conn()?;
        // Take the write lock up front so other connections queue on busy_timeout
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            r#"
            INSERT INTO xp (user_id, total_xp, level, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO UPDATE SET
                total_xp = total_xp + excluded.total_xp,
                updated_at = excluded.updated_at
            "#,
            params![user_id, amount, initial_level, Self::now_ms()],
        )?;
        let (total, level) = tx.query_row(
            "SELECT total_xp, level FROM xp WHERE user_id = ?1",
            [user_id],
            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, u32>(1)?)),
        )?;
        tx.commit()?;

        Ok(XpRecord {
            user_id: user_id.to_string(),
            total_xp: to_u64("xp", total)?,
            level,
        })
    }

    fn set_level(&self, user_id: &str, level: u32, total_xp: u64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let total_xp = to_i64("xp", total_xp)?;
        let changed = conn.execute(
            "UPDATE xp SET level = ?2, updated_at = ?3 WHERE user_id = ?1 AND total_xp = ?4",
            params![user_id, level, Self::now_ms(), total_xp],
        )?;
        Ok(changed == 1)
    }
}

/// SQL schema for the gamification database
const SCHEMA_SQL: &str = r#"
-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);

-- Daily activity streaks (one row per user)
CREATE TABLE IF NOT EXISTS streaks (
    user_id TEXT PRIMARY KEY,
    current_streak INTEGER NOT NULL DEFAULT 0,
    longest_streak INTEGER NOT NULL DEFAULT 0,
    last_active_day TEXT,
    total_days_active INTEGER NOT NULL DEFAULT 0,
    version INTEGER NOT NULL DEFAULT 1,
    updated_at INTEGER,
    CHECK (longest_streak >= current_streak)
);

-- One row per generated mission set; the key makes generation idempotent
CREATE TABLE IF NOT EXISTS mission_sets (
    user_id TEXT NOT NULL,
    period_type TEXT NOT NULL,
    window_start TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, period_type, window_start)
);

-- Mission instances
CREATE TABLE IF NOT EXISTS missions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    period_type TEXT NOT NULL,
    mission_key TEXT NOT NULL,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    target INTEGER NOT NULL CHECK (target > 0),
    current INTEGER NOT NULL DEFAULT 0 CHECK (current >= 0 AND current <= target),
    xp_reward INTEGER NOT NULL CHECK (xp_reward > 0),
    bonus_reward TEXT,
    expires_at INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0,
    is_claimed INTEGER NOT NULL DEFAULT 0,
    claimed_at INTEGER,
    CHECK (is_claimed = 0 OR is_completed = 1)
);
CREATE INDEX IF NOT EXISTS idx_missions_user_period ON missions(user_id, period_type, expires_at);
CREATE INDEX IF NOT EXISTS idx_missions_user_key ON missions(user_id, mission_key, expires_at);

-- XP and level (one row per user)
CREATE TABLE IF NOT EXISTS xp (
    user_id TEXT PRIMARY KEY,
    total_xp INTEGER NOT NULL DEFAULT 0 CHECK (total_xp >= 0),
    level INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
    updated_at INTEGER
);
"#;
