use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use rusqlite::types::ToSql;
use uuid::Uuid;

use peakstreak_types::models::{Habit, HabitLog, User};

use crate::Database;
use crate::models::{
    HABIT_COLUMNS, HabitLogRow, HabitRow, LOG_COLUMNS, PublicUserRow, USER_COLUMNS, UserRow, format_date,
    format_timestamp,
};

/// Row shape of the leaderboard query: a public user and their positive-log count.
pub struct RankedRow {
    pub user: PublicUserRow,
    pub total: i64,
}

/// Row shape of the recent activity query.
pub struct ActivityRow {
    pub user: PublicUserRow,
    pub habit: HabitRow,
}

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &User) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password_hash, avatar_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    user.password_hash,
                    user.avatar_url,
                    format_timestamp(&user.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", &[&username]))
    }

    pub fn get_user_by_identifier(&self, identifier: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1 OR email = ?1", &[&identifier]))
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        let id = id.to_string();
        self.with_conn(|conn| query_user(conn, "id = ?1", &[&id]))
    }

    /// `None` when the user does not exist, `Some(None)` when they have no avatar.
    pub fn get_user_avatar(&self, user_id: Uuid) -> Result<Option<Option<String>>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT avatar_url FROM users WHERE id = ?1",
                [user_id.to_string()],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Returns the number of rows changed.
    pub fn update_user_avatar(&self, user_id: Uuid, avatar_url: Option<&str>) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET avatar_url = ?1 WHERE id = ?2",
                rusqlite::params![avatar_url, user_id.to_string()],
            )?;
            Ok(changed)
        })
    }

    pub fn search_users(&self, query: &str, limit: u32) -> Result<Vec<PublicUserRow>> {
        let pattern = format!("%{}%", escape_like(query));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, avatar_url FROM users
                 WHERE username LIKE ?1 ESCAPE '\\'
                 ORDER BY username
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![pattern, limit], |row| PublicUserRow::from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Habits --

    pub fn create_habit(&self, habit: &Habit) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO habits (id, user_id, name, color_hue, is_boolean, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    habit.id.to_string(),
                    habit.user_id.to_string(),
                    habit.name,
                    habit.color_hue,
                    habit.is_boolean,
                    format_timestamp(&habit.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_habits_by_user_id(&self, user_id: Uuid) -> Result<Vec<HabitRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM habits WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
                HABIT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([user_id.to_string()], |row| HabitRow::from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_habit_by_id(&self, habit_id: Uuid) -> Result<Option<HabitRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                [habit_id.to_string()],
                |row| HabitRow::from_row(row, 0),
            )
            .optional()
        })
    }

    /// Updates name and hue. Returns the number of rows changed.
    pub fn update_habit(&self, habit: &Habit) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE habits SET name = ?1, color_hue = ?2 WHERE id = ?3",
                rusqlite::params![habit.name, habit.color_hue, habit.id.to_string()],
            )?;
            Ok(changed)
        })
    }

    /// Deletes only when `owner_id` matches. Returns the number of rows removed.
    pub fn delete_habit(&self, habit_id: Uuid, owner_id: Uuid) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM habits WHERE id = ?1 AND user_id = ?2",
                [habit_id.to_string(), owner_id.to_string()],
            )?;
            Ok(removed)
        })
    }

    pub fn upsert_habit_log(&self, log: &HabitLog) -> Result<HabitLogRow> {
        self.with_conn_mut(|conn| {
            let row = conn.query_row(
                &format!(
                    "INSERT INTO habit_logs (id, habit_id, log_date, value, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(habit_id, log_date)
                     DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                     RETURNING {}",
                    LOG_COLUMNS
                ),
                rusqlite::params![
                    log.id.to_string(),
                    log.habit_id.to_string(),
                    format_date(log.log_date),
                    log.value,
                    format_timestamp(&log.created_at),
                    format_timestamp(&log.updated_at),
                ],
                HabitLogRow::from_row,
            )?;
            Ok(row)
        })
    }

    /// Batch-fetch logs for a set of habits inside `[start, end]`.
    pub fn get_logs_for_habits(
        &self,
        habit_ids: &[Uuid],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HabitLogRow>> {
        if habit_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut params: Vec<String> = habit_ids.iter().map(Uuid::to_string).collect();
        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT {} FROM habit_logs
             WHERE habit_id IN ({}) AND log_date >= ?{} AND log_date <= ?{}
             ORDER BY habit_id, log_date",
            LOG_COLUMNS,
            placeholders.join(", "),
            params.len() + 1,
            params.len() + 2,
        );
        params.push(format_date(start));
        params.push(format_date(end));

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
            let rows = stmt
                .query_map(params.as_slice(), HabitLogRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Follow graph --

    pub fn follow(&self, follower_id: Uuid, followee_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO followers (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
                [follower_id.to_string(), followee_id.to_string(), format_timestamp(&at)],
            )?;
            Ok(())
        })
    }

    pub fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM followers WHERE follower_id = ?1 AND following_id = ?2",
                [follower_id.to_string(), followee_id.to_string()],
            )?;
            Ok(())
        })
    }

    pub fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM followers WHERE follower_id = ?1 AND following_id = ?2)",
                [follower_id.to_string(), followee_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(found)
        })
    }

    pub fn get_follower_count(&self, user_id: Uuid) -> Result<i64> {
        self.with_conn(|conn| count(conn, "SELECT COUNT(*) FROM followers WHERE following_id = ?1", user_id))
    }

    pub fn get_following_count(&self, user_id: Uuid) -> Result<i64> {
        self.with_conn(|conn| count(conn, "SELECT COUNT(*) FROM followers WHERE follower_id = ?1", user_id))
    }

    pub fn get_followers(&self, user_id: Uuid) -> Result<Vec<PublicUserRow>> {
        self.with_conn(|conn| {
            query_edge_users(
                conn,
                "SELECT u.id, u.username, u.avatar_url FROM followers f
                 JOIN users u ON u.id = f.follower_id
                 WHERE f.following_id = ?1
                 ORDER BY f.created_at DESC, f.rowid DESC",
                user_id,
            )
        })
    }

    pub fn get_following(&self, user_id: Uuid) -> Result<Vec<PublicUserRow>> {
        self.with_conn(|conn| {
            query_edge_users(
                conn,
                "SELECT u.id, u.username, u.avatar_url FROM followers f
                 JOIN users u ON u.id = f.following_id
                 WHERE f.follower_id = ?1
                 ORDER BY f.created_at DESC, f.rowid DESC",
                user_id,
            )
        })
    }

    // -- Feeds --

    pub fn get_leaderboard(&self, limit: u32) -> Result<Vec<RankedRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.avatar_url, COUNT(l.id) AS total
                 FROM users u
                 JOIN habits h ON h.user_id = u.id
                 JOIN habit_logs l ON l.habit_id = h.id
                 WHERE l.value > 0
                 GROUP BY u.id
                 ORDER BY total DESC, u.username
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(RankedRow {
                        user: PublicUserRow::from_row(row, 0)?,
                        total: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_recent_activity(&self, limit: u32) -> Result<Vec<ActivityRow>> {
        // SQLite takes the bare habit columns from the row that holds MAX().
        let sql = format!(
            "SELECT u.id, u.username, u.avatar_url, {}, MAX(l.updated_at) AS touched
             FROM habit_logs l
             JOIN habits h ON h.id = l.habit_id
             JOIN users u ON u.id = h.user_id
             WHERE l.value > 0
             GROUP BY u.id
             ORDER BY touched DESC
             LIMIT ?1",
            HABIT_COLUMNS
                .split(", ")
                .map(|c| format!("h.{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(ActivityRow {
                        user: PublicUserRow::from_row(row, 0)?,
                        habit: HabitRow::from_row(row, 3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, filter: &str, params: &[&dyn ToSql]) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, filter);
    conn.query_row(&sql, params, UserRow::from_row).optional()
}

fn query_edge_users(conn: &Connection, sql: &str, user_id: Uuid) -> Result<Vec<PublicUserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([user_id.to_string()], |row| PublicUserRow::from_row(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn count(conn: &Connection, sql: &str, user_id: Uuid) -> Result<i64> {
    let n = conn.query_row(sql, [user_id.to_string()], |row| row.get(0))?;
    Ok(n)
}

/// Escapes `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c\\d"), "a\\_b\\%c\\\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
