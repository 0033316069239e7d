use crate::grading::GradingConfig;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "lmsd.sqlite3";
pub const GRADING_SETTINGS_KEY: &str = "setup.grading";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    // Workspaces created before updated_at was tracked.
    ensure_settings_updated_at(&conn)?;

    Ok(conn)
}

fn settings_get_raw(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(raw)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    match settings_get_raw(conn, key)? {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO settings(key, value_json, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value_json = excluded.value_json,
           updated_at = excluded.updated_at",
        (key, serde_json::to_string(value)?, now),
    )?;
    Ok(())
}

/// Defaults overlaid with whatever the workspace saved. A saved object that no
/// longer validates falls back to the defaults rather than blocking the open.
pub fn load_grading_config(conn: &Connection) -> anyhow::Result<GradingConfig> {
    let defaults = GradingConfig::default();
    let Some(raw) = settings_get_raw(conn, GRADING_SETTINGS_KEY)? else {
        return Ok(defaults);
    };
    let saved: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key = GRADING_SETTINGS_KEY, error = %e, "saved grading config is not valid JSON; using defaults");
            return Ok(defaults);
        }
    };
    let Some(saved_obj) = saved.as_object() else {
        tracing::warn!(key = GRADING_SETTINGS_KEY, "saved grading config is not an object; using defaults");
        return Ok(defaults);
    };
    match defaults.merge_patch(saved_obj) {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            tracing::warn!(key = GRADING_SETTINGS_KEY, error = %e, "ignoring saved grading config");
            Ok(defaults)
        }
    }
}

pub fn save_grading_config(conn: &Connection, config: &GradingConfig) -> anyhow::Result<()> {
    settings_set_json(conn, GRADING_SETTINGS_KEY, &serde_json::to_value(config)?)
}

fn ensure_settings_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "settings", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE settings ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::GradingScale;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ))
    }

    #[test]
    fn grading_config_round_trips_through_settings() {
        let workspace = temp_dir("lmsd-db-grading");
        let conn = open_db(&workspace).expect("open db");
        assert_eq!(load_grading_config(&conn).expect("load"), GradingConfig::default());

        let cfg = GradingConfig {
            grading_scale: GradingScale::Letter,
            pass_cutoff: 55,
            ..GradingConfig::default()
        };
        save_grading_config(&conn, &cfg).expect("save");
        drop(conn);

        let conn = open_db(&workspace).expect("reopen db");
        assert_eq!(load_grading_config(&conn).expect("load"), cfg);
    }

    #[test]
    fn malformed_saved_config_falls_back_to_defaults() {
        let workspace = temp_dir("lmsd-db-grading-bad");
        let conn = open_db(&workspace).expect("open db");
        settings_set_json(
            &conn,
            GRADING_SETTINGS_KEY,
            &serde_json::json!({ "passCutoff": 400 }),
        )
        .expect("set");
        assert_eq!(load_grading_config(&conn).expect("load"), GradingConfig::default());
    }

    #[test]
    fn unparseable_saved_config_falls_back_to_defaults() {
        let workspace = temp_dir("lmsd-db-grading-garbled");
        let conn = open_db(&workspace).expect("open db");
        conn.execute(
            "INSERT INTO settings(key, value_json) VALUES(?, ?)",
            (GRADING_SETTINGS_KEY, "{not json"),
        )
        .expect("insert garbled row");
        assert_eq!(load_grading_config(&conn).expect("load"), GradingConfig::default());
        assert!(settings_get_json(&conn, GRADING_SETTINGS_KEY).is_err());
    }

    #[test]
    fn older_settings_table_gains_updated_at() {
        let workspace = temp_dir("lmsd-db-migrate");
        std::fs::create_dir_all(&workspace).expect("mkdir");
        {
            let conn = Connection::open(workspace.join(DB_FILE_NAME)).expect("raw open");
            conn.execute(
                "CREATE TABLE settings(key TEXT PRIMARY KEY, value_json TEXT NOT NULL)",
                [],
            )
            .expect("legacy table");
        }
        let conn = open_db(&workspace).expect("open db");
        assert!(table_has_column(&conn, "settings", "updated_at").expect("pragma"));
        settings_set_json(&conn, "k", &serde_json::json!(1)).expect("set");
        assert_eq!(settings_get_json(&conn, "k").expect("get"), Some(serde_json::json!(1)));
    }
}
