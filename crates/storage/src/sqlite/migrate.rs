use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Schema version 1: students plus one table per historical record family.
///
/// Mistake counts stay nullable; a missing count is never stored as 0.
/// Both session tables draw `seq` from `session_sequence`, so rows from either
/// family sort in the order they were written.
const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS session_sequence (
            seq INTEGER PRIMARY KEY AUTOINCREMENT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            teacher_name TEXT,
            start_date TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS basic_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            seq INTEGER NOT NULL UNIQUE,
            student_id INTEGER NOT NULL,
            stage TEXT NOT NULL CHECK (stage IN ('Jadeed', 'Juzhali', 'Murajaat')),
            session_date TEXT NOT NULL,
            section INTEGER CHECK (section BETWEEN 1 AND 31),
            page TEXT,
            jadeed_page INTEGER CHECK (jadeed_page BETWEEN 1 AND 604),
            starting_ayah INTEGER CHECK (starting_ayah >= 0),
            ending_ayah INTEGER CHECK (ending_ayah >= 0),
            overall_grade TEXT,
            notes TEXT,
            FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS detailed_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            seq INTEGER NOT NULL UNIQUE,
            student_id INTEGER NOT NULL,
            stage TEXT NOT NULL CHECK (stage IN ('Jadeed', 'Juzhali', 'Murajaat')),
            session_date TEXT NOT NULL,
            section INTEGER CHECK (section BETWEEN 1 AND 31),
            page_tested TEXT,
            juzhali_page INTEGER CHECK (juzhali_page BETWEEN 1 AND 604),
            jadeed_page INTEGER CHECK (jadeed_page BETWEEN 1 AND 604),
            start_ayah INTEGER CHECK (start_ayah >= 0),
            end_ayah INTEGER CHECK (end_ayah >= 0),
            talqeen_count INTEGER CHECK (talqeen_count >= 0),
            tambeeh_count INTEGER CHECK (tambeeh_count >= 0),
            core_mistake TEXT,
            specific_mistake TEXT,
            overall_grade TEXT,
            notes TEXT,
            FOREIGN KEY (student_id) REFERENCES students(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_basic_sessions_student_date
            ON basic_sessions (student_id, session_date, seq);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_detailed_sessions_student_date
            ON detailed_sessions (student_id, session_date, seq);
    ",
];

/// Applies every schema version not yet recorded in `schema_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    for (version, statements) in [(1_i64, SCHEMA_V1)] {
        if is_applied(pool, version).await? {
            continue;
        }
        let mut tx = pool.begin().await?;
        for statement in statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
    }

    Ok(())
}
