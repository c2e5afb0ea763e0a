use hifz_core::model::{
    BasicEntry, DataFormatInfo, DetailedEntry, RecordId, SessionBatch, StudentId,
};

use super::{
    SqliteRepository,
    mapping::{
        conn, grade_to_text, id_i64, map_basic_row, map_detailed_row, record_id_from_i64,
    },
};
use crate::repository::{RawSessions, SessionRepository, StorageError};

const INSERT_DETAILED: &str = r"
    INSERT INTO detailed_sessions (
        seq, student_id, stage, session_date, section, page_tested, juzhali_page,
        jadeed_page, start_ayah, end_ayah, talqeen_count, tambeeh_count,
        core_mistake, specific_mistake, overall_grade, notes
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
";

impl SqliteRepository {
    async fn student_exists<'e, E>(executor: E, student: i64) -> Result<bool, StorageError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query("SELECT 1 FROM students WHERE id = ?1")
            .bind(student)
            .fetch_optional(executor)
            .await
            .map_err(conn)?;
        Ok(row.is_some())
    }

    /// Next value of the sequence shared by both session tables.
    async fn next_seq<'e, E>(executor: E) -> Result<i64, StorageError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let (seq,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO session_sequence DEFAULT VALUES RETURNING seq",
        )
        .fetch_one(executor)
        .await
        .map_err(conn)?;
        Ok(seq)
    }

    async fn count_rows(&self, table: &'static str, student: i64) -> Result<u64, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE student_id = ?1");
        let (n,) = sqlx::query_as::<_, (i64,)>(&sql)
            .bind(student)
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        u64::try_from(n).map_err(|_| StorageError::Serialization(format!("negative count: {n}")))
    }
}

fn bind_detailed<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    seq: i64,
    student: i64,
    entry: &'q DetailedEntry,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(seq)
        .bind(student)
        .bind(entry.stage.as_str())
        .bind(entry.date)
        .bind(entry.section.map(|s| i64::from(s.value())))
        .bind(entry.page_tested.as_deref())
        .bind(entry.juzhali_page.map(|p| i64::from(p.value())))
        .bind(entry.jadeed_page.map(|p| i64::from(p.value())))
        .bind(entry.start_ayah.map(i64::from))
        .bind(entry.end_ayah.map(i64::from))
        .bind(entry.talqeen_count.map(i64::from))
        .bind(entry.tambeeh_count.map(i64::from))
        .bind(entry.core_mistake.as_deref())
        .bind(entry.specific_mistake.as_deref())
        .bind(grade_to_text(entry.overall_grade.as_ref()))
        .bind(entry.notes.as_deref())
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn fetch_sessions(&self, student_id: StudentId) -> Result<RawSessions, StorageError> {
        let student = id_i64("student_id", student_id.value())?;

        let basic_rows = sqlx::query(
            r"
                SELECT
                    id, seq, student_id, stage, session_date, section, page, jadeed_page,
                    starting_ayah, ending_ayah, overall_grade, notes
                FROM basic_sessions
                WHERE student_id = ?1
                ORDER BY session_date ASC, seq ASC
            ",
        )
        .bind(student)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let detailed_rows = sqlx::query(
            r"
                SELECT
                    id, seq, student_id, stage, session_date, section, page_tested,
                    juzhali_page, jadeed_page, start_ayah, end_ayah, talqeen_count,
                    tambeeh_count, core_mistake, specific_mistake, overall_grade, notes
                FROM detailed_sessions
                WHERE student_id = ?1
                ORDER BY session_date ASC, seq ASC
            ",
        )
        .bind(student)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = RawSessions {
            basic: Vec::with_capacity(basic_rows.len()),
            detailed: Vec::with_capacity(detailed_rows.len()),
        };
        for row in basic_rows {
            out.basic.push(map_basic_row(&row)?);
        }
        for row in detailed_rows {
            out.detailed.push(map_detailed_row(&row)?);
        }
        Ok(out)
    }

    async fn append_basic(
        &self,
        student_id: StudentId,
        entry: &BasicEntry,
    ) -> Result<RecordId, StorageError> {
        let student = id_i64("student_id", student_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;
        if !Self::student_exists(&mut *tx, student).await? {
            return Err(StorageError::NotFound);
        }

        let seq = Self::next_seq(&mut *tx).await?;
        let res = sqlx::query(
            r"
                INSERT INTO basic_sessions (
                    seq, student_id, stage, session_date, section, page, jadeed_page,
                    starting_ayah, ending_ayah, overall_grade, notes
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )
        .bind(seq)
        .bind(student)
        .bind(entry.stage.as_str())
        .bind(entry.date)
        .bind(entry.section.map(|s| i64::from(s.value())))
        .bind(entry.page.as_deref())
        .bind(entry.jadeed_page.map(|p| i64::from(p.value())))
        .bind(entry.starting_ayah.map(i64::from))
        .bind(entry.ending_ayah.map(i64::from))
        .bind(grade_to_text(entry.overall_grade.as_ref()))
        .bind(entry.notes.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let id = record_id_from_i64(res.last_insert_rowid())?;

        tx.commit().await.map_err(conn)?;
        Ok(id)
    }

    async fn append_batch(
        &self,
        student_id: StudentId,
        batch: &SessionBatch,
    ) -> Result<Vec<RecordId>, StorageError> {
        let student = id_i64("student_id", student_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;
        if !Self::student_exists(&mut *tx, student).await? {
            return Err(StorageError::NotFound);
        }

        let mut ids = Vec::with_capacity(batch.len());
        for entry in batch.entries() {
            let seq = Self::next_seq(&mut *tx).await?;
            let res = bind_detailed(sqlx::query(INSERT_DETAILED), seq, student, entry)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            ids.push(record_id_from_i64(res.last_insert_rowid())?);
        }

        tx.commit().await.map_err(conn)?;
        Ok(ids)
    }

    async fn data_format_info(
        &self,
        student_id: StudentId,
    ) -> Result<DataFormatInfo, StorageError> {
        let student = id_i64("student_id", student_id.value())?;
        let basic = self.count_rows("basic_sessions", student).await?;
        let detailed = self.count_rows("detailed_sessions", student).await?;
        Ok(DataFormatInfo::new(basic, detailed))
    }
}
