use hifz_core::model::{Student, StudentId};

use super::{
    SqliteRepository,
    mapping::{conn, id_i64, map_student_row},
};
use crate::repository::{StorageError, StudentRepository};

#[async_trait::async_trait]
impl StudentRepository for SqliteRepository {
    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError> {
        let id = id_i64("student_id", student.id().value())?;
        sqlx::query(
            r"
                INSERT INTO students (id, name, teacher_name, start_date)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    teacher_name = excluded.teacher_name,
                    start_date = excluded.start_date
            ",
        )
        .bind(id)
        .bind(student.name())
        .bind(student.teacher_name())
        .bind(student.start_date())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Student, StorageError> {
        let id = id_i64("student_id", id.value())?;
        let row = sqlx::query(
            r"
                SELECT id, name, teacher_name, start_date
                FROM students
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;
        map_student_row(&row)
    }

    async fn list_students(&self) -> Result<Vec<Student>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, name, teacher_name, start_date
                FROM students
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_student_row(&row)?);
        }
        Ok(out)
    }
}
