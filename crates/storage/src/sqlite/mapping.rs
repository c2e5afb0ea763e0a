use chrono::NaiveDate;
use hifz_core::model::{
    BasicEntry, BasicRecord, DetailedEntry, DetailedRecord, GradeValue, PageNumber, RecordId,
    Section, Stage, Student, StudentId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn record_id_from_i64(v: i64) -> Result<RecordId, StorageError> {
    Ok(RecordId::new(i64_to_u64("id", v)?))
}

pub(crate) fn seq_from_i64(v: i64) -> Result<u64, StorageError> {
    i64_to_u64("seq", v)
}

pub(crate) fn student_id_from_i64(v: i64) -> Result<StudentId, StorageError> {
    Ok(StudentId::new(i64_to_u64("student_id", v)?))
}

/// Grades are stored as text; numeric text comes back numeric.
pub(crate) fn grade_to_text(grade: Option<&GradeValue>) -> Option<String> {
    grade.map(GradeValue::to_stored)
}

pub(crate) fn grade_from_text(raw: Option<String>) -> Option<GradeValue> {
    let raw = raw?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(GradeValue::Numeric(v)),
        _ => GradeValue::from_text(&raw),
    }
}

fn stage(row: &SqliteRow) -> Result<Stage, StorageError> {
    row.try_get::<String, _>("stage")
        .map_err(ser)?
        .parse::<Stage>()
        .map_err(ser)
}

fn section(row: &SqliteRow) -> Result<Option<Section>, StorageError> {
    row.try_get::<Option<i64>, _>("section")
        .map_err(ser)?
        .map(Section::from_i64)
        .transpose()
        .map_err(ser)
}

fn page(row: &SqliteRow, column: &'static str) -> Result<Option<PageNumber>, StorageError> {
    row.try_get::<Option<i64>, _>(column)
        .map_err(ser)?
        .map(PageNumber::from_i64)
        .transpose()
        .map_err(ser)
}

fn ayah(row: &SqliteRow, column: &'static str) -> Result<Option<u16>, StorageError> {
    row.try_get::<Option<i64>, _>(column)
        .map_err(ser)?
        .map(|v| {
            u16::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {column}: {v}")))
        })
        .transpose()
}

fn count(row: &SqliteRow, column: &'static str) -> Result<Option<u32>, StorageError> {
    row.try_get::<Option<i64>, _>(column)
        .map_err(ser)?
        .map(|v| {
            u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {column}: {v}")))
        })
        .transpose()
}

pub(crate) fn map_basic_row(row: &SqliteRow) -> Result<BasicRecord, StorageError> {
    let date: NaiveDate = row.try_get("session_date").map_err(ser)?;
    Ok(BasicRecord {
        id: record_id_from_i64(row.try_get("id").map_err(ser)?)?,
        seq: seq_from_i64(row.try_get("seq").map_err(ser)?)?,
        student_id: student_id_from_i64(row.try_get("student_id").map_err(ser)?)?,
        entry: BasicEntry {
            stage: stage(row)?,
            date,
            section: section(row)?,
            page: row.try_get("page").map_err(ser)?,
            jadeed_page: page(row, "jadeed_page")?,
            starting_ayah: ayah(row, "starting_ayah")?,
            ending_ayah: ayah(row, "ending_ayah")?,
            overall_grade: grade_from_text(row.try_get("overall_grade").map_err(ser)?),
            notes: row.try_get("notes").map_err(ser)?,
        },
    })
}

pub(crate) fn map_detailed_row(row: &SqliteRow) -> Result<DetailedRecord, StorageError> {
    let date: NaiveDate = row.try_get("session_date").map_err(ser)?;
    Ok(DetailedRecord {
        id: record_id_from_i64(row.try_get("id").map_err(ser)?)?,
        seq: seq_from_i64(row.try_get("seq").map_err(ser)?)?,
        student_id: student_id_from_i64(row.try_get("student_id").map_err(ser)?)?,
        entry: DetailedEntry {
            stage: stage(row)?,
            date,
            section: section(row)?,
            page_tested: row.try_get("page_tested").map_err(ser)?,
            juzhali_page: page(row, "juzhali_page")?,
            jadeed_page: page(row, "jadeed_page")?,
            start_ayah: ayah(row, "start_ayah")?,
            end_ayah: ayah(row, "end_ayah")?,
            talqeen_count: count(row, "talqeen_count")?,
            tambeeh_count: count(row, "tambeeh_count")?,
            core_mistake: row.try_get("core_mistake").map_err(ser)?,
            specific_mistake: row.try_get("specific_mistake").map_err(ser)?,
            overall_grade: grade_from_text(row.try_get("overall_grade").map_err(ser)?),
            notes: row.try_get("notes").map_err(ser)?,
        },
    })
}

pub(crate) fn map_student_row(row: &SqliteRow) -> Result<Student, StorageError> {
    Student::new(
        student_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get("teacher_name").map_err(ser)?,
        row.try_get("start_date").map_err(ser)?,
    )
    .map_err(ser)
}
