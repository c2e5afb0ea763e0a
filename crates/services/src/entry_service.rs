use chrono::NaiveDate;
use std::sync::Arc;

use hifz_core::model::{
    BasicEntry, JadeedDraft, PageNumber, RecordId, ReviewDraft, Section, SessionBatch, Student,
    StudentId,
};
use storage::repository::{SessionRepository, StorageError, StudentRepository};

use crate::Clock;
use crate::error::EntryError;

/// Write-side facade: registers students and commits session drafts.
///
/// Drafts are caller-owned values; nothing is persisted until a `commit_*`
/// call succeeds, and a commit writes its whole batch or nothing.
#[derive(Clone)]
pub struct EntryService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    students: Arc<dyn StudentRepository>,
}

impl EntryService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionRepository>,
        students: Arc<dyn StudentRepository>,
    ) -> Self {
        Self {
            clock,
            sessions,
            students,
        }
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Empty Juzhali draft dated today.
    #[must_use]
    pub fn juzhali_draft(&self) -> ReviewDraft {
        ReviewDraft::juzhali(self.today())
    }

    /// Empty Murajaat draft for one section, dated today.
    #[must_use]
    pub fn murajaat_draft(&self, section: Section) -> ReviewDraft {
        ReviewDraft::murajaat(self.today(), section)
    }

    /// Jadeed draft dated today.
    #[must_use]
    pub fn jadeed_draft(&self, start_page: PageNumber, end_page: PageNumber) -> JadeedDraft {
        JadeedDraft::new(self.today(), start_page, end_page)
    }

    /// Create or update a student.
    ///
    /// # Errors
    ///
    /// Returns `EntryError::Student` for a blank name, or
    /// `EntryError::Storage` on repository failures.
    pub async fn register_student(
        &self,
        id: StudentId,
        name: &str,
        teacher_name: Option<String>,
        start_date: Option<NaiveDate>,
    ) -> Result<Student, EntryError> {
        let student = Student::new(id, name, teacher_name, start_date)?;
        self.students.upsert_student(&student).await?;
        log::debug!("registered student {id}");
        Ok(student)
    }

    /// Validate and commit a Juzhali or Murajaat draft.
    ///
    /// # Errors
    ///
    /// Returns `EntryError::Draft` if validation fails, or
    /// `EntryError::Storage` if the student is unknown or persistence fails.
    pub async fn commit_review(
        &self,
        student_id: StudentId,
        draft: ReviewDraft,
    ) -> Result<Vec<RecordId>, EntryError> {
        let batch = draft.validate()?;
        self.commit(student_id, &batch).await
    }

    /// Validate and commit a Jadeed draft.
    ///
    /// # Errors
    ///
    /// Returns `EntryError::Draft` if validation fails, or
    /// `EntryError::Storage` if the student is unknown or persistence fails.
    pub async fn commit_jadeed(
        &self,
        student_id: StudentId,
        draft: JadeedDraft,
    ) -> Result<RecordId, EntryError> {
        let batch = draft.validate()?;
        let ids = self.commit(student_id, &batch).await?;
        ids.into_iter()
            .next()
            .ok_or(EntryError::Storage(StorageError::Conflict))
    }

    /// Append a marks-only record, as imported from a marks sheet.
    ///
    /// # Errors
    ///
    /// Returns `EntryError::Storage` if the student is unknown or persistence fails.
    pub async fn record_basic(
        &self,
        student_id: StudentId,
        entry: &BasicEntry,
    ) -> Result<RecordId, EntryError> {
        let id = self.sessions.append_basic(student_id, entry).await?;
        log::debug!(
            "student {student_id}: basic {} record {id} on {}",
            entry.stage,
            entry.date
        );
        Ok(id)
    }

    async fn commit(
        &self,
        student_id: StudentId,
        batch: &SessionBatch,
    ) -> Result<Vec<RecordId>, EntryError> {
        let ids = self.sessions.append_batch(student_id, batch).await?;
        log::info!(
            "student {student_id}: committed {} session of {} records on {}",
            batch.stage(),
            ids.len(),
            batch.date()
        );
        Ok(ids)
    }
}
