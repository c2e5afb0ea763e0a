use async_trait::async_trait;
use hifz_core::model::{
    BasicEntry, BasicRecord, DataFormatInfo, DetailedRecord, RecordId, SessionBatch, Student,
    StudentId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Both historical record families of one student, as stored.
///
/// Reconciliation into a single history happens in the engine, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSessions {
    pub basic: Vec<BasicRecord>,
    pub detailed: Vec<DetailedRecord>,
}

impl RawSessions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.basic.is_empty() && self.detailed.is_empty()
    }

    #[must_use]
    pub fn format_info(&self) -> DataFormatInfo {
        DataFormatInfo::new(self.basic.len() as u64, self.detailed.len() as u64)
    }
}

/// Repository contract for session history.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fetch every record of both families for a student.
    ///
    /// A student without records yields empty collections.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn fetch_sessions(&self, student_id: StudentId) -> Result<RawSessions, StorageError>;

    /// Append one marks-only record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist, or
    /// other storage errors.
    async fn append_basic(
        &self,
        student_id: StudentId,
        entry: &BasicEntry,
    ) -> Result<RecordId, StorageError>;

    /// Append a validated session batch as detailed records, all or nothing.
    ///
    /// Returns the new record ids in batch order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student does not exist, or
    /// other storage errors. Nothing is written on error.
    async fn append_batch(
        &self,
        student_id: StudentId,
        batch: &SessionBatch,
    ) -> Result<Vec<RecordId>, StorageError>;

    /// Count records per family for a student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures.
    async fn data_format_info(&self, student_id: StudentId)
    -> Result<DataFormatInfo, StorageError>;
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Persist or update a student.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the student cannot be stored.
    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError>;

    /// Fetch a student by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_student(&self, id: StudentId) -> Result<Student, StorageError>;

    /// All students ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_students(&self) -> Result<Vec<Student>, StorageError>;
}

#[derive(Default)]
struct SessionTables {
    basic: Vec<BasicRecord>,
    detailed: Vec<DetailedRecord>,
    next_basic_id: u64,
    next_detailed_id: u64,
    next_seq: u64,
}

impl SessionTables {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn next_basic(&mut self) -> RecordId {
        self.next_basic_id += 1;
        RecordId::new(self.next_basic_id)
    }

    fn next_detailed(&mut self) -> RecordId {
        self.next_detailed_id += 1;
        RecordId::new(self.next_detailed_id)
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Ids are assigned per family, like the two SQLite tables do; `seq` is one
/// counter shared by both.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    students: Arc<Mutex<HashMap<StudentId, Student>>>,
    sessions: Arc<Mutex<SessionTables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_student(&self, id: StudentId) -> Result<(), StorageError> {
        let guard = self
            .students
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::NotFound)
        }
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn fetch_sessions(&self, student_id: StudentId) -> Result<RawSessions, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(RawSessions {
            basic: guard
                .basic
                .iter()
                .filter(|r| r.student_id == student_id)
                .cloned()
                .collect(),
            detailed: guard
                .detailed
                .iter()
                .filter(|r| r.student_id == student_id)
                .cloned()
                .collect(),
        })
    }

    async fn append_basic(
        &self,
        student_id: StudentId,
        entry: &BasicEntry,
    ) -> Result<RecordId, StorageError> {
        self.ensure_student(student_id)?;
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = guard.next_basic();
        let seq = guard.next_seq();
        guard.basic.push(BasicRecord {
            id,
            seq,
            student_id,
            entry: entry.clone(),
        });
        Ok(id)
    }

    async fn append_batch(
        &self,
        student_id: StudentId,
        batch: &SessionBatch,
    ) -> Result<Vec<RecordId>, StorageError> {
        self.ensure_student(student_id)?;
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut ids = Vec::with_capacity(batch.len());
        for entry in batch.entries() {
            let id = guard.next_detailed();
            let seq = guard.next_seq();
            guard.detailed.push(DetailedRecord {
                id,
                seq,
                student_id,
                entry: entry.clone(),
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn data_format_info(
        &self,
        student_id: StudentId,
    ) -> Result<DataFormatInfo, StorageError> {
        Ok(self.fetch_sessions(student_id).await?.format_info())
    }
}

#[async_trait]
impl StudentRepository for InMemoryRepository {
    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError> {
        let mut guard = self
            .students
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(student.id(), student.clone());
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Student, StorageError> {
        let guard = self
            .students
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_students(&self) -> Result<Vec<Student>, StorageError> {
        let guard = self
            .students
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut students: Vec<Student> = guard.values().cloned().collect();
        students.sort_by_key(Student::id);
        Ok(students)
    }
}

/// Aggregates repositories for injection into services.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub students: Arc<dyn StudentRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let students: Arc<dyn StudentRepository> = Arc::new(repo);
        Self { sessions, students }
    }
}
