mod config;
mod draft;
pub mod grade;
mod ids;
mod page;
mod record;
mod stage;
mod student;

pub use config::{WindowConfig, WindowConfigError};
pub use draft::{DraftError, JadeedDraft, PageEntry, ReviewDraft, SessionBatch};
pub use grade::{GradeValue, GradeWord};
pub use ids::{ParseIdError, RecordId, StudentId};
pub use page::{PAGES_PER_SECTION, PageError, PageNumber, PageRef, Section, TOTAL_PAGES};
pub use record::{
    BasicEntry, BasicRecord, DetailedEntry, DetailedRecord, JADEED_LEARNING, SESSION_SUMMARY,
    SessionRecord,
};
pub use stage::{DataFormatInfo, Provenance, Stage, StageError};
pub use student::{Student, StudentError};
