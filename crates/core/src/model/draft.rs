use chrono::NaiveDate;
use thiserror::Error;

use crate::model::grade::GradeValue;
use crate::model::page::{PageNumber, Section};
use crate::model::record::{DetailedEntry, JADEED_LEARNING, SESSION_SUMMARY};
use crate::model::stage::Stage;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum DraftError {
    #[error("session has no page entries")]
    Empty,

    #[error("page {page} is not in section {section}")]
    PageOutsideSection { page: PageNumber, section: Section },

    #[error("an overall grade is required to complete the session")]
    MissingGrade,

    #[error("ending page {end} is before starting page {start}")]
    EndBeforeStart { start: PageNumber, end: PageNumber },

    #[error("enter pages or ayahs completed")]
    NoProgress,

    #[error("pages completed must be a non-negative number, got {0}")]
    InvalidPagesCompleted(f64),
}

/// Validated, ready-to-commit entries produced from a draft.
///
/// Storage commits a batch atomically: either every entry lands or none do.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionBatch {
    stage: Stage,
    date: NaiveDate,
    entries: Vec<DetailedEntry>,
}

impl SessionBatch {
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn entries(&self) -> &[DetailedEntry] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<DetailedEntry> {
        self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//
// ─── REVIEW DRAFT (JUZHALI / MURAJAAT) ─────────────────────────────────────────
//

/// Mistakes noted for one page during a review session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub page: PageNumber,
    pub major: u32,
    pub minor: u32,
    pub core_mistake: Option<String>,
    pub specific_mistake: Option<String>,
}

impl PageEntry {
    #[must_use]
    pub fn new(page: PageNumber, major: u32, minor: u32) -> Self {
        Self {
            page,
            major,
            minor,
            core_mistake: None,
            specific_mistake: None,
        }
    }

    #[must_use]
    pub fn with_mistake(mut self, core: impl Into<String>, specific: impl Into<String>) -> Self {
        self.core_mistake = Some(core.into());
        self.specific_mistake = Some(specific.into());
        self
    }
}

/// A Juzhali or Murajaat session being built up page by page.
///
/// Nothing is stored until the caller validates the draft and commits the
/// resulting batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    stage: Stage,
    date: NaiveDate,
    section: Option<Section>,
    entries: Vec<PageEntry>,
    overall_grade: Option<GradeValue>,
    notes: Option<String>,
}

impl ReviewDraft {
    #[must_use]
    pub fn juzhali(date: NaiveDate) -> Self {
        Self::new(Stage::Juzhali, date, None)
    }

    #[must_use]
    pub fn murajaat(date: NaiveDate, section: Section) -> Self {
        Self::new(Stage::Murajaat, date, Some(section))
    }

    fn new(stage: Stage, date: NaiveDate, section: Option<Section>) -> Self {
        Self {
            stage,
            date,
            section,
            entries: Vec::new(),
            overall_grade: None,
            notes: None,
        }
    }

    /// Add or replace the entry for a page.
    pub fn record_page(&mut self, entry: PageEntry) {
        match self.entries.iter_mut().find(|e| e.page == entry.page) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove_page(&mut self, page: PageNumber) {
        self.entries.retain(|e| e.page != page);
    }

    pub fn set_overall_grade(&mut self, grade: impl Into<GradeValue>) {
        self.overall_grade = Some(grade.into());
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        self.notes = (!notes.trim().is_empty()).then_some(notes);
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    /// Validate into page entries followed by one session summary entry.
    ///
    /// # Errors
    ///
    /// - `Empty` when no page was recorded
    /// - `PageOutsideSection` when a Murajaat page is outside the chosen section
    /// - `MissingGrade` when no overall grade was given
    pub fn validate(self) -> Result<SessionBatch, DraftError> {
        if self.entries.is_empty() {
            return Err(DraftError::Empty);
        }
        for entry in &self.entries {
            if let Some(section) = self.section {
                if entry.page.section() != section {
                    return Err(DraftError::PageOutsideSection {
                        page: entry.page,
                        section,
                    });
                }
            }
        }
        let grade = self.overall_grade.ok_or(DraftError::MissingGrade)?;

        let mut out = Vec::with_capacity(self.entries.len() + 1);
        for entry in &self.entries {
            let mut detailed = DetailedEntry::new(self.stage, self.date);
            detailed.section = self.section;
            detailed.page_tested = Some(entry.page.to_string());
            if self.stage == Stage::Juzhali {
                detailed.juzhali_page = Some(entry.page);
            }
            detailed.talqeen_count = Some(entry.major);
            detailed.tambeeh_count = Some(entry.minor);
            detailed.core_mistake.clone_from(&entry.core_mistake);
            detailed.specific_mistake.clone_from(&entry.specific_mistake);
            detailed.notes = Some(match &self.notes {
                Some(notes) => format!("Page {} - {notes}", entry.page),
                None => format!("Page {}", entry.page),
            });
            out.push(detailed);
        }

        let listed: Vec<String> = self.entries.iter().map(|e| e.page.to_string()).collect();
        let mut summary = DetailedEntry::new(self.stage, self.date);
        summary.section = self.section;
        summary.page_tested = Some(format!("Pages {}", listed.join(", ")));
        summary.core_mistake = Some(SESSION_SUMMARY.to_owned());
        summary.specific_mistake = Some("Overall Session Evaluation".to_owned());
        summary.overall_grade = Some(grade);
        summary.notes = self.notes;
        out.push(summary);

        Ok(SessionBatch {
            stage: self.stage,
            date: self.date,
            entries: out,
        })
    }
}

//
// ─── JADEED DRAFT ──────────────────────────────────────────────────────────────
//

/// A Jadeed (new material) session.
#[derive(Debug, Clone, PartialEq)]
pub struct JadeedDraft {
    pub date: NaiveDate,
    pub start_page: PageNumber,
    pub end_page: PageNumber,
    pub end_ayah: Option<u16>,
    pub pages_completed: f64,
    pub ayahs_completed: u32,
    pub minor_mistakes: u32,
    pub overall_grade: Option<GradeValue>,
    pub notes: Option<String>,
}

impl JadeedDraft {
    #[must_use]
    pub fn new(date: NaiveDate, start_page: PageNumber, end_page: PageNumber) -> Self {
        Self {
            date,
            start_page,
            end_page,
            end_ayah: None,
            pages_completed: 0.0,
            ayahs_completed: 0,
            minor_mistakes: 0,
            overall_grade: None,
            notes: None,
        }
    }

    /// Text written into the detail field, e.g. `Progress: 1.5 pages + 3 ayahs`.
    #[must_use]
    pub fn progress_text(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if self.pages_completed > 0.0 {
            parts.push(format!("{} pages", self.pages_completed));
        }
        if self.ayahs_completed > 0 {
            parts.push(format!("{} ayahs", self.ayahs_completed));
        }
        format!("Progress: {}", parts.join(" + "))
    }

    /// # Errors
    ///
    /// - `EndBeforeStart` when the ending page precedes the starting page
    /// - `InvalidPagesCompleted` for negative or non-finite page counts
    /// - `NoProgress` when neither pages nor ayahs were completed
    pub fn validate(self) -> Result<SessionBatch, DraftError> {
        if self.end_page < self.start_page {
            return Err(DraftError::EndBeforeStart {
                start: self.start_page,
                end: self.end_page,
            });
        }
        if !self.pages_completed.is_finite() || self.pages_completed < 0.0 {
            return Err(DraftError::InvalidPagesCompleted(self.pages_completed));
        }
        if self.pages_completed == 0.0 && self.ayahs_completed == 0 {
            return Err(DraftError::NoProgress);
        }

        let progress = self.progress_text();
        let mut entry = DetailedEntry::new(Stage::Jadeed, self.date);
        entry.page_tested = Some(self.start_page.to_string());
        entry.jadeed_page = Some(self.end_page);
        entry.end_ayah = self.end_ayah;
        entry.talqeen_count = Some(0);
        entry.tambeeh_count = Some(self.minor_mistakes);
        entry.core_mistake = Some(JADEED_LEARNING.to_owned());
        entry.notes = Some(self.notes.unwrap_or_else(|| progress.clone()));
        entry.specific_mistake = Some(progress);
        entry.overall_grade = self.overall_grade;

        Ok(SessionBatch {
            stage: Stage::Jadeed,
            date: self.date,
            entries: vec![entry],
        })
    }
}
