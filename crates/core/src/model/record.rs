use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::grade::{GradeValue, normalize_opt};
use crate::model::ids::{RecordId, StudentId};
use crate::model::page::{PageNumber, PageRef, Section};
use crate::model::stage::{Provenance, Stage};

/// Category marking an end-of-session aggregate grade rather than a page entry.
pub const SESSION_SUMMARY: &str = "Session_Summary";

/// Category written on Jadeed learning entries.
pub const JADEED_LEARNING: &str = "Jadeed_Learning";

//
// ─── BASIC FAMILY ──────────────────────────────────────────────────────────────
//

/// Content of a marks-only record (spreadsheet uploads).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicEntry {
    pub stage: Stage,
    pub date: NaiveDate,
    pub section: Option<Section>,
    /// Page written on the sheet; for Jadeed rows this is not the ending page.
    pub page: Option<String>,
    /// Ending page reached, Jadeed rows only.
    pub jadeed_page: Option<PageNumber>,
    pub starting_ayah: Option<u16>,
    pub ending_ayah: Option<u16>,
    pub overall_grade: Option<GradeValue>,
    pub notes: Option<String>,
}

impl BasicEntry {
    #[must_use]
    pub fn new(stage: Stage, date: NaiveDate) -> Self {
        Self {
            stage,
            date,
            section: None,
            page: None,
            jadeed_page: None,
            starting_ayah: None,
            ending_ayah: None,
            overall_grade: None,
            notes: None,
        }
    }
}

/// A persisted marks-only record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicRecord {
    pub id: RecordId,
    /// Insertion position, drawn from one sequence shared with detailed records.
    pub seq: u64,
    pub student_id: StudentId,
    pub entry: BasicEntry,
}

//
// ─── DETAILED FAMILY ───────────────────────────────────────────────────────────
//

/// Content of a full mistake-tracking record.
///
/// `talqeen_count` is the major count (the teacher had to prompt);
/// `tambeeh_count` is the minor count (self-corrected after a reminder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedEntry {
    pub stage: Stage,
    pub date: NaiveDate,
    pub section: Option<Section>,
    /// Page tested, or the starting page for Jadeed entries.
    pub page_tested: Option<String>,
    pub juzhali_page: Option<PageNumber>,
    /// Ending page reached, Jadeed entries only.
    pub jadeed_page: Option<PageNumber>,
    pub start_ayah: Option<u16>,
    pub end_ayah: Option<u16>,
    pub talqeen_count: Option<u32>,
    pub tambeeh_count: Option<u32>,
    pub core_mistake: Option<String>,
    pub specific_mistake: Option<String>,
    pub overall_grade: Option<GradeValue>,
    pub notes: Option<String>,
}

impl DetailedEntry {
    #[must_use]
    pub fn new(stage: Stage, date: NaiveDate) -> Self {
        Self {
            stage,
            date,
            section: None,
            page_tested: None,
            juzhali_page: None,
            jadeed_page: None,
            start_ayah: None,
            end_ayah: None,
            talqeen_count: None,
            tambeeh_count: None,
            core_mistake: None,
            specific_mistake: None,
            overall_grade: None,
            notes: None,
        }
    }
}

/// A persisted mistake-tracking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedRecord {
    pub id: RecordId,
    /// Insertion position, shared with basic records.
    pub seq: u64,
    pub student_id: StudentId,
    pub entry: DetailedEntry,
}

//
// ─── RECONCILED RECORD ─────────────────────────────────────────────────────────
//

/// One session record under the unified schema.
///
/// Fields a family never tracks are `None`, never a default: a basic record
/// has `major_mistakes == None`, which is different from a detailed record
/// reporting zero mistakes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: RecordId,
    /// Insertion position across both families.
    pub seq: u64,
    pub student_id: StudentId,
    pub provenance: Provenance,
    pub stage: Stage,
    pub date: NaiveDate,
    pub section: Option<Section>,
    /// Ending page reached (Jadeed).
    pub ending_page: Option<PageNumber>,
    /// Page(s) tested; for Jadeed this is the generic, not the ending, page.
    pub page: Option<PageRef>,
    pub starting_ayah: Option<u16>,
    pub ending_ayah: Option<u16>,
    pub major_mistakes: Option<u32>,
    pub minor_mistakes: Option<u32>,
    pub mistake_category: Option<String>,
    pub mistake_detail: Option<String>,
    pub overall_grade: Option<GradeValue>,
    pub notes: Option<String>,
}

impl SessionRecord {
    /// Whether this is an aggregate end-of-session grade entry.
    #[must_use]
    pub fn is_session_summary(&self) -> bool {
        self.mistake_category.as_deref() == Some(SESSION_SUMMARY)
    }

    /// Whether either mistake count was recorded.
    #[must_use]
    pub fn tracks_mistakes(&self) -> bool {
        self.provenance.tracks_mistakes()
            && (self.major_mistakes.is_some() || self.minor_mistakes.is_some())
    }

    #[must_use]
    pub fn normalized_grade(&self) -> Option<f64> {
        normalize_opt(self.overall_grade.as_ref())
    }

    /// The page when this record tests exactly one page.
    #[must_use]
    pub fn single_page(&self) -> Option<PageNumber> {
        self.page.as_ref().and_then(PageRef::single)
    }

    /// Chronological key: date, then insertion sequence.
    ///
    /// Family ids are independent counters and only settle equal sequences.
    #[must_use]
    pub fn order_key(&self) -> (NaiveDate, u64, Provenance, RecordId) {
        (self.date, self.seq, self.provenance, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_today;

    fn record(provenance: Provenance) -> SessionRecord {
        SessionRecord {
            id: RecordId::new(1),
            seq: 1,
            student_id: StudentId::new(1),
            provenance,
            stage: Stage::Juzhali,
            date: fixed_today(),
            section: None,
            ending_page: None,
            page: Some(PageRef::parse("41")),
            starting_ayah: None,
            ending_ayah: None,
            major_mistakes: None,
            minor_mistakes: None,
            mistake_category: None,
            mistake_detail: None,
            overall_grade: None,
            notes: None,
        }
    }

    #[test]
    fn summary_flag_matches_literal_category() {
        let mut rec = record(Provenance::Detailed);
        assert!(!rec.is_session_summary());
        rec.mistake_category = Some(SESSION_SUMMARY.to_owned());
        assert!(rec.is_session_summary());
        rec.mistake_category = Some("session_summary".to_owned());
        assert!(!rec.is_session_summary());
    }

    #[test]
    fn zero_counts_are_tracked_but_absent_counts_are_not() {
        let mut rec = record(Provenance::Detailed);
        assert!(!rec.tracks_mistakes());
        rec.major_mistakes = Some(0);
        assert!(rec.tracks_mistakes());

        let mut basic = record(Provenance::Basic);
        basic.major_mistakes = Some(2);
        assert!(!basic.tracks_mistakes());
    }

    #[test]
    fn order_key_breaks_date_ties_by_sequence() {
        let mut a = record(Provenance::Detailed);
        let mut b = record(Provenance::Detailed);
        a.seq = 10;
        b.seq = 11;
        assert!(a.order_key() < b.order_key());
        b.date = a.date.pred_opt().unwrap();
        assert!(b.order_key() < a.order_key());
    }

    #[test]
    fn order_key_ignores_family_ids_across_families() {
        let mut older = record(Provenance::Basic);
        older.id = RecordId::new(5);
        older.seq = 5;
        let mut newer = record(Provenance::Detailed);
        newer.id = RecordId::new(1);
        newer.seq = 6;
        assert!(older.order_key() < newer.order_key());
    }
}
