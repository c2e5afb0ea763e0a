use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use hifz_core::analytics::{
    JadeedProgress, MistakeBreakdown, StageCounts, WeakPage, WeakSection, completion_percent,
    jadeed_progress, mistake_breakdown, weak_pages, weak_sections,
};
use hifz_core::classify::{PageTier, page_map};
use hifz_core::health::{StageHealth, stage_report, window_report};
use hifz_core::model::{
    DataFormatInfo, PageNumber, SessionRecord, Stage, Student, StudentId, WindowConfig,
};
use hifz_core::reconcile::reconcile;
use hifz_core::window::{
    JadeedPosition, JuzhaliRange, MurajaatPages, jadeed_position, juzhali_range,
    murajaat_available_pages,
};
use storage::repository::{SessionRepository, StudentRepository};

use crate::Clock;
use crate::error::ProgressError;

/// How many weak sections and pages an overview lists.
pub const WEAK_AREA_LIMIT: usize = 3;

/// Per-stage slice of a [`StudentOverview`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOverview {
    pub stage: Stage,
    pub records: usize,
    /// `None` when the stage has no records.
    pub health: Option<StageHealth>,
    pub mistakes: MistakeBreakdown,
}

/// Everything the progress dashboard shows for one student.
///
/// Plain data: no pre-formatted strings beyond tier messages, which callers
/// look up through [`hifz_core::health::HealthTier::message`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentOverview {
    pub student: Student,
    pub generated_on: NaiveDate,
    pub window_length: u16,
    pub jadeed: Option<JadeedPosition>,
    pub last_jadeed_page: Option<PageNumber>,
    pub completion_percent: f64,
    pub juzhali_range: Option<JuzhaliRange>,
    pub murajaat_pages: MurajaatPages,
    pub stages: Vec<StageOverview>,
    /// Juzhali health limited to the current window.
    pub juzhali_window_health: Option<StageHealth>,
    pub juzhali_page_map: BTreeMap<PageNumber, PageTier>,
    pub weak_sections: Vec<WeakSection>,
    pub weak_pages: Vec<WeakPage>,
    pub jadeed_progress: JadeedProgress,
    pub counts: StageCounts,
    pub data_format: DataFormatInfo,
}

impl StudentOverview {
    /// Compute an overview from an already reconciled history.
    #[must_use]
    pub fn build(
        student: Student,
        history: &[SessionRecord],
        data_format: DataFormatInfo,
        config: &WindowConfig,
        generated_on: NaiveDate,
    ) -> Self {
        let jadeed = jadeed_position(history);
        let last_page = jadeed.map(|j| j.page);
        let range = juzhali_range(last_page, config);
        let counts = StageCounts::from_history(history);

        let stages = Stage::ALL
            .into_iter()
            .map(|stage| StageOverview {
                stage,
                records: counts.get(stage),
                health: stage_report(history, stage),
                mistakes: mistake_breakdown(history, stage),
            })
            .collect();

        Self {
            student,
            generated_on,
            window_length: config.juzhali_length(),
            jadeed,
            last_jadeed_page: last_page,
            completion_percent: completion_percent(last_page),
            juzhali_range: range,
            murajaat_pages: murajaat_available_pages(last_page, config),
            stages,
            juzhali_window_health: range
                .and_then(|r| window_report(history, Stage::Juzhali, &r)),
            juzhali_page_map: range
                .map(|r| page_map(history, Stage::Juzhali, r.pages()))
                .unwrap_or_default(),
            weak_sections: weak_sections(history, WEAK_AREA_LIMIT),
            weak_pages: weak_pages(history, WEAK_AREA_LIMIT),
            jadeed_progress: jadeed_progress(history),
            counts,
            data_format,
        }
    }

    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageOverview> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Pretty JSON for export.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Render` if serialization fails.
    pub fn to_json(&self) -> Result<String, ProgressError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read-side facade: fetch, reconcile, compute.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
    students: Arc<dyn StudentRepository>,
}

impl ProgressService {
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

    /// All registered students.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn students(&self) -> Result<Vec<Student>, ProgressError> {
        Ok(self.students.list_students().await?)
    }

    /// The student's reconciled history in chronological order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn history(&self, student_id: StudentId) -> Result<Vec<SessionRecord>, ProgressError> {
        let raw = self.sessions.fetch_sessions(student_id).await?;
        Ok(reconcile(&raw.basic, &raw.detailed))
    }

    /// Record counts per family.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on repository failures.
    pub async fn data_format(&self, student_id: StudentId) -> Result<DataFormatInfo, ProgressError> {
        Ok(self.sessions.data_format_info(student_id).await?)
    }

    /// Full dashboard overview for a student, recomputed from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the student is unknown
    /// (`StorageError::NotFound`) or the repository fails.
    pub async fn overview(
        &self,
        student_id: StudentId,
        config: &WindowConfig,
    ) -> Result<StudentOverview, ProgressError> {
        let student = self.students.get_student(student_id).await?;
        let raw = self.sessions.fetch_sessions(student_id).await?;
        let history = reconcile(&raw.basic, &raw.detailed);
        log::debug!(
            "overview for student {student_id}: {} records, window {}",
            history.len(),
            config.juzhali_length()
        );
        Ok(StudentOverview::build(
            student,
            &history,
            raw.format_info(),
            config,
            self.clock.today(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifz_core::model::{BasicEntry, BasicRecord, GradeValue, RecordId};
    use hifz_core::time::fixed_today;

    fn student() -> Student {
        Student::new(StudentId::new(1), "Amina", None, None).unwrap()
    }

    fn jadeed_basic(id: u64, end: u16) -> BasicRecord {
        let mut entry = BasicEntry::new(Stage::Jadeed, fixed_today());
        entry.jadeed_page = PageNumber::new(end).ok();
        entry.overall_grade = Some(GradeValue::from("جيد"));
        BasicRecord {
            id: RecordId::new(id),
            seq: id,
            student_id: StudentId::new(1),
            entry,
        }
    }

    #[test]
    fn empty_history_has_no_pointer_and_no_health() {
        let overview = StudentOverview::build(
            student(),
            &[],
            DataFormatInfo::default(),
            &WindowConfig::default(),
            fixed_today(),
        );
        assert_eq!(overview.last_jadeed_page, None);
        assert_eq!(overview.juzhali_range, None);
        assert!(overview.murajaat_pages.is_empty());
        assert!(overview.juzhali_page_map.is_empty());
        assert_eq!(overview.completion_percent, 0.0);
        assert!(overview.stages.iter().all(|s| s.health.is_none()));
    }

    #[test]
    fn overview_derives_window_from_latest_jadeed() {
        let history = reconcile(&[jadeed_basic(1, 30), jadeed_basic(2, 50)], &[]);
        let overview = StudentOverview::build(
            student(),
            &history,
            DataFormatInfo::new(2, 0),
            &WindowConfig::default(),
            fixed_today(),
        );
        let range = overview.juzhali_range.unwrap();
        assert_eq!((range.start.value(), range.end.value()), (41, 50));
        assert_eq!(overview.juzhali_page_map.len(), 10);
        assert!(overview.juzhali_page_map.values().all(|t| *t == PageTier::Untested));
        assert_eq!(overview.murajaat_pages.values().map(Vec::len).sum::<usize>(), 40);
        assert_eq!(overview.stage(Stage::Jadeed).unwrap().records, 2);
        // marks-only Jadeed history scores from its grades
        let jadeed_health = overview.stage(Stage::Jadeed).unwrap().health.unwrap();
        assert_eq!(jadeed_health.score, 80.0);
    }

    #[test]
    fn overview_serializes_to_json() {
        let history = reconcile(&[jadeed_basic(1, 12)], &[]);
        let overview = StudentOverview::build(
            student(),
            &history,
            DataFormatInfo::new(1, 0),
            &WindowConfig::standard(15).unwrap(),
            fixed_today(),
        );
        let json = overview.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["window_length"], 15);
        assert_eq!(value["last_jadeed_page"], 12);
        assert_eq!(value["juzhali_range"]["start"], 1);
        assert_eq!(value["data_format"]["basic_count"], 1);
    }
}
