use std::sync::Arc;

use async_trait::async_trait;
use hifz_core::classify::PageTier;
use hifz_core::health::{HealthBasis, HealthTier};
use hifz_core::model::{
    BasicEntry, DataFormatInfo, GradeValue, PageEntry, PageNumber, RecordId, SessionBatch,
    Section, Stage, StudentId, WindowConfig,
};
use hifz_core::time::fixed_clock;
use services::{HifzServices, ProgressError};
use storage::repository::{
    InMemoryRepository, RawSessions, SessionRepository, StorageError, Storage,
};

fn page(n: u16) -> PageNumber {
    PageNumber::new(n).unwrap()
}

async fn services_with_student() -> (HifzServices, StudentId) {
    let services = HifzServices::in_memory(fixed_clock());
    let id = StudentId::new(1);
    services
        .entries()
        .register_student(id, "Abdullah", Some("Shaykh Umar".into()), None)
        .await
        .unwrap();
    (services, id)
}

async fn learn_up_to(services: &HifzServices, id: StudentId, start: u16, end: u16) {
    let entries = services.entries();
    let mut draft = entries.jadeed_draft(page(start), page(end));
    draft.pages_completed = f64::from(end - start + 1);
    draft.overall_grade = Some(GradeValue::from("جيد"));
    entries.commit_jadeed(id, draft).await.unwrap();
}

#[tokio::test]
async fn overview_reflects_committed_sessions() {
    let (services, id) = services_with_student().await;
    learn_up_to(&services, id, 41, 50).await;

    let entries = services.entries();
    let mut juzhali = entries.juzhali_draft();
    juzhali.record_page(PageEntry::new(page(41), 1, 0).with_mistake("Memorization", "Skipped line"));
    juzhali.record_page(PageEntry::new(page(42), 0, 3));
    juzhali.record_page(PageEntry::new(page(43), 0, 0));
    juzhali.set_overall_grade("جيد جدا");
    entries.commit_review(id, juzhali).await.unwrap();

    let mut murajaat = entries.murajaat_draft(Section::new(1).unwrap());
    murajaat.record_page(PageEntry::new(page(5), 2, 1));
    murajaat.set_overall_grade("متوسط");
    entries.commit_review(id, murajaat).await.unwrap();

    let overview = services
        .progress()
        .overview(id, &WindowConfig::default())
        .await
        .unwrap();

    assert_eq!(overview.last_jadeed_page, Some(page(50)));
    let range = overview.juzhali_range.unwrap();
    assert_eq!((range.start, range.end), (page(41), page(50)));
    let sections: Vec<u8> = overview.murajaat_pages.keys().map(|s| s.value()).collect();
    assert_eq!(sections, vec![1, 2]);

    assert_eq!(overview.juzhali_page_map[&page(41)], PageTier::Critical);
    assert_eq!(overview.juzhali_page_map[&page(42)], PageTier::Weak);
    assert_eq!(overview.juzhali_page_map[&page(43)], PageTier::Good);
    assert_eq!(overview.juzhali_page_map[&page(44)], PageTier::Untested);

    let juzhali = overview.stage(Stage::Juzhali).unwrap();
    let health = juzhali.health.unwrap();
    assert_eq!(health.basis, HealthBasis::SummaryGrades);
    assert_eq!(health.score, 100.0);
    assert_eq!(health.tier, HealthTier::Excellent);
    assert_eq!((juzhali.mistakes.major, juzhali.mistakes.minor), (1, 3));

    let murajaat = overview.stage(Stage::Murajaat).unwrap().health.unwrap();
    assert_eq!(murajaat.score, 60.0);
    assert_eq!(murajaat.tier, HealthTier::Good);

    assert_eq!(overview.weak_pages.len(), 1);
    assert_eq!(overview.weak_pages[0].page, page(41));
    assert_eq!(overview.weak_sections[0].section.value(), 1);
    assert_eq!(overview.jadeed_progress.pages, 10.0);
    assert_eq!(overview.data_format, DataFormatInfo::new(0, 7));
}

#[tokio::test]
async fn early_student_has_no_murajaat() {
    let (services, id) = services_with_student().await;
    learn_up_to(&services, id, 1, 5).await;

    let overview = services
        .progress()
        .overview(id, &WindowConfig::default())
        .await
        .unwrap();
    let range = overview.juzhali_range.unwrap();
    assert_eq!((range.start, range.end), (page(1), page(5)));
    assert!(overview.murajaat_pages.is_empty());
    assert!(overview.stage(Stage::Murajaat).unwrap().health.is_none());
}

#[tokio::test]
async fn marks_only_history_uses_basic_jadeed_pages() {
    let (services, id) = services_with_student().await;
    let entries = services.entries();
    for (day, end) in [(0_i64, 120_u16), (1, 122)] {
        let mut entry = BasicEntry::new(
            Stage::Jadeed,
            entries.today() + chrono::Duration::days(day),
        );
        entry.jadeed_page = Some(page(end));
        entries.record_basic(id, &entry).await.unwrap();
    }

    let overview = services
        .progress()
        .overview(id, &WindowConfig::standard(20).unwrap())
        .await
        .unwrap();
    assert_eq!(overview.last_jadeed_page, Some(page(122)));
    let range = overview.juzhali_range.unwrap();
    assert_eq!((range.start, range.end), (page(103), page(122)));
    assert!(!overview.data_format.has_detailed());
}

#[tokio::test]
async fn unknown_student_is_not_found() {
    let services = HifzServices::in_memory(fixed_clock());
    let err = services
        .progress()
        .overview(StudentId::new(42), &WindowConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::Storage(StorageError::NotFound)));
}

struct OfflineSessions;

#[async_trait]
impl SessionRepository for OfflineSessions {
    async fn fetch_sessions(&self, _: StudentId) -> Result<RawSessions, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn append_basic(&self, _: StudentId, _: &BasicEntry) -> Result<RecordId, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn append_batch(
        &self,
        _: StudentId,
        _: &SessionBatch,
    ) -> Result<Vec<RecordId>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn data_format_info(&self, _: StudentId) -> Result<DataFormatInfo, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

#[tokio::test]
async fn storage_failures_surface_unchanged() {
    let students = InMemoryRepository::new();
    let storage = Storage {
        sessions: Arc::new(OfflineSessions),
        students: Arc::new(students),
    };
    let services = HifzServices::from_storage(&storage, fixed_clock());
    let id = StudentId::new(1);
    services
        .entries()
        .register_student(id, "Zaid", None, None)
        .await
        .unwrap();

    let err = services.progress().history(id).await.unwrap_err();
    assert!(matches!(err, ProgressError::Storage(StorageError::Connection(_))));
}
