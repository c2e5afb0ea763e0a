use hifz_core::model::{
    BasicEntry, DataFormatInfo, GradeValue, JadeedDraft, PageEntry, PageNumber, ReviewDraft,
    Section, Stage, Student, StudentId,
};
use hifz_core::reconcile::reconcile;
use hifz_core::window::last_jadeed_page;
use hifz_core::time::fixed_today;
use storage::repository::{SessionRepository, StorageError, StudentRepository};
use storage::sqlite::SqliteRepository;

async fn open(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn page(n: u16) -> PageNumber {
    PageNumber::new(n).unwrap()
}

async fn add_student(repo: &SqliteRepository, id: u64) -> StudentId {
    let student = Student::new(
        StudentId::new(id),
        "Yusuf",
        Some("Ustadh Bilal".into()),
        Some(fixed_today()),
    )
    .unwrap();
    repo.upsert_student(&student).await.unwrap();
    student.id()
}

#[tokio::test]
async fn sqlite_round_trips_both_families() {
    let repo = open("memdb_round_trip").await;
    let student = add_student(&repo, 1).await;

    let mut basic = BasicEntry::new(Stage::Murajaat, fixed_today());
    basic.section = Section::new(2).ok();
    basic.page = Some("21-25".into());
    basic.overall_grade = Some(GradeValue::Numeric(8.5));
    let basic_id = repo.append_basic(student, &basic).await.unwrap();

    let mut draft = ReviewDraft::juzhali(fixed_today());
    draft.record_page(PageEntry::new(page(41), 1, 0).with_mistake("Tajweed", "Madd"));
    draft.record_page(PageEntry::new(page(42), 0, 0));
    draft.set_overall_grade("جيد جدا");
    let batch = draft.validate().unwrap();
    let ids = repo.append_batch(student, &batch).await.unwrap();
    assert_eq!(ids.len(), batch.len());

    let raw = repo.fetch_sessions(student).await.unwrap();
    assert_eq!(raw.basic.len(), 1);
    assert_eq!(raw.basic[0].id, basic_id);
    assert_eq!(raw.basic[0].entry, basic);
    assert_eq!(raw.detailed.len(), 3);
    let entries: Vec<_> = raw.detailed.iter().map(|r| r.entry.clone()).collect();
    assert_eq!(entries, batch.entries());

    let history = reconcile(&raw.basic, &raw.detailed);
    assert_eq!(history.len(), 4);
    assert!(history.iter().any(|r| r.is_session_summary()));
}

#[tokio::test]
async fn sqlite_keeps_missing_counts_null() {
    let repo = open("memdb_null_counts").await;
    let student = add_student(&repo, 1).await;

    let mut draft = ReviewDraft::murajaat(fixed_today(), Section::new(1).unwrap());
    draft.record_page(PageEntry::new(page(3), 0, 1));
    draft.set_overall_grade(GradeValue::Numeric(9.0));
    repo.append_batch(student, &draft.validate().unwrap())
        .await
        .unwrap();

    let raw = repo.fetch_sessions(student).await.unwrap();
    let summary = raw
        .detailed
        .iter()
        .find(|r| r.entry.page_tested.as_deref() == Some("Pages 3"))
        .expect("summary row");
    assert_eq!(summary.entry.talqeen_count, None);
    assert_eq!(summary.entry.tambeeh_count, None);
    assert_eq!(summary.entry.overall_grade, Some(GradeValue::Numeric(9.0)));
}

#[tokio::test]
async fn sqlite_batch_for_unknown_student_writes_nothing() {
    let repo = open("memdb_unknown_student").await;
    let mut draft = JadeedDraft::new(fixed_today(), page(10), page(11));
    draft.pages_completed = 1.0;
    draft.overall_grade = Some(GradeValue::from("جيد"));
    let batch = draft.validate().unwrap();

    let err = repo
        .append_batch(StudentId::new(5), &batch)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
    let info = repo.data_format_info(StudentId::new(5)).await.unwrap();
    assert_eq!(info, DataFormatInfo::default());
}

#[tokio::test]
async fn sqlite_orders_same_day_rows_by_insertion_across_families() {
    let repo = open("memdb_shared_sequence").await;
    let student = add_student(&repo, 1).await;

    for end in [37, 38, 39, 40, 41] {
        let mut entry = BasicEntry::new(Stage::Jadeed, fixed_today());
        entry.jadeed_page = Some(page(end));
        repo.append_basic(student, &entry).await.unwrap();
    }
    let mut draft = JadeedDraft::new(fixed_today(), page(42), page(42));
    draft.pages_completed = 1.0;
    draft.overall_grade = Some(GradeValue::from("جيد"));
    let ids = repo
        .append_batch(student, &draft.validate().unwrap())
        .await
        .unwrap();
    assert_eq!(ids[0].value(), 1);

    let raw = repo.fetch_sessions(student).await.unwrap();
    assert!(raw.detailed[0].seq > raw.basic[4].seq);
    let history = reconcile(&raw.basic, &raw.detailed);
    assert_eq!(last_jadeed_page(&history), Some(page(42)));
}

#[tokio::test]
async fn sqlite_counts_records_per_family() {
    let repo = open("memdb_format_info").await;
    let student = add_student(&repo, 7).await;
    for _ in 0..2 {
        repo.append_basic(student, &BasicEntry::new(Stage::Jadeed, fixed_today()))
            .await
            .unwrap();
    }
    let info = repo.data_format_info(student).await.unwrap();
    assert_eq!(info, DataFormatInfo::new(2, 0));
    assert!(!info.has_detailed());
}

#[tokio::test]
async fn sqlite_students_upsert_and_list() {
    let repo = open("memdb_students").await;
    add_student(&repo, 2).await;
    add_student(&repo, 1).await;
    let renamed = Student::new(StudentId::new(2), "Maryam", None, None).unwrap();
    repo.upsert_student(&renamed).await.unwrap();

    let listed = repo.list_students().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id(), StudentId::new(1));
    assert_eq!(listed[1], renamed);
    assert_eq!(listed[0].teacher_name(), Some("Ustadh Bilal"));
    assert!(matches!(
        repo.get_student(StudentId::new(99)).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = open("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(n, 1);
}
