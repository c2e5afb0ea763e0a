//! Merge the two historical record families into one schema.
//!
//! Legacy column names are resolved here, once; consumers only ever see
//! [`SessionRecord`].

use chrono::NaiveDate;

use crate::model::{
    BasicRecord, DetailedRecord, PageRef, Provenance, SessionRecord,
};

/// Union of both families under the unified schema, in chronological order.
///
/// No deduplication is attempted: a session present in both families appears
/// twice. Mistake fields of basic records stay `None`.
#[must_use]
pub fn reconcile(basic: &[BasicRecord], detailed: &[DetailedRecord]) -> Vec<SessionRecord> {
    let mut out: Vec<SessionRecord> = Vec::with_capacity(basic.len() + detailed.len());
    out.extend(basic.iter().map(from_basic));
    out.extend(detailed.iter().map(from_detailed));
    out.sort_by_key(SessionRecord::order_key);

    log::debug!(
        "reconciled {} basic and {} detailed records",
        basic.len(),
        detailed.len()
    );
    out
}

/// Records dated within `from..=to`, either bound optional.
#[must_use]
pub fn between_dates(
    history: &[SessionRecord],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<SessionRecord> {
    history
        .iter()
        .filter(|r| from.is_none_or(|f| r.date >= f) && to.is_none_or(|t| r.date <= t))
        .cloned()
        .collect()
}

fn non_blank(text: Option<&String>) -> Option<&str> {
    text.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn from_basic(record: &BasicRecord) -> SessionRecord {
    let entry = &record.entry;
    SessionRecord {
        id: record.id,
        seq: record.seq,
        student_id: record.student_id,
        provenance: Provenance::Basic,
        stage: entry.stage,
        date: entry.date,
        section: entry.section,
        ending_page: entry.jadeed_page,
        page: non_blank(entry.page.as_ref()).map(PageRef::parse),
        starting_ayah: entry.starting_ayah,
        ending_ayah: entry.ending_ayah,
        major_mistakes: None,
        minor_mistakes: None,
        mistake_category: None,
        mistake_detail: None,
        overall_grade: entry.overall_grade.clone(),
        notes: entry.notes.clone(),
    }
}

fn from_detailed(record: &DetailedRecord) -> SessionRecord {
    let entry = &record.entry;
    let tested = non_blank(entry.page_tested.as_ref()).map(PageRef::parse);
    // page_tested wins; juzhali_page only fills in when it is missing or unresolved
    let page = match (tested, entry.juzhali_page) {
        (Some(tested), _) if tested.is_resolved() => Some(tested),
        (_, Some(page)) => Some(PageRef::from_page(page)),
        (tested, None) => tested,
    };
    SessionRecord {
        id: record.id,
        seq: record.seq,
        student_id: record.student_id,
        provenance: Provenance::Detailed,
        stage: entry.stage,
        date: entry.date,
        section: entry.section,
        ending_page: entry.jadeed_page,
        page,
        starting_ayah: entry.start_ayah,
        ending_ayah: entry.end_ayah,
        major_mistakes: entry.talqeen_count,
        minor_mistakes: entry.tambeeh_count,
        mistake_category: non_blank(entry.core_mistake.as_ref()).map(str::to_owned),
        mistake_detail: non_blank(entry.specific_mistake.as_ref()).map(str::to_owned),
        overall_grade: entry.overall_grade.clone(),
        notes: entry.notes.clone(),
    }
}
