//! Page performance tiers for the page map.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{PageNumber, SessionRecord, Stage};

/// Major mistakes above this mark a page critical.
pub const CRITICAL_MAJOR_ABOVE: u64 = 0;
/// Minor mistakes at or above this mark a page weak.
pub const WEAK_MINOR_AT_LEAST: u64 = 3;
/// Grade means at or above this are good.
pub const GOOD_GRADE: f64 = 8.0;
/// Grade means at or above this (and below [`GOOD_GRADE`]) are weak.
pub const WEAK_GRADE: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageTier {
    Untested,
    Critical,
    Weak,
    Good,
}

impl PageTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PageTier::Untested => "untested",
            PageTier::Critical => "critical",
            PageTier::Weak => "weak",
            PageTier::Good => "good",
        }
    }
}

impl std::fmt::Display for PageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier for all records of one page.
///
/// Mistake counts decide when any `detailed` record tracked them. Otherwise
/// the mean normalized grade decides. A page tested without counts or a
/// readable grade is good; only a page with no records is untested.
#[must_use]
pub fn classify(records: &[&SessionRecord]) -> PageTier {
    let entries: Vec<&SessionRecord> = records
        .iter()
        .copied()
        .filter(|r| !r.is_session_summary())
        .collect();
    if entries.is_empty() {
        return PageTier::Untested;
    }

    let tracked: Vec<&SessionRecord> = entries
        .iter()
        .copied()
        .filter(|r| r.tracks_mistakes())
        .collect();
    if !tracked.is_empty() {
        let major: u64 = tracked
            .iter()
            .map(|r| u64::from(r.major_mistakes.unwrap_or(0)))
            .sum();
        let minor: u64 = tracked
            .iter()
            .map(|r| u64::from(r.minor_mistakes.unwrap_or(0)))
            .sum();
        return if major > CRITICAL_MAJOR_ABOVE {
            PageTier::Critical
        } else if minor >= WEAK_MINOR_AT_LEAST {
            PageTier::Weak
        } else {
            PageTier::Good
        };
    }

    let grades: Vec<f64> = entries.iter().filter_map(|r| r.normalized_grade()).collect();
    if grades.is_empty() {
        return PageTier::Good;
    }
    #[allow(clippy::cast_precision_loss)]
    let avg = grades.iter().sum::<f64>() / grades.len() as f64;
    if avg >= GOOD_GRADE {
        PageTier::Good
    } else if avg >= WEAK_GRADE {
        PageTier::Weak
    } else {
        PageTier::Critical
    }
}

/// Tier of `page` within `stage`, from records testing that page alone.
#[must_use]
pub fn classify_page(history: &[SessionRecord], stage: Stage, page: PageNumber) -> PageTier {
    let records: Vec<&SessionRecord> = history
        .iter()
        .filter(|r| r.stage == stage && r.single_page() == Some(page))
        .collect();
    classify(&records)
}

/// Tiers for every page in `pages`, untested pages included.
#[must_use]
pub fn page_map(
    history: &[SessionRecord],
    stage: Stage,
    pages: impl IntoIterator<Item = PageNumber>,
) -> BTreeMap<PageNumber, PageTier> {
    let mut by_page: BTreeMap<PageNumber, Vec<&SessionRecord>> = BTreeMap::new();
    for record in history.iter().filter(|r| r.stage == stage) {
        if let Some(page) = record.single_page() {
            by_page.entry(page).or_default().push(record);
        }
    }
    pages
        .into_iter()
        .map(|page| {
            let tier = by_page
                .get(&page)
                .map_or(PageTier::Untested, |records| classify(records));
            (page, tier)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        GradeValue, PageRef, Provenance, RecordId, SESSION_SUMMARY, StudentId,
    };
    use crate::time::fixed_today;
    use crate::window::JuzhaliRange;

    fn page(n: u16) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    fn rec(id: u64, provenance: Provenance, p: &str) -> SessionRecord {
        SessionRecord {
            id: RecordId::new(id),
            seq: id,
            student_id: StudentId::new(1),
            provenance,
            stage: Stage::Juzhali,
            date: fixed_today(),
            section: None,
            ending_page: None,
            page: Some(PageRef::parse(p)),
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

    fn counted(id: u64, p: &str, major: u32, minor: u32) -> SessionRecord {
        let mut r = rec(id, Provenance::Detailed, p);
        r.major_mistakes = Some(major);
        r.minor_mistakes = Some(minor);
        r
    }

    fn graded(id: u64, p: &str, grade: GradeValue) -> SessionRecord {
        let mut r = rec(id, Provenance::Basic, p);
        r.overall_grade = Some(grade);
        r
    }

    #[test]
    fn empty_is_untested() {
        assert_eq!(classify(&[]), PageTier::Untested);
    }

    #[test]
    fn mistake_thresholds() {
        let cases = [
            ((1, 0), PageTier::Critical),
            ((0, 3), PageTier::Weak),
            ((0, 2), PageTier::Good),
            ((0, 0), PageTier::Good),
        ];
        for ((major, minor), expected) in cases {
            let r = counted(1, "41", major, minor);
            assert_eq!(classify(&[&r]), expected, "major={major} minor={minor}");
        }
    }

    #[test]
    fn counts_sum_across_records() {
        let a = counted(1, "41", 0, 2);
        let b = counted(2, "41", 0, 1);
        assert_eq!(classify(&[&a, &b]), PageTier::Weak);
    }

    #[test]
    fn basic_counts_are_ignored() {
        let mut basic = rec(1, Provenance::Basic, "41");
        basic.major_mistakes = Some(4);
        basic.overall_grade = Some(GradeValue::from("ممتاز"));
        assert_eq!(classify(&[&basic]), PageTier::Good);
    }

    #[test]
    fn grade_fallback_thresholds() {
        let cases = [
            (GradeValue::Numeric(8.0), PageTier::Good),
            (GradeValue::Numeric(7.5), PageTier::Weak),
            (GradeValue::Numeric(7.0), PageTier::Weak),
            (GradeValue::Numeric(6.9), PageTier::Critical),
            (GradeValue::from("متوسط"), PageTier::Critical),
            (GradeValue::from("جيد"), PageTier::Good),
        ];
        for (grade, expected) in cases {
            let r = graded(1, "41", grade.clone());
            assert_eq!(classify(&[&r]), expected, "{grade}");
        }
    }

    #[test]
    fn tested_page_without_counts_or_grades_is_good() {
        let r = rec(1, Provenance::Basic, "41");
        assert_eq!(classify(&[&r]), PageTier::Good);

        let unreadable = graded(2, "41", GradeValue::from("see notes"));
        assert_eq!(classify(&[&unreadable]), PageTier::Good);

        let history = vec![rec(3, Provenance::Basic, "42")];
        assert_eq!(classify_page(&history, Stage::Juzhali, page(42)), PageTier::Good);
        assert_eq!(classify_page(&history, Stage::Juzhali, page(43)), PageTier::Untested);
    }

    #[test]
    fn summaries_do_not_classify_a_page() {
        let mut s = counted(1, "41", 5, 5);
        s.mistake_category = Some(SESSION_SUMMARY.to_owned());
        assert_eq!(classify(&[&s]), PageTier::Untested);
    }

    #[test]
    fn scenario_e_unmatched_page_is_untested() {
        let history = vec![counted(1, "41", 1, 0), counted(2, "Pages 42, 43", 0, 5)];
        assert_eq!(classify_page(&history, Stage::Juzhali, page(41)), PageTier::Critical);
        assert_eq!(classify_page(&history, Stage::Juzhali, page(42)), PageTier::Untested);
        assert_eq!(classify_page(&history, Stage::Murajaat, page(41)), PageTier::Untested);
    }

    #[test]
    fn page_map_covers_every_requested_page() {
        let window = JuzhaliRange {
            start: page(41),
            end: page(50),
        };
        let history = vec![
            counted(1, "41", 0, 0),
            counted(2, "45", 0, 4),
            counted(3, "50", 2, 0),
            counted(4, "51", 9, 0),
        ];
        let map = page_map(&history, Stage::Juzhali, window.pages());
        assert_eq!(map.len(), 10);
        assert_eq!(map[&page(41)], PageTier::Good);
        assert_eq!(map[&page(45)], PageTier::Weak);
        assert_eq!(map[&page(50)], PageTier::Critical);
        assert_eq!(map[&page(42)], PageTier::Untested);
        assert!(!map.contains_key(&page(51)));
    }
}
