//! Aggregates shown alongside health: mistake totals, weak areas, progress.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::model::{PageNumber, Section, SessionRecord, Stage, TOTAL_PAGES};

//
// ─── MISTAKES ──────────────────────────────────────────────────────────────────
//

/// Mistake totals of one stage over records that track them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MistakeBreakdown {
    pub stage: Stage,
    pub major: u64,
    pub minor: u64,
    /// Page entries that contributed.
    pub records: usize,
}

impl MistakeBreakdown {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.major + self.minor
    }
}

fn tracked_entries(history: &[SessionRecord], stage: Stage) -> impl Iterator<Item = &SessionRecord> {
    history
        .iter()
        .filter(move |r| r.stage == stage && !r.is_session_summary() && r.tracks_mistakes())
}

#[must_use]
pub fn mistake_breakdown(history: &[SessionRecord], stage: Stage) -> MistakeBreakdown {
    let mut breakdown = MistakeBreakdown {
        stage,
        major: 0,
        minor: 0,
        records: 0,
    };
    for record in tracked_entries(history, stage) {
        breakdown.major += u64::from(record.major_mistakes.unwrap_or(0));
        breakdown.minor += u64::from(record.minor_mistakes.unwrap_or(0));
        breakdown.records += 1;
    }
    breakdown
}

//
// ─── WEAK AREAS ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeakSection {
    pub section: Section,
    pub major: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeakPage {
    pub page: PageNumber,
    pub major: u64,
}

/// Highest major sums first; the lower key wins a tie. Zero sums dropped.
fn top_by_major<K: Ord + Copy>(sums: BTreeMap<K, u64>, limit: usize) -> Vec<(K, u64)> {
    let mut ranked: Vec<(K, u64)> = sums.into_iter().filter(|(_, major)| *major > 0).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Murajaat sections with the most major mistakes.
#[must_use]
pub fn weak_sections(history: &[SessionRecord], limit: usize) -> Vec<WeakSection> {
    let mut sums: BTreeMap<Section, u64> = BTreeMap::new();
    for record in tracked_entries(history, Stage::Murajaat) {
        let section = record
            .section
            .or_else(|| record.page.as_ref().and_then(|p| p.first()).map(PageNumber::section));
        if let Some(section) = section {
            *sums.entry(section).or_default() += u64::from(record.major_mistakes.unwrap_or(0));
        }
    }
    top_by_major(sums, limit)
        .into_iter()
        .map(|(section, major)| WeakSection { section, major })
        .collect()
}

/// Juzhali pages with the most major mistakes.
#[must_use]
pub fn weak_pages(history: &[SessionRecord], limit: usize) -> Vec<WeakPage> {
    let mut sums: BTreeMap<PageNumber, u64> = BTreeMap::new();
    for record in tracked_entries(history, Stage::Juzhali) {
        if let Some(page) = record.single_page() {
            *sums.entry(page).or_default() += u64::from(record.major_mistakes.unwrap_or(0));
        }
    }
    top_by_major(sums, limit)
        .into_iter()
        .map(|(page, major)| WeakPage { page, major })
        .collect()
}

//
// ─── JADEED PROGRESS ───────────────────────────────────────────────────────────
//

/// Marker written into the detail text of Jadeed entries.
pub const PROGRESS_MARKER: &str = "Progress:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct JadeedProgress {
    pub pages: f64,
    pub ayahs: u64,
    /// Records that carried a progress marker.
    pub sessions: usize,
}

static PAGES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Progress:.*?([\d.]+)\s*pages?").expect("valid pages pattern")
});

static AYAHS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*ayahs?").expect("valid ayahs pattern"));

fn capture<T: std::str::FromStr>(pattern: &Regex, text: &str) -> Option<T> {
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Pages and ayahs completed, summed over Jadeed progress markers.
#[must_use]
pub fn jadeed_progress(history: &[SessionRecord]) -> JadeedProgress {
    let mut progress = JadeedProgress::default();
    for record in history.iter().filter(|r| r.stage == Stage::Jadeed) {
        let Some(text) = record
            .mistake_detail
            .as_deref()
            .filter(|t| t.contains(PROGRESS_MARKER))
        else {
            continue;
        };
        progress.sessions += 1;
        match capture::<f64>(&PAGES_PATTERN, text) {
            Some(pages) if pages.is_finite() => progress.pages += pages,
            _ => log::debug!("record {} has no page count in {text:?}", record.id),
        }
        if let Some(ayahs) = capture::<u64>(&AYAHS_PATTERN, text) {
            progress.ayahs += ayahs;
        }
    }
    progress
}

/// Share of the mushaf covered by the Jadeed pointer, in percent.
#[must_use]
pub fn completion_percent(last_page: Option<PageNumber>) -> f64 {
    last_page.map_or(0.0, |p| f64::from(p.value()) / f64::from(TOTAL_PAGES) * 100.0)
}

//
// ─── COUNTS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub jadeed: usize,
    pub juzhali: usize,
    pub murajaat: usize,
}

impl StageCounts {
    #[must_use]
    pub fn from_history(history: &[SessionRecord]) -> Self {
        let mut counts = Self::default();
        for record in history {
            match record.stage {
                Stage::Jadeed => counts.jadeed += 1,
                Stage::Juzhali => counts.juzhali += 1,
                Stage::Murajaat => counts.murajaat += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn get(&self, stage: Stage) -> usize {
        match stage {
            Stage::Jadeed => self.jadeed,
            Stage::Juzhali => self.juzhali,
            Stage::Murajaat => self.murajaat,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.jadeed + self.juzhali + self.murajaat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageRef, Provenance, RecordId, SESSION_SUMMARY, StudentId};
    use crate::time::fixed_today;

    fn rec(id: u64, stage: Stage, page: &str) -> SessionRecord {
        SessionRecord {
            id: RecordId::new(id),
            seq: id,
            student_id: StudentId::new(1),
            provenance: Provenance::Detailed,
            stage,
            date: fixed_today(),
            section: None,
            ending_page: None,
            page: Some(PageRef::parse(page)),
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

    fn counted(id: u64, stage: Stage, page: &str, major: u32, minor: u32) -> SessionRecord {
        let mut r = rec(id, stage, page);
        r.major_mistakes = Some(major);
        r.minor_mistakes = Some(minor);
        r
    }

    fn jadeed(id: u64, detail: &str) -> SessionRecord {
        let mut r = rec(id, Stage::Jadeed, "45");
        r.mistake_detail = Some(detail.to_owned());
        r
    }

    #[test]
    fn breakdown_skips_summaries_and_basic_records() {
        let mut summary = counted(1, Stage::Juzhali, "Pages 41, 42", 7, 7);
        summary.mistake_category = Some(SESSION_SUMMARY.to_owned());
        let mut basic = counted(2, Stage::Juzhali, "41", 5, 5);
        basic.provenance = Provenance::Basic;
        let history = vec![
            summary,
            basic,
            counted(3, Stage::Juzhali, "41", 1, 2),
            counted(4, Stage::Juzhali, "42", 0, 3),
            counted(5, Stage::Murajaat, "3", 4, 0),
        ];
        let b = mistake_breakdown(&history, Stage::Juzhali);
        assert_eq!((b.major, b.minor, b.total(), b.records), (1, 5, 6, 2));
    }

    #[test]
    fn weak_sections_rank_by_major_then_section() {
        let mut tagged = counted(1, Stage::Murajaat, "unknown", 2, 0);
        tagged.section = Section::new(5).ok();
        let history = vec![
            tagged,
            counted(2, Stage::Murajaat, "3", 1, 0),
            counted(3, Stage::Murajaat, "15", 1, 0),
            counted(4, Stage::Murajaat, "85", 2, 0),
            counted(5, Stage::Murajaat, "45", 0, 9),
        ];
        let weak = weak_sections(&history, 3);
        let got: Vec<(u8, u64)> = weak.iter().map(|w| (w.section.value(), w.major)).collect();
        assert_eq!(got, vec![(5, 4), (1, 2)]);
    }

    #[test]
    fn weak_pages_limit_and_ties() {
        let history = vec![
            counted(1, Stage::Juzhali, "44", 2, 0),
            counted(2, Stage::Juzhali, "42", 2, 0),
            counted(3, Stage::Juzhali, "43", 1, 0),
            counted(4, Stage::Juzhali, "41", 0, 4),
            counted(5, Stage::Juzhali, "Pages 45, 46", 9, 0),
        ];
        let weak = weak_pages(&history, 2);
        let got: Vec<(u16, u64)> = weak.iter().map(|w| (w.page.value(), w.major)).collect();
        assert_eq!(got, vec![(42, 2), (44, 2)]);
        assert!(weak_pages(&history, 0).is_empty());
    }

    #[test]
    fn progress_markers_are_summed() {
        let history = vec![
            jadeed(1, "Progress: 1.5 pages + 3 ayahs"),
            jadeed(2, "Progress: 2 pages + 0 ayahs"),
            jadeed(3, "no marker 9 pages 9 ayahs"),
            jadeed(4, "Progress: 7 ayahs"),
        ];
        let progress = jadeed_progress(&history);
        assert_eq!(progress.pages, 3.5);
        assert_eq!(progress.ayahs, 10);
        assert_eq!(progress.sessions, 3);
    }

    #[test]
    fn progress_patterns_capture_counts() {
        let text = "Progress: 2.5 pages + 4 ayahs";
        assert_eq!(capture::<f64>(&PAGES_PATTERN, text), Some(2.5));
        assert_eq!(capture::<u64>(&AYAHS_PATTERN, text), Some(4));
        assert_eq!(capture::<f64>(&PAGES_PATTERN, "Progress: 4 ayahs"), None);
    }

    #[test]
    fn progress_ignores_other_stages() {
        let mut r = jadeed(1, "Progress: 4 pages + 1 ayah");
        r.stage = Stage::Juzhali;
        assert_eq!(jadeed_progress(&[r]), JadeedProgress::default());
    }

    #[test]
    fn completion_is_relative_to_mushaf() {
        assert_eq!(completion_percent(None), 0.0);
        assert_eq!(completion_percent(PageNumber::new(604).ok()), 100.0);
        let half = completion_percent(PageNumber::new(302).ok());
        assert!((half - 50.0).abs() < 1e-9);
    }

    #[test]
    fn stage_counts() {
        let history = vec![
            rec(1, Stage::Jadeed, "1"),
            rec(2, Stage::Juzhali, "1"),
            rec(3, Stage::Juzhali, "2"),
        ];
        let counts = StageCounts::from_history(&history);
        assert_eq!(counts.get(Stage::Juzhali), 2);
        assert_eq!(counts.get(Stage::Murajaat), 0);
        assert_eq!(counts.total(), 3);
    }
}
