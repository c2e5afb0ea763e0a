//! Jadeed pointer, Juzhali window and Murajaat eligibility.
//!
//! Everything here is re-derived from the full history on each call.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{PageNumber, SessionRecord, Section, Stage, WindowConfig};

/// Murajaat-eligible pages keyed by section, as positions within the section.
pub type MurajaatPages = BTreeMap<Section, Vec<u8>>;

/// Where the Jadeed ending page was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    /// The ending-page field.
    EndingPage,
    /// The generic page-tested field. Approximate: for Jadeed it usually holds
    /// the starting page.
    PageTested,
}

/// The current Jadeed ending page and how reliable it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JadeedPosition {
    pub page: PageNumber,
    pub source: PageSource,
}

impl JadeedPosition {
    #[must_use]
    pub fn is_approximate(&self) -> bool {
        self.source == PageSource::PageTested
    }
}

/// Inclusive page range of the Juzhali window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JuzhaliRange {
    pub start: PageNumber,
    pub end: PageNumber,
}

impl JuzhaliRange {
    #[must_use]
    pub fn contains(&self, page: PageNumber) -> bool {
        self.start <= page && page <= self.end
    }

    /// Pages in the window, `end - start + 1`.
    #[must_use]
    pub fn page_count(&self) -> u16 {
        self.end.value() - self.start.value() + 1
    }

    pub fn pages(&self) -> impl Iterator<Item = PageNumber> + use<> {
        let (start, end) = (self.start.value(), self.end.value());
        (start..=end).filter_map(|p| PageNumber::new(p).ok())
    }
}

/// Where a page sits relative to the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePlacement {
    Murajaat,
    Juzhali,
    /// Not learned yet.
    Ahead,
}

/// The latest Jadeed record by date then insertion sequence, never by date alone.
#[must_use]
pub fn latest_jadeed_record(history: &[SessionRecord]) -> Option<&SessionRecord> {
    history
        .iter()
        .filter(|r| r.stage == Stage::Jadeed)
        .max_by_key(|r| r.order_key())
}

/// The ending page of the latest Jadeed record, with its source.
///
/// Falls back to the page-tested field when the ending page is missing, and
/// logs a warning since that field holds the starting page on Jadeed entries.
#[must_use]
pub fn jadeed_position(history: &[SessionRecord]) -> Option<JadeedPosition> {
    let latest = latest_jadeed_record(history)?;
    if let Some(page) = latest.ending_page {
        return Some(JadeedPosition {
            page,
            source: PageSource::EndingPage,
        });
    }
    match latest.page.as_ref().and_then(|p| p.last()) {
        Some(page) => {
            log::warn!(
                "jadeed record {} ({}, {}) has no ending page; using page tested {page} as an approximation",
                latest.id,
                latest.provenance,
                latest.date
            );
            Some(JadeedPosition {
                page,
                source: PageSource::PageTested,
            })
        }
        None => {
            log::warn!(
                "jadeed record {} ({}, {}) carries no page at all",
                latest.id,
                latest.provenance,
                latest.date
            );
            None
        }
    }
}

/// The current Jadeed ending page; `None` before any Jadeed activity.
#[must_use]
pub fn last_jadeed_page(history: &[SessionRecord]) -> Option<PageNumber> {
    jadeed_position(history).map(|p| p.page)
}

/// `(max(1, end - length + 1), end)` where `end` is the last Jadeed page.
#[must_use]
pub fn juzhali_range(
    last_jadeed_page: Option<PageNumber>,
    config: &WindowConfig,
) -> Option<JuzhaliRange> {
    let end = last_jadeed_page?;
    let span = config.juzhali_length().saturating_sub(1);
    let start = end.value().saturating_sub(span).max(1);
    Some(JuzhaliRange {
        start: PageNumber::new(start).ok()?,
        end,
    })
}

/// Pages that have left the Juzhali window, per section.
///
/// A page is eligible iff it lies before the window start. Sections wholly
/// before the start's section contribute all 20 pages; the start's own section
/// contributes the positions before it, and no entry when there are none.
#[must_use]
pub fn murajaat_available_pages(
    last_jadeed_page: Option<PageNumber>,
    config: &WindowConfig,
) -> MurajaatPages {
    let mut out = MurajaatPages::new();
    let Some(range) = juzhali_range(last_jadeed_page, config) else {
        return out;
    };

    let start_section = range.start.section();
    for s in Section::FIRST.value()..start_section.value() {
        let Ok(section) = Section::new(s) else {
            continue;
        };
        out.insert(section, section.pages().map(PageNumber::page_in_section).collect());
    }

    let position = range.start.page_in_section();
    if position > 1 {
        out.insert(start_section, (1..position).collect());
    }
    out
}

/// Flatten a Murajaat map back to absolute pages, ascending.
#[must_use]
pub fn murajaat_absolute_pages(pages: &MurajaatPages) -> Vec<PageNumber> {
    pages
        .iter()
        .flat_map(|(section, positions)| {
            positions
                .iter()
                .filter_map(|pos| PageNumber::from_section_page(*section, *pos).ok())
        })
        .collect()
}

/// Placement of `page` given the current pointer.
#[must_use]
pub fn placement(
    page: PageNumber,
    last_jadeed_page: Option<PageNumber>,
    config: &WindowConfig,
) -> PagePlacement {
    match juzhali_range(last_jadeed_page, config) {
        Some(range) if range.contains(page) => PagePlacement::Juzhali,
        Some(range) if page < range.start => PagePlacement::Murajaat,
        _ => PagePlacement::Ahead,
    }
}
