use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pages in the full text.
pub const TOTAL_PAGES: u16 = 604;

/// Pages owned by each section (sipara).
pub const PAGES_PER_SECTION: u16 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PageError {
    #[error("page {0} is outside 1..=604")]
    PageOutOfRange(i64),
    #[error("section {0} is outside 1..=31")]
    SectionOutOfRange(i64),
    #[error("page {page} does not exist in section {section}")]
    PageNotInSection { section: u8, page: u8 },
}

//
// ─── PAGE NUMBER ───────────────────────────────────────────────────────────────
//

/// Absolute page number, 1-based, at most [`TOTAL_PAGES`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct PageNumber(u16);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);
    pub const LAST: PageNumber = PageNumber(TOTAL_PAGES);

    /// # Errors
    ///
    /// Returns `PageError::PageOutOfRange` unless `1 <= page <= 604`.
    pub fn new(page: u16) -> Result<Self, PageError> {
        if page == 0 || page > TOTAL_PAGES {
            return Err(PageError::PageOutOfRange(i64::from(page)));
        }
        Ok(Self(page))
    }

    /// Accepts any integer type coming from storage.
    ///
    /// # Errors
    ///
    /// Returns `PageError::PageOutOfRange` for values outside 1..=604.
    pub fn from_i64(page: i64) -> Result<Self, PageError> {
        u16::try_from(page)
            .map_err(|_| PageError::PageOutOfRange(page))
            .and_then(Self::new)
    }

    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }

    /// Section owning this page: `((p - 1) div 20) + 1`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn section(self) -> Section {
        Section(((self.0 - 1) / PAGES_PER_SECTION + 1) as u8)
    }

    /// Position within the owning section: `((p - 1) mod 20) + 1`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn page_in_section(self) -> u8 {
        ((self.0 - 1) % PAGES_PER_SECTION + 1) as u8
    }

    /// Rebuild an absolute page from a section and a position within it.
    ///
    /// # Errors
    ///
    /// Returns `PageError::PageNotInSection` if the position is 0, above 20,
    /// or runs past the last page of the text.
    pub fn from_section_page(section: Section, page_in_section: u8) -> Result<Self, PageError> {
        let not_in_section = PageError::PageNotInSection {
            section: section.0,
            page: page_in_section,
        };
        if page_in_section == 0 || u16::from(page_in_section) > PAGES_PER_SECTION {
            return Err(not_in_section);
        }
        let absolute = (u16::from(section.0) - 1) * PAGES_PER_SECTION + u16::from(page_in_section);
        Self::new(absolute).map_err(|_| not_in_section)
    }
}

impl TryFrom<u16> for PageNumber {
    type Error = PageError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageNumber> for u16 {
    fn from(page: PageNumber) -> Self {
        page.0
    }
}

impl fmt::Debug for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({})", self.0)
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// A 20-page grouping (sipara), 1-based.
///
/// Section 30 ends at page 600; the trailing pages 601..=604 resolve to a
/// short section 31 under the page arithmetic, so that section is accepted
/// as well.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Section(u8);

impl Section {
    pub const FIRST: Section = Section(1);
    pub const LAST: Section = Section(31);

    /// # Errors
    ///
    /// Returns `PageError::SectionOutOfRange` outside `1..=31`.
    pub fn new(section: u8) -> Result<Self, PageError> {
        if section == 0 || section > Self::LAST.0 {
            return Err(PageError::SectionOutOfRange(i64::from(section)));
        }
        Ok(Self(section))
    }

    /// # Errors
    ///
    /// Returns `PageError::SectionOutOfRange` outside `1..=31`.
    pub fn from_i64(section: i64) -> Result<Self, PageError> {
        u8::try_from(section)
            .map_err(|_| PageError::SectionOutOfRange(section))
            .and_then(Self::new)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn first_page(self) -> PageNumber {
        PageNumber((u16::from(self.0) - 1) * PAGES_PER_SECTION + 1)
    }

    #[must_use]
    pub fn last_page(self) -> PageNumber {
        PageNumber((u16::from(self.0) * PAGES_PER_SECTION).min(TOTAL_PAGES))
    }

    /// Absolute pages of this section, in order.
    pub fn pages(self) -> impl Iterator<Item = PageNumber> {
        (self.first_page().0..=self.last_page().0).map(PageNumber)
    }
}

impl TryFrom<u8> for Section {
    type Error = PageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Section> for u8 {
    fn from(section: Section) -> Self {
        section.0
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Section({})", self.0)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── PAGE REFERENCE ────────────────────────────────────────────────────────────
//

/// A page reference as written in a record, resolved once at ingestion.
///
/// Records write pages as `"41"`, `"41-45"`, `"41.0"` (spreadsheet floats) or
/// `"Pages 41, 42, 43"`. The raw text is kept for display; `pages` holds
/// the resolved, sorted, de-duplicated page numbers. Text that resolves to
/// nothing leaves `pages` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    raw: String,
    pages: Vec<PageNumber>,
}

impl PageRef {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut pages = Vec::new();
        let lowered = raw.trim().to_lowercase();
        let body = lowered
            .strip_prefix("pages")
            .or_else(|| lowered.strip_prefix("page"))
            .unwrap_or(&lowered);

        for part in body.split([',', '،', ';']) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match parse_part(part) {
                Some(found) => pages.extend(found),
                None => log::debug!("ignoring unparseable page reference fragment {part:?} in {raw:?}"),
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Self {
            raw: raw.to_owned(),
            pages,
        }
    }

    #[must_use]
    pub fn from_page(page: PageNumber) -> Self {
        Self {
            raw: page.to_string(),
            pages: vec![page],
        }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn pages(&self) -> &[PageNumber] {
        &self.pages
    }

    /// The page when this reference names exactly one page.
    #[must_use]
    pub fn single(&self) -> Option<PageNumber> {
        match self.pages.as_slice() {
            [page] => Some(*page),
            _ => None,
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<PageNumber> {
        self.pages.first().copied()
    }

    #[must_use]
    pub fn last(&self) -> Option<PageNumber> {
        self.pages.last().copied()
    }

    #[must_use]
    pub fn contains(&self, page: PageNumber) -> bool {
        self.pages.binary_search(&page).is_ok()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.pages.is_empty()
    }
}

impl From<PageNumber> for PageRef {
    fn from(page: PageNumber) -> Self {
        Self::from_page(page)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_number(text: &str) -> Option<PageNumber> {
    let text = text.trim();
    if let Ok(n) = text.parse::<u16>() {
        return PageNumber::new(n).ok();
    }
    let float = text.parse::<f64>().ok()?;
    if float.fract() != 0.0 || !(1.0..=f64::from(TOTAL_PAGES)).contains(&float) {
        return None;
    }
    PageNumber::new(float as u16).ok()
}

fn parse_part(part: &str) -> Option<Vec<PageNumber>> {
    let bounds = part
        .split_once(['-', '–'])
        .or_else(|| part.split_once(" to "));
    match bounds {
        Some((start, end)) => {
            let start = parse_number(start)?;
            let end = parse_number(end)?;
            if start > end {
                return None;
            }
            Some((start.0..=end.0).map(PageNumber).collect())
        }
        None => parse_number(part).map(|page| vec![page]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u16) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    #[test]
    fn page_bounds_are_enforced() {
        assert!(PageNumber::new(0).is_err());
        assert!(PageNumber::new(1).is_ok());
        assert!(PageNumber::new(604).is_ok());
        assert_eq!(PageNumber::new(605), Err(PageError::PageOutOfRange(605)));
        assert_eq!(PageNumber::from_i64(-3), Err(PageError::PageOutOfRange(-3)));
    }

    #[test]
    fn section_arithmetic_matches_formula_for_every_page() {
        for p in 1..=TOTAL_PAGES {
            let page = page(p);
            assert_eq!(u16::from(page.section().value()), (p - 1) / 20 + 1);
            assert_eq!(u16::from(page.page_in_section()), (p - 1) % 20 + 1);
            let rebuilt = PageNumber::from_section_page(page.section(), page.page_in_section());
            assert_eq!(rebuilt, Ok(page));
        }
    }

    #[test]
    fn section_boundaries() {
        assert_eq!(page(20).section(), Section::new(1).unwrap());
        assert_eq!(page(20).page_in_section(), 20);
        assert_eq!(page(21).section(), Section::new(2).unwrap());
        assert_eq!(page(21).page_in_section(), 1);
        assert_eq!(PageNumber::LAST.section(), Section::LAST);
        assert_eq!(Section::LAST.pages().count(), 4);
        assert_eq!(Section::new(30).unwrap().last_page(), page(600));
        assert!(Section::new(0).is_err());
        assert!(Section::new(32).is_err());
    }

    #[test]
    fn from_section_page_rejects_positions_past_the_text() {
        assert!(PageNumber::from_section_page(Section::LAST, 5).is_err());
        assert!(PageNumber::from_section_page(Section::FIRST, 0).is_err());
        assert!(PageNumber::from_section_page(Section::FIRST, 21).is_err());
    }

    #[test]
    fn page_ref_parses_legacy_shapes() {
        assert_eq!(PageRef::parse("41").single(), Some(page(41)));
        assert_eq!(PageRef::parse("41.0").single(), Some(page(41)));
        assert_eq!(
            PageRef::parse("41-43").pages(),
            &[page(41), page(42), page(43)]
        );
        let listed = PageRef::parse("Pages 43, 41, 42, 41");
        assert_eq!(listed.pages(), &[page(41), page(42), page(43)]);
        assert_eq!(listed.first(), Some(page(41)));
        assert_eq!(listed.last(), Some(page(43)));
        assert!(listed.single().is_none());
        assert_eq!(listed.raw(), "Pages 43, 41, 42, 41");
    }

    #[test]
    fn page_ref_keeps_raw_text_when_unresolved() {
        let unresolved = PageRef::parse("Surah Mulk");
        assert!(!unresolved.is_resolved());
        assert_eq!(unresolved.raw(), "Surah Mulk");
        assert!(!PageRef::parse("45-41").is_resolved());
        assert!(!PageRef::parse("700").is_resolved());
    }
}
