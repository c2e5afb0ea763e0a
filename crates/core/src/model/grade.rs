use serde::{Deserialize, Serialize};
use std::fmt;

//
// ─── GRADE VALUE ───────────────────────────────────────────────────────────────
//

/// An overall grade as recorded, before normalization.
///
/// Teachers record grades as a 1-10 mark, an English word, or an Arabic word.
/// The raw value is kept on the record so presentation can show grades that
/// failed to normalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeValue {
    Numeric(f64),
    Text(String),
}

impl GradeValue {
    /// Builds a grade from stored text. Blank text is no grade at all.
    #[must_use]
    pub fn from_text(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::Text(trimmed.to_owned()))
        }
    }

    /// The 1-10 score for this grade, if it can be determined.
    #[must_use]
    pub fn normalized(&self) -> Option<f64> {
        normalize(self)
    }

    /// Text form used when persisting.
    #[must_use]
    pub fn to_stored(&self) -> String {
        match self {
            GradeValue::Numeric(v) => v.to_string(),
            GradeValue::Text(t) => t.clone(),
        }
    }
}

impl From<f64> for GradeValue {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for GradeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<GradeWord> for GradeValue {
    fn from(word: GradeWord) -> Self {
        Self::Text(word.arabic().to_owned())
    }
}

impl fmt::Display for GradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeValue::Numeric(v) => write!(f, "{v}"),
            GradeValue::Text(t) => f.write_str(t),
        }
    }
}

//
// ─── GRADE WORDS ───────────────────────────────────────────────────────────────
//

/// The four grade words offered on session forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeWord {
    Excellent,
    Good,
    Average,
    Weak,
}

impl GradeWord {
    pub const ALL: [GradeWord; 4] = [
        GradeWord::Excellent,
        GradeWord::Good,
        GradeWord::Average,
        GradeWord::Weak,
    ];

    #[must_use]
    pub fn score(self) -> f64 {
        match self {
            GradeWord::Excellent => 10.0,
            GradeWord::Good => 8.0,
            GradeWord::Average => 6.0,
            GradeWord::Weak => 4.0,
        }
    }

    #[must_use]
    pub fn arabic(self) -> &'static str {
        match self {
            GradeWord::Excellent => "جيد جدا",
            GradeWord::Good => "جيد",
            GradeWord::Average => "متوسط",
            GradeWord::Weak => "ضعيف",
        }
    }

    #[must_use]
    pub fn english(self) -> &'static str {
        match self {
            GradeWord::Excellent => "Excellent",
            GradeWord::Good => "Good",
            GradeWord::Average => "Average",
            GradeWord::Weak => "Weak",
        }
    }

    /// Vocabulary matched as substrings, checked in `ALL` order.
    ///
    /// "جيد جدا" contains "جيد", so excellent must be tried before good.
    fn patterns(self) -> &'static [&'static str] {
        match self {
            GradeWord::Excellent => &["جيد جدا", "ممتاز", "jayyid jiddan", "mumtaz", "excellent"],
            GradeWord::Good => &["جيد", "jayyid", "good"],
            GradeWord::Average => &["متوسط", "mutawassit", "average"],
            GradeWord::Weak => &["ضعيف", "da'eef", "daeef", "weak"],
        }
    }

    /// Find the grade word named anywhere in `text`, case-insensitively.
    #[must_use]
    pub fn recognize(text: &str) -> Option<Self> {
        let folded = fold(text);
        Self::ALL
            .into_iter()
            .find(|word| word.patterns().iter().any(|p| folded.contains(p)))
    }
}

/// Lowercase and drop Arabic harakat so "جيد جدًا" still reads as "جيد جدا".
fn fold(text: &str) -> String {
    text.chars()
        .filter(|c| !('\u{064B}'..='\u{0652}').contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

//
// ─── NORMALIZATION ─────────────────────────────────────────────────────────────
//

/// Normalize a grade of any recorded shape onto the 1-10 scale.
///
/// - numeric grades are returned unchanged
/// - text is parsed as a number first, then matched against the grade words
/// - anything else is `None`, which callers exclude from averages rather than
///   treating as a failing grade
///
/// Never panics; non-finite numbers are `None`.
#[must_use]
pub fn normalize(grade: &GradeValue) -> Option<f64> {
    match grade {
        GradeValue::Numeric(v) => v.is_finite().then_some(*v),
        GradeValue::Text(text) => {
            let trimmed = text.trim();
            if let Ok(v) = trimmed.parse::<f64>() {
                return v.is_finite().then_some(v);
            }
            let score = GradeWord::recognize(trimmed).map(GradeWord::score);
            if score.is_none() && !trimmed.is_empty() {
                log::debug!("grade {trimmed:?} matches no known grade word");
            }
            score
        }
    }
}

/// Convenience for optional record fields.
#[must_use]
pub fn normalize_opt(grade: Option<&GradeValue>) -> Option<f64> {
    grade.and_then(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> GradeValue {
        GradeValue::Text(s.to_owned())
    }

    #[test]
    fn numeric_grades_pass_through() {
        assert_eq!(normalize(&GradeValue::Numeric(7.0)), Some(7.0));
        assert_eq!(normalize(&GradeValue::Numeric(9.5)), Some(9.5));
        assert_eq!(normalize(&GradeValue::Numeric(f64::NAN)), None);
        assert_eq!(normalize(&text(" 8 ")), Some(8.0));
        assert_eq!(normalize(&text("6.5")), Some(6.5));
    }

    #[test]
    fn normalization_is_idempotent_on_numeric_output() {
        for raw in [1.0, 4.0, 6.0, 7.25, 8.0, 10.0] {
            let once = normalize(&GradeValue::Numeric(raw)).unwrap();
            let twice = normalize(&GradeValue::Numeric(once)).unwrap();
            assert_eq!(once, twice);
        }
        for word in GradeWord::ALL {
            let once = normalize(&word.into()).unwrap();
            assert_eq!(normalize(&GradeValue::Numeric(once)), Some(once));
        }
    }

    #[test]
    fn arabic_words_map_to_scores() {
        assert_eq!(normalize(&text("جيد جدا")), Some(10.0));
        assert_eq!(normalize(&text("جيد جدًا")), Some(10.0));
        assert_eq!(normalize(&text("ممتاز")), Some(10.0));
        assert_eq!(normalize(&text("جيد")), Some(8.0));
        assert_eq!(normalize(&text("متوسط")), Some(6.0));
        assert_eq!(normalize(&text("ضعيف")), Some(4.0));
    }

    #[test]
    fn english_and_transliterated_words_match_case_insensitively() {
        assert_eq!(normalize(&text("EXCELLENT")), Some(10.0));
        assert_eq!(normalize(&text("Jayyid Jiddan")), Some(10.0));
        assert_eq!(normalize(&text("Good ✅")), Some(8.0));
        assert_eq!(normalize(&text("jayyid")), Some(8.0));
        assert_eq!(normalize(&text("Average 🟡")), Some(6.0));
        assert_eq!(normalize(&text("Mutawassit")), Some(6.0));
        assert_eq!(normalize(&text("Da'eef")), Some(4.0));
        assert_eq!(normalize(&text("weak")), Some(4.0));
    }

    #[test]
    fn unknown_or_blank_text_is_undefined() {
        assert_eq!(normalize(&text("absent")), None);
        assert_eq!(normalize(&text("")), None);
        assert_eq!(normalize_opt(None), None);
        assert!(GradeValue::from_text("   ").is_none());
    }

    #[test]
    fn grade_words_round_trip_through_arabic_labels() {
        for word in GradeWord::ALL {
            assert_eq!(GradeWord::recognize(word.arabic()), Some(word));
            assert_eq!(GradeWord::recognize(word.english()), Some(word));
        }
    }
}
