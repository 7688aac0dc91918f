//! Person-name normalization
//!
//! Canonicalizes raw names into a comparable form and pulls generational
//! suffixes (jr, sr, ii, iii, iv) out into a separate field.
//!
//! The rules are literal substring rules. Suffix fragments are removed
//! wherever they occur and organizational markers truncate at their first
//! substring hit, so names that happen to embed those letter sequences are
//! over-trimmed: `"patrick"` becomes `"paick"` and `"jon exacting snow"`
//! becomes `"jon ex"`. Downstream grouping relies on these exact outputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters removed before any other rule runs.
pub const STRIPPED_PUNCTUATION: [char; 4] = [',', '-', '.', '/'];

/// Trailing token dropped from raw names (matched case-insensitively).
pub const TRAILING_MARKER: &str = "bd";

/// Letter sequences removed from the name, in this order.
pub const SUFFIX_FRAGMENTS: [&str; 3] = ["jr", "sr", "tr"];

/// Organizational markers; the name is cut right before the first hit.
///
/// `"ustee"` is what remains of "trustee" once `"tr"` has been removed.
pub const TRUNCATION_MARKERS: [&str; 5] = ["ustee", "sbra", "liquidating", "acting", "chapter"];

const ROMAN_NUMERALS: [&str; 3] = ["ii", "iii", "iv"];

/// Generational suffix extracted from a raw name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suffix {
    #[default]
    None,
    Jr,
    Sr,
    II,
    III,
    IV,
}

impl Suffix {
    /// Output form; `None` renders as an empty string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Suffix::None => "",
            Suffix::Jr => "jr",
            Suffix::Sr => "sr",
            Suffix::II => "ii",
            Suffix::III => "iii",
            Suffix::IV => "iv",
        }
    }

    fn from_numeral(token: &str) -> Option<Self> {
        match token {
            "ii" => Some(Suffix::II),
            "iii" => Some(Suffix::III),
            "iv" => Some(Suffix::IV),
            _ => None,
        }
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of normalizing one raw name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedName {
    /// Comparable form of the name
    pub canonical: String,
    /// Suffix detected on the punctuation-stripped raw name
    pub suffix: Suffix,
    /// Number of whitespace-delimited tokens in `canonical`
    pub token_count: usize,
}

/// Normalize a raw name.
///
/// The cleaning rules are applied until the name stops changing, which makes
/// the canonical form a fixed point: normalizing it again returns it as is.
/// Empty and all-punctuation inputs produce an empty canonical name.
///
/// # Example
/// ```
/// use nameresolve::algorithms::normalize::{normalize_name, Suffix};
///
/// let name = normalize_name("Jon C. Snow, Jr.");
/// assert_eq!(name.canonical, "jon c snow");
/// assert_eq!(name.suffix, Suffix::Jr);
/// assert_eq!(name.token_count, 3);
/// ```
#[must_use]
pub fn normalize_name(raw: &str) -> NormalizedName {
    let cleaned = strip_punctuation(raw);
    let suffix = detect_suffix(&cleaned);

    let mut canonical = refine(&cleaned);
    loop {
        let next = refine(&strip_punctuation(&canonical));
        if next == canonical {
            break;
        }
        canonical = next;
    }

    let token_count = canonical.split_whitespace().count();
    NormalizedName {
        canonical,
        suffix,
        token_count,
    }
}

/// Remove stripped punctuation and the trailing marker token, then lowercase.
#[must_use]
pub fn strip_punctuation(raw: &str) -> String {
    let lowered = raw
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect::<String>()
        .to_lowercase();
    strip_trailing_marker(&lowered).to_string()
}

fn strip_trailing_marker(s: &str) -> &str {
    match s.trim_end().strip_suffix(TRAILING_MARKER) {
        Some(head) if head.ends_with(char::is_whitespace) => head,
        _ => s,
    }
}

/// First match wins: "jr" anywhere, then "sr" anywhere, then a trailing numeral.
fn detect_suffix(cleaned: &str) -> Suffix {
    if cleaned.contains("jr") {
        Suffix::Jr
    } else if cleaned.contains("sr") {
        Suffix::Sr
    } else {
        cleaned
            .split_whitespace()
            .next_back()
            .and_then(Suffix::from_numeral)
            .unwrap_or(Suffix::None)
    }
}

fn refine(cleaned: &str) -> String {
    let mut name = cleaned.to_string();
    for fragment in SUFFIX_FRAGMENTS {
        name = name.replace(fragment, "");
    }
    let name = truncate_at_markers(drop_trailing_numeral(&name));
    name.trim().to_string()
}

/// Drop a trailing ii/iii/iv token; a lone numeral is kept.
fn drop_trailing_numeral(s: &str) -> &str {
    match s.trim_end().rsplit_once(char::is_whitespace) {
        Some((head, last)) if ROMAN_NUMERALS.contains(&last) && !head.trim().is_empty() => head,
        _ => s,
    }
}

fn truncate_at_markers(s: &str) -> &str {
    let mut name = s;
    for marker in TRUNCATION_MARKERS {
        if let Some(pos) = name.find(marker) {
            name = &name[..pos];
        }
    }
    name
}
