//! Rule-based name-match tiers
//!
//! Classifies how a candidate name found by an external directory lookup
//! relates to a resolved name. Enrichment consumers keep candidates with any
//! tier and prefer lower ranks.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type Tokens<'a> = SmallVec<[&'a str; 4]>;

const ROMAN_NUMERALS: [&str; 3] = ["ii", "iii", "iv"];

/// Match quality, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchTier {
    /// Same tokens after cleaning
    Exact = 1,
    /// Theirs equals ours with our middle name reduced to its initial
    TheirsUseOurInitial = 2,
    /// Ours equals theirs with their middle name reduced to its initial
    OursUseTheirInitial = 3,
    /// Theirs equals ours without the middle names
    TheirsOmitMiddle = 4,
    /// Ours equals theirs without the middle names
    OursOmitMiddle = 5,
}

impl MatchTier {
    /// Numeric rank, 1 (best) to 5
    #[must_use]
    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// Lowercase, trim and keep only ASCII letters and spaces.
fn clean(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == ' ')
        .collect()
}

fn trailing_numeral_split(name: &str) -> Option<&str> {
    match name.trim_end().rsplit_once(' ') {
        Some((head, last)) if ROMAN_NUMERALS.contains(&last) => Some(head),
        _ => None,
    }
}

fn strip_suffixes(name: &str) -> String {
    name.replace("jr", "").replace("sr", "")
}

/// Clean both names; generational numerals are dropped only when both carry one.
fn prepare_pair(ours: &str, theirs: &str) -> (String, String) {
    let ours = clean(ours);
    let theirs = clean(theirs);
    let (ours, theirs) = match (trailing_numeral_split(&ours), trailing_numeral_split(&theirs)) {
        (Some(a), Some(b)) => (a.to_string(), b.to_string()),
        _ => (ours, theirs),
    };
    (strip_suffixes(&ours), strip_suffixes(&theirs))
}

/// First and last token; `None` for a single token or an empty name.
fn remove_middle<'a>(tokens: &Tokens<'a>) -> Option<Tokens<'a>> {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) if tokens.len() > 1 => Some(SmallVec::from_slice(&[*first, *last])),
        _ => None,
    }
}

/// Reduce the second token to its initial when there are at least three.
fn strip_middle<'a>(tokens: &Tokens<'a>) -> Tokens<'a> {
    if tokens.len() < 3 {
        return tokens.clone();
    }
    let middle = tokens[1];
    let initial = middle.get(..1).unwrap_or(middle);
    SmallVec::from_slice(&[tokens[0], initial, tokens[tokens.len() - 1]])
}

/// Classify a candidate name (`theirs`) against a resolved name (`ours`).
///
/// # Example
/// ```
/// use nameresolve::algorithms::match_tier::{classify_name_match, MatchTier};
///
/// assert_eq!(classify_name_match("Jon Clark Snow", "Jon C Snow"), Some(MatchTier::TheirsUseOurInitial));
/// assert_eq!(classify_name_match("Jon Snow", "Arya Stark"), None);
/// ```
#[must_use]
pub fn classify_name_match(ours: &str, theirs: &str) -> Option<MatchTier> {
    let (ours, theirs) = prepare_pair(ours, theirs);
    let ours: Tokens = ours.split_whitespace().collect();
    let theirs: Tokens = theirs.split_whitespace().collect();

    if ours == theirs {
        return Some(MatchTier::Exact);
    }

    if ours.len() > 2 {
        if remove_middle(&ours).as_ref() == Some(&theirs) {
            return Some(MatchTier::TheirsOmitMiddle);
        }
        if strip_middle(&ours) == theirs {
            return Some(MatchTier::TheirsUseOurInitial);
        }
        if strip_middle(&theirs) == ours {
            return Some(MatchTier::OursUseTheirInitial);
        }
    }

    if remove_middle(&theirs).as_ref() == Some(&ours) {
        return Some(MatchTier::OursOmitMiddle);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_after_cleaning() {
        assert_eq!(classify_name_match("Jon Snow", " jon snow. "), Some(MatchTier::Exact));
        assert_eq!(classify_name_match("Jon Snow Jr", "Jon Snow"), Some(MatchTier::Exact));
        assert_eq!(classify_name_match("Jon Snow III", "Jon Snow IV"), Some(MatchTier::Exact));
        assert_eq!(classify_name_match("Jon  Snow", "Jon Snow"), Some(MatchTier::Exact));
    }

    #[test]
    fn test_middle_name_tiers() {
        assert_eq!(
            classify_name_match("Jon Clark Snow", "Jon Snow"),
            Some(MatchTier::TheirsOmitMiddle)
        );
        assert_eq!(
            classify_name_match("Jon Clark Snow", "Jon C Snow"),
            Some(MatchTier::TheirsUseOurInitial)
        );
        assert_eq!(
            classify_name_match("Jon C Snow", "Jon Clark Snow"),
            Some(MatchTier::OursUseTheirInitial)
        );
        assert_eq!(
            classify_name_match("Jon Snow", "Jon Clark Snow"),
            Some(MatchTier::OursOmitMiddle)
        );
    }

    #[test]
    fn test_numeral_on_one_side_only() {
        assert_eq!(classify_name_match("Jon Snow III", "Jon Snow"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(classify_name_match("Jon Snow", "Arya Stark"), None);
        assert_eq!(classify_name_match("Jon", "Jon Snow"), None);
    }

    #[test]
    fn test_tier_order() {
        assert!(MatchTier::Exact < MatchTier::OursOmitMiddle);
        assert_eq!(MatchTier::OursUseTheirInitial.rank(), 3);
    }
}
