//! Ranking matcher for the catalog search overlay.
//!
//! # Matching
//!
//! An entry matches a query when the trimmed, lowercased query is a
//! substring of the entry's name or category name. Failing that, the
//! query is split on whitespace and the entry matches if *any* query
//! token is contained in *any* whitespace-separated word of the name or
//! category name.
//!
//! # Ranking
//!
//! Matches are ordered by [`MatchTier`] computed on the name, then
//! alphabetically by name, with Turkish and other accented letters
//! sorting beside their base letter. The sort is stable, so entries with
//! identical names keep their pool order.
//!
//! | Tier | Condition |
//! |------|-----------|
//! | `Exact` | name equals query |
//! | `Prefix` | name starts with query |
//! | `Substring` | name contains query |
//! | `Other` | matched via category or tokens only |

use deunicode::deunicode;
use serde::Serialize;

use crate::models::CatalogEntry;

/// Lowercase and trim a raw query string.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase().trim().to_string()
}

/// Specificity of a match, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Prefix,
    Substring,
    Other,
}

impl MatchTier {
    /// Classify a lowercase name against a normalized query.
    pub fn classify(name: &str, query: &str) -> Self {
        if name == query {
            MatchTier::Exact
        } else if name.starts_with(query) {
            MatchTier::Prefix
        } else if name.contains(query) {
            MatchTier::Substring
        } else {
            MatchTier::Other
        }
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    pub tier: MatchTier,
    pub entry: CatalogEntry,
}

/// Returns true if `entry` satisfies the match predicate for `query`.
///
/// An empty (or whitespace-only) query matches nothing.
pub fn matches(query: &str, entry: &CatalogEntry) -> bool {
    let q = normalize_query(query);
    if q.is_empty() {
        return false;
    }
    let name = entry.name.to_lowercase();
    let category = lowercase_category(entry);
    is_match(&q, &name, &category)
}

/// Filter and order `pool` for `query`.
pub fn rank(query: &str, pool: &[CatalogEntry]) -> Vec<CatalogEntry> {
    rank_explained(query, pool)
        .into_iter()
        .map(|m| m.entry)
        .collect()
}

/// Like [`rank`], but keeps the tier of every hit.
pub fn rank_explained(query: &str, pool: &[CatalogEntry]) -> Vec<RankedMatch> {
    let q = normalize_query(query);
    if q.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(MatchTier, CollationKey, &CatalogEntry)> = pool
        .iter()
        .filter_map(|entry| {
            let name = entry.name.to_lowercase();
            let category = lowercase_category(entry);
            if !is_match(&q, &name, &category) {
                return None;
            }
            let tier = MatchTier::classify(&name, &q);
            Some((tier, CollationKey::new(name), entry))
        })
        .collect();

    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    scored
        .into_iter()
        .map(|(tier, _, entry)| RankedMatch {
            tier,
            entry: entry.clone(),
        })
        .collect()
}

/// Alphabetical sort key for lowercase names.
///
/// Accented letters sort next to their base letter (`ç` with `c`,
/// `ü` with `u`); the lowercase name breaks ties so `cay` precedes
/// `çay`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CollationKey {
    base: String,
    name: String,
}

impl CollationKey {
    fn new(name: String) -> Self {
        Self {
            base: deunicode(&name),
            name,
        }
    }
}

fn lowercase_category(entry: &CatalogEntry) -> String {
    entry
        .category_name()
        .map(str::to_lowercase)
        .unwrap_or_default()
}

fn is_match(query: &str, name: &str, category: &str) -> bool {
    if name.contains(query) || category.contains(query) {
        return true;
    }
    query.split_whitespace().any(|token| {
        name.split_whitespace().any(|word| word.contains(token))
            || category.split_whitespace().any(|word| word.contains(token))
    })
}

/// A piece of highlighted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Split `text` around every case-insensitive occurrence of the trimmed
/// query. Segment boundaries always fall on char boundaries of `text`,
/// including for characters whose lowercase form is longer than the
/// original (e.g. Turkish `İ`).
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let q = normalize_query(query);
    if text.is_empty() {
        return Vec::new();
    }
    if q.is_empty() {
        return vec![Segment {
            text,
            matched: false,
        }];
    }

    // Byte offsets in `lowered` map back to the span of the source char.
    let mut lowered = String::with_capacity(text.len());
    let mut spans: Vec<(usize, usize)> = Vec::with_capacity(text.len());
    for (start, ch) in text.char_indices() {
        let end = start + ch.len_utf8();
        for lc in ch.to_lowercase() {
            lowered.push(lc);
            spans.extend(std::iter::repeat((start, end)).take(lc.len_utf8()));
        }
    }

    let mut segments = Vec::new();
    let mut cursor = 0;
    for (pos, found) in lowered.match_indices(q.as_str()) {
        let start = spans[pos].0;
        let end = spans[pos + found.len() - 1].1;
        if start < cursor {
            continue;
        }
        if start > cursor {
            segments.push(Segment {
                text: &text[cursor..start],
                matched: false,
            });
        }
        segments.push(Segment {
            text: &text[start..end],
            matched: true,
        });
        cursor = end;
    }
    if cursor < text.len() {
        segments.push(Segment {
            text: &text[cursor..],
            matched: false,
        });
    }

    segments
}
