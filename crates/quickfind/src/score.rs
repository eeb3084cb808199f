//! Pattern scoring against display-relative paths.
//!
//! Matching is a case-insensitive subsequence match over the displayed
//! relative path. The alignment is chosen in two passes: a backward greedy
//! scan finds the rightmost possible start of a match (biasing matches toward
//! the filename), then a forward scan from that start picks the most compact
//! positions (biasing toward contiguous runs). The score is a sum of bonuses
//! over the matched positions; path length and path text never enter the
//! score itself, they only break ties in [`rank_order`].

use std::cmp::Ordering;
use std::ops::Range;

use crate::types::{FileItem, Pattern, ScoredFileItem};

/// Bonus for a matched character directly following the previous match.
const CONTIGUOUS_BONUS: i64 = 16;
/// Bonus for a matched character inside the last path component.
const FILENAME_BONUS: i64 = 8;
/// Bonus for a matched character at the start of a path component or word.
const BOUNDARY_BONUS: i64 = 4;

/// Characters that start a new word within a component.
const WORD_SEPARATORS: [char; 5] = ['/', '.', '_', '-', ' '];

/// Scores `item` against `pattern`.
///
/// Returns `None` when the pattern does not match. The empty pattern matches
/// everything with a constant score and no highlights.
pub fn score_item(pattern: &Pattern, item: &FileItem) -> Option<ScoredFileItem> {
    let (score, highlights) = score_path(pattern, item.relative())?;
    Some(ScoredFileItem::new(item.clone(), score, highlights))
}

/// Scores `pattern` against a display-relative path.
///
/// Pure and total: never fails, safe to call concurrently. The highlight
/// ranges are character indices into the displayed path, merged over
/// consecutive matches.
pub fn score_path(pattern: &Pattern, relative: &str) -> Option<(i64, Vec<Range<usize>>)> {
    if pattern.is_empty() {
        return Some((0, Vec::new()));
    }

    let haystack: Vec<char> = relative.chars().map(fold_char).collect();
    let needle: Vec<char> = pattern.as_str().chars().map(fold_char).collect();
    if needle.len() > haystack.len() {
        return None;
    }

    let positions = match_positions(&needle, &haystack)?;
    let score = score_positions(&positions, &haystack);
    Some((score, merge_ranges(&positions)))
}

/// Comparator for ranked results: higher score first, then shorter relative
/// path, then lexicographic relative path. Total and deterministic for any
/// fixed pattern.
pub fn rank_order(a: &ScoredFileItem, b: &ScoredFileItem) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.item.relative().len().cmp(&b.item.relative().len()))
        .then_with(|| a.item.relative().cmp(b.item.relative()))
}

/// Case-folds a character for matching.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Finds the match alignment, or `None` when `needle` is not a subsequence
/// of `haystack`.
///
/// Backward pass: match the needle right-to-left from the end of the
/// haystack, which yields the rightmost possible start position. Forward
/// pass: re-match left-to-right from that start, taking the earliest
/// position for each character, which compacts the alignment.
fn match_positions(needle: &[char], haystack: &[char]) -> Option<Vec<usize>> {
    let mut idx = haystack.len();
    for &nc in needle.iter().rev() {
        loop {
            if idx == 0 {
                return None;
            }
            idx -= 1;
            if haystack[idx] == nc {
                break;
            }
        }
    }
    let start = idx;

    let mut positions = Vec::with_capacity(needle.len());
    let mut hay = start;
    for &nc in needle {
        while hay < haystack.len() && haystack[hay] != nc {
            hay += 1;
        }
        if hay >= haystack.len() {
            // Not reachable: the backward pass established a match from
            // `start`.
            return None;
        }
        positions.push(hay);
        hay += 1;
    }
    Some(positions)
}

fn score_positions(positions: &[usize], haystack: &[char]) -> i64 {
    let filename_start = haystack
        .iter()
        .rposition(|&c| c == '/')
        .map(|p| p + 1)
        .unwrap_or(0);

    let mut score = 0;
    for (i, &pos) in positions.iter().enumerate() {
        if pos >= filename_start {
            score += FILENAME_BONUS;
        }
        if i > 0 && pos == positions[i - 1] + 1 {
            score += CONTIGUOUS_BONUS;
        }
        let at_boundary = pos == 0 || WORD_SEPARATORS.contains(&haystack[pos - 1]);
        if at_boundary {
            score += BOUNDARY_BONUS;
        }
    }
    score
}

/// Merges consecutive match positions into half-open character ranges.
fn merge_ranges(positions: &[usize]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for &pos in positions {
        match ranges.last_mut() {
            Some(last) if last.end == pos => last.end = pos + 1,
            _ => ranges.push(pos..pos + 1),
        }
    }
    ranges
}
