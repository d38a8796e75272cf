//! Fuzzy cross-service track matching.
//!
//! A source track is compared against the ranked search results of another
//! service. Titles and artists are normalized (lowercase, punctuation folded to
//! spaces, whitespace collapsed) and compared with the Sørensen-Dice coefficient
//! over character bigrams, so strings sharing no bigram score zero. The
//! combined text score weighs the title at 0.6 and the artist at 0.4. When both
//! sides carry a duration, a difference beyond the tolerance scales the score
//! down, but never below half of the text score.
//!
//! The best candidate is accepted only when its score reaches the acceptance
//! threshold; on equal scores the earliest candidate wins because search
//! results arrive in the service's own relevance order.

use std::fmt;

use crate::types::{MatchResult, TrackDescriptor};

// an exact artist alone contributes 0.4, so a different title by the same
// artist stays below this
pub const DEFAULT_THRESHOLD: f64 = 0.6;
pub const DEFAULT_DURATION_TOLERANCE: u32 = 3;
pub const DEFAULT_DURATION_FLOOR: f64 = 0.5;

const TITLE_WEIGHT: f64 = 0.6;
const ARTIST_WEIGHT: f64 = 0.4;
// seconds past the tolerance that would take the multiplier to zero without the floor
const DURATION_PENALTY_SPAN: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    InvalidInput(String),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

impl std::error::Error for MatchError {}

/// Matching tunables. `Matcher::default()` uses the documented defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    pub threshold: f64,
    pub duration_tolerance: u32,
    pub duration_floor: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            duration_tolerance: DEFAULT_DURATION_TOLERANCE,
            duration_floor: DEFAULT_DURATION_FLOOR,
        }
    }
}

impl Matcher {
    /// Non-finite thresholds fall back to the default.
    pub fn with_threshold(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            DEFAULT_THRESHOLD
        };
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Picks the best candidate for `source`.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidInput` when the source title is empty. An
    /// empty candidate list is not an error and yields `MatchResult::NoMatch`.
    pub fn match_track(
        &self,
        source: &TrackDescriptor,
        candidates: &[TrackDescriptor],
    ) -> Result<MatchResult, MatchError> {
        validate(source)?;

        let title = normalize(&source.title);
        let artist = normalize(&source.artist);

        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let text = text_score(&title, &artist, candidate);
            let score = text
                * self.duration_multiplier(source.duration_seconds, candidate.duration_seconds);

            // strict comparison keeps the earliest candidate on ties
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((i, score));
            }
        }

        Ok(match best {
            Some((index, score)) if score >= self.threshold => MatchResult::Matched {
                index,
                candidate: candidates[index].clone(),
                score,
            },
            Some((_, score)) => MatchResult::NoMatch { best_score: score },
            None => MatchResult::NoMatch { best_score: 0.0 },
        })
    }

    /// Full score of a single candidate, duration penalty included.
    pub fn score(&self, source: &TrackDescriptor, candidate: &TrackDescriptor) -> f64 {
        let text = text_score(&normalize(&source.title), &normalize(&source.artist), candidate);
        text * self.duration_multiplier(source.duration_seconds, candidate.duration_seconds)
    }

    /// Multiplier in `[duration_floor, 1]`. Missing durations on either side
    /// never penalize.
    pub fn duration_multiplier(&self, source: Option<u32>, candidate: Option<u32>) -> f64 {
        let (Some(a), Some(b)) = (source, candidate) else {
            return 1.0;
        };

        let diff = a.abs_diff(b);
        if diff <= self.duration_tolerance {
            return 1.0;
        }

        let excess = (diff - self.duration_tolerance) as f64;
        (1.0 - excess / DURATION_PENALTY_SPAN).clamp(self.duration_floor.clamp(0.0, 1.0), 1.0)
    }
}

/// Rejects sources that cannot be matched at all.
pub fn validate(source: &TrackDescriptor) -> Result<(), MatchError> {
    if source.title.trim().is_empty() {
        return Err(MatchError::InvalidInput(
            "source track has an empty title".to_string(),
        ));
    }
    Ok(())
}

/// Matches with the default tunables.
pub fn match_track(
    source: &TrackDescriptor,
    candidates: &[TrackDescriptor],
) -> Result<MatchResult, MatchError> {
    Matcher::default().match_track(source, candidates)
}

/// Weighted title/artist similarity without duration. Inputs from the source
/// side must already be normalized.
fn text_score(source_title: &str, source_artist: &str, candidate: &TrackDescriptor) -> f64 {
    let title = similarity(source_title, &normalize(&candidate.title));
    let artist = similarity(source_artist, &normalize(&candidate.artist));
    (TITLE_WEIGHT * title + ARTIST_WEIGHT * artist).clamp(0.0, 1.0)
}

/// Bigram overlap in `[0, 1]`. Equal strings, empty ones included, score 1.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    strsim::sorensen_dice(a, b)
}

pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_punctuation() {
        assert_eq!(normalize("Hey Jude (Remastered)"), "hey jude remastered");
        assert_eq!(normalize("  AC/DC  "), "ac dc");
        assert_eq!(normalize("Don't Stop Me Now"), "dont stop me now");
        assert_eq!(normalize("Don’t"), "dont");
        assert_eq!(normalize("Beyoncé"), "beyoncé");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn similarity_of_equal_strings_is_one() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
    }

    #[test]
    fn similarity_without_shared_bigrams_is_zero() {
        assert_eq!(similarity("hey jude", "let it be"), 0.0);
        assert_eq!(similarity("yesterday", ""), 0.0);
        assert!(similarity("hey jude", "hey bulldog") < 0.3);
    }

    #[test]
    fn multiplier_inside_tolerance_is_neutral() {
        let m = Matcher::default();
        assert_eq!(m.duration_multiplier(Some(200), Some(203)), 1.0);
        assert_eq!(m.duration_multiplier(Some(203), Some(200)), 1.0);
        assert_eq!(m.duration_multiplier(None, Some(10)), 1.0);
        assert_eq!(m.duration_multiplier(Some(10), None), 1.0);
    }

    #[test]
    fn multiplier_scales_then_floors() {
        let m = Matcher::default();
        let small = m.duration_multiplier(Some(200), Some(215));
        let large = m.duration_multiplier(Some(200), Some(230));
        assert!(small < 1.0);
        assert!(large < small);
        assert_eq!(m.duration_multiplier(Some(200), Some(900)), 0.5);
    }
}
