use playlist_master::matcher::{self, MatchError, Matcher};
use playlist_master::types::{MatchResult, TrackDescriptor};

fn track(title: &str, artist: &str, duration: u32) -> TrackDescriptor {
    TrackDescriptor::new(title, artist).with_duration(duration)
}

#[test]
fn test_identical_candidate_scores_one() {
    let source = track("Hey Jude", "The Beatles", 431);
    let candidates = vec![track("HEY JUDE", "the beatles", 431)];

    let result = matcher::match_track(&source, &candidates).unwrap();

    assert_eq!(result.index(), Some(0));
    assert_eq!(result.score(), 1.0);
}

#[test]
fn test_empty_candidates_is_no_match() {
    let source = track("Hey Jude", "The Beatles", 431);

    let result = matcher::match_track(&source, &[]).unwrap();

    assert_eq!(result, MatchResult::NoMatch { best_score: 0.0 });
}

#[test]
fn test_unrelated_candidates_are_rejected() {
    let source = track("Hey Jude", "The Beatles", 431);
    let candidates = vec![track("zzzz", "qqqq", 431), track("xxx", "zzz", 100)];

    let result = matcher::match_track(&source, &candidates).unwrap();

    assert!(!result.is_matched());
    assert!(result.score() < matcher::DEFAULT_THRESHOLD);
    assert_eq!(result.candidate(), None);
}

#[test]
fn test_same_artist_different_song_is_no_match() {
    let source = track("Hey Jude", "The Beatles", 431);

    for title in ["Let It Be", "Hey Bulldog", "Yesterday"] {
        let candidates = vec![track(title, "The Beatles", 431)];

        let result = matcher::match_track(&source, &candidates).unwrap();

        assert!(!result.is_matched(), "{} accepted for Hey Jude", title);
        assert!(result.score() < matcher::DEFAULT_THRESHOLD);
    }
}

#[test]
fn test_threshold_decides_acceptance() {
    let source = TrackDescriptor::new("Hey Jude", "The Beatles");
    let candidates = vec![TrackDescriptor::new("Hey Jude (Live)", "The Beatles")];

    let default = Matcher::default().match_track(&source, &candidates).unwrap();
    assert!(default.is_matched());

    let strict = Matcher::with_threshold(0.95)
        .match_track(&source, &candidates)
        .unwrap();
    assert!(!strict.is_matched());
    assert_eq!(strict.score(), default.score());

    let wrong_song = vec![TrackDescriptor::new("Let It Be", "The Beatles")];
    let lenient = Matcher::with_threshold(0.3)
        .match_track(&source, &wrong_song)
        .unwrap();
    assert!(lenient.is_matched());
    assert_eq!(lenient.score(), 0.4);
}

#[test]
fn test_tie_goes_to_earliest_candidate() {
    let source = track("Yesterday", "The Beatles", 125);
    let candidates = vec![
        track("Yesterday", "Beatles", 125),
        track("Yesterday", "Beatles", 125),
        track("Yesterday", "Beatles", 125),
    ];

    let result = matcher::match_track(&source, &candidates).unwrap();

    assert_eq!(result.index(), Some(0));
}

#[test]
fn test_hey_jude_prefers_exact_title_over_remastered() {
    let source = track("Hey Jude", "The Beatles", 431);
    let candidates = vec![
        track("hey jude", "beatles", 430),
        track("Hey Jude (Remastered)", "The Beatles", 431),
    ];

    let result = matcher::match_track(&source, &candidates).unwrap();

    match result {
        MatchResult::Matched {
            index,
            candidate,
            score,
        } => {
            assert_eq!(index, 0);
            assert_eq!(candidate, candidates[0]);
            assert!(score > 0.9);
        }
        MatchResult::NoMatch { best_score } => panic!("no match, best score {}", best_score),
    }
}

#[test]
fn test_duration_penalty_is_bounded() {
    let m = Matcher::default();
    let source = track("Hey Jude", "The Beatles", 431);

    for candidate in [
        track("Hey Jude", "The Beatles", 431),
        track("Hey Jude (Live)", "Beatles", 200),
        track("Hey Jude", "Wilson Pickett", 2000),
    ] {
        let text_only = m.score(
            &TrackDescriptor::new(&source.title, &source.artist),
            &TrackDescriptor::new(&candidate.title, &candidate.artist),
        );
        let full = m.score(&source, &candidate);

        assert!(full <= text_only);
        assert!(full >= text_only * 0.5);
    }

    let far = m.score(&source, &track("Hey Jude", "The Beatles", 5000));
    assert_eq!(far, 0.5);
}

#[test]
fn test_missing_duration_does_not_penalize() {
    let m = Matcher::default();
    let source = TrackDescriptor::new("Hey Jude", "The Beatles");
    let candidate = track("Hey Jude", "The Beatles", 3000);

    assert_eq!(m.score(&source, &candidate), 1.0);
}

#[test]
fn test_matching_is_idempotent() {
    let source = track("Hey Jude", "The Beatles", 431);
    let candidates = vec![
        track("hey jude", "beatles", 430),
        track("Hey Jude (Remastered)", "The Beatles", 431),
        track("Jude", "Someone Else", 180),
    ];

    let first = matcher::match_track(&source, &candidates).unwrap();
    let second = matcher::match_track(&source, &candidates).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_empty_title_is_invalid_input() {
    let source = TrackDescriptor::new("   ", "The Beatles");
    let candidates = vec![TrackDescriptor::new("Hey Jude", "The Beatles")];

    let err = matcher::match_track(&source, &candidates).unwrap_err();

    assert!(matches!(err, MatchError::InvalidInput(_)));
}

#[test]
fn test_album_does_not_influence_score() {
    let m = Matcher::default();
    let source = TrackDescriptor::new("Hey Jude", "The Beatles").with_album("Past Masters");
    let candidate = TrackDescriptor::new("Hey Jude", "The Beatles").with_album("1");

    assert_eq!(m.score(&source, &candidate), 1.0);
}

#[test]
fn test_non_finite_threshold_uses_default() {
    assert_eq!(
        Matcher::with_threshold(f64::NAN).threshold,
        matcher::DEFAULT_THRESHOLD
    );
    assert_eq!(
        Matcher::with_threshold(f64::INFINITY).threshold,
        matcher::DEFAULT_THRESHOLD
    );

    let source = TrackDescriptor::new("Hey Jude", "The Beatles");
    let candidates = vec![TrackDescriptor::new("Let It Be", "The Beatles")];
    let result = Matcher::with_threshold(f64::NAN)
        .match_track(&source, &candidates)
        .unwrap();
    assert!(!result.is_matched());
}
