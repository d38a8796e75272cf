use std::{collections::HashMap, sync::Arc, time::Duration};

use indicatif::ProgressBar;
use playlist_master::matcher::Matcher;
use playlist_master::resolve::{self, ResolveOptions, Summary, TrackError};
use playlist_master::service::{ServiceError, TrackSearch};
use playlist_master::types::{ServiceTrack, TrackDescriptor, TrackMetadata, TrackRef};

enum Reply {
    Tracks(Vec<ServiceTrack>),
    RateLimited,
    Panic,
}

/// Search backed by canned replies keyed by query. Unknown queries return no
/// results.
#[derive(Default)]
struct FakeSearch {
    replies: HashMap<String, (u64, Reply)>,
}

impl FakeSearch {
    fn reply(mut self, query: &str, delay_ms: u64, reply: Reply) -> Self {
        self.replies.insert(query.to_string(), (delay_ms, reply));
        self
    }
}

impl TrackSearch for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<ServiceTrack>, ServiceError> {
        match self.replies.get(query) {
            Some((delay, reply)) => {
                tokio::time::sleep(Duration::from_millis(*delay)).await;
                match reply {
                    Reply::Tracks(tracks) => Ok(tracks.clone()),
                    Reply::RateLimited => Err(ServiceError::RateLimited { retry_after: 300 }),
                    Reply::Panic => panic!("search backend crashed on {}", query),
                }
            }
            None => Ok(Vec::new()),
        }
    }
}

fn spotify_track(title: &str, artist: &str) -> ServiceTrack {
    ServiceTrack {
        descriptor: TrackDescriptor::new(title, artist),
        reference: TrackRef::Spotify {
            uri: format!("spotify:track:{}", title.to_lowercase().replace(' ', "")),
        },
        metadata: None,
    }
}

fn video(id: &str, title: &str, artist: &str) -> ServiceTrack {
    ServiceTrack {
        descriptor: TrackDescriptor::new(title, artist),
        reference: TrackRef::YouTube {
            video_id: id.to_string(),
        },
        metadata: None,
    }
}

async fn run(
    tracks: Vec<ServiceTrack>,
    search: FakeSearch,
    concurrency: usize,
) -> Vec<resolve::TrackOutcome> {
    let options = ResolveOptions {
        concurrency,
        ..ResolveOptions::default()
    };
    resolve::resolve_tracks(tracks, Arc::new(search), options, ProgressBar::hidden()).await
}

#[tokio::test]
async fn test_outcomes_keep_source_order() {
    // the first track answers last
    let search = FakeSearch::default()
        .reply(
            "Queen Bohemian Rhapsody",
            80,
            Reply::Tracks(vec![video("a", "Bohemian Rhapsody", "Queen")]),
        )
        .reply(
            "Queen Somebody to Love",
            40,
            Reply::Tracks(vec![video("b", "Somebody to Love", "Queen")]),
        )
        .reply(
            "Queen Radio Ga Ga",
            0,
            Reply::Tracks(vec![video("c", "Radio Ga Ga", "Queen")]),
        );

    let tracks = vec![
        spotify_track("Bohemian Rhapsody", "Queen"),
        spotify_track("Somebody to Love", "Queen"),
        spotify_track("Radio Ga Ga", "Queen"),
    ];

    let outcomes = run(tracks, search, 3).await;

    let positions: Vec<usize> = outcomes.iter().map(|o| o.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    let ids: Vec<String> = outcomes
        .iter()
        .map(|o| o.matched().map(|t| t.reference.url()).unwrap_or_default())
        .collect();
    assert_eq!(
        ids,
        vec![
            "https://music.youtube.com/watch?v=a",
            "https://music.youtube.com/watch?v=b",
            "https://music.youtube.com/watch?v=c",
        ]
    );
}

#[tokio::test]
async fn test_single_failure_does_not_abort_run() {
    let search = FakeSearch::default()
        .reply(
            "ABBA Waterloo",
            0,
            Reply::Tracks(vec![video("w", "Waterloo", "ABBA")]),
        )
        .reply("ABBA SOS", 0, Reply::RateLimited)
        .reply(
            "ABBA Fernando",
            0,
            Reply::Tracks(vec![video("z", "zzzz", "qqqq")]),
        );

    let tracks = vec![
        spotify_track("Waterloo", "ABBA"),
        spotify_track("SOS", "ABBA"),
        spotify_track("", "ABBA"),
        spotify_track("Fernando", "ABBA"),
    ];

    let outcomes = run(tracks, search, 2).await;
    assert_eq!(outcomes.len(), 4);

    assert!(outcomes[0].matched().is_some());
    assert!(matches!(
        outcomes[1].result,
        Err(TrackError::Upstream(ServiceError::RateLimited { .. }))
    ));
    assert!(matches!(outcomes[2].result, Err(TrackError::InvalidInput(_))));
    match &outcomes[3].result {
        Ok(r) => assert!(!r.result.is_matched()),
        Err(e) => panic!("unexpected error: {}", e),
    }

    assert_eq!(
        resolve::summarize(&outcomes),
        Summary {
            matched: 1,
            unmatched: 1,
            failed: 2,
        }
    );
}

#[tokio::test]
async fn test_crashed_search_task_keeps_its_position() {
    let search = FakeSearch::default()
        .reply(
            "ABBA Waterloo",
            0,
            Reply::Tracks(vec![video("w", "Waterloo", "ABBA")]),
        )
        .reply("ABBA SOS", 0, Reply::Panic)
        .reply(
            "ABBA Fernando",
            20,
            Reply::Tracks(vec![video("f", "Fernando", "ABBA")]),
        );

    let tracks = vec![
        spotify_track("Waterloo", "ABBA"),
        spotify_track("SOS", "ABBA"),
        spotify_track("Fernando", "ABBA"),
    ];

    let outcomes = run(tracks, search, 2).await;

    assert_eq!(outcomes.len(), 3);
    let positions: Vec<usize> = outcomes.iter().map(|o| o.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    assert!(outcomes[0].matched().is_some());
    assert_eq!(outcomes[1].source.descriptor.title, "SOS");
    assert!(matches!(outcomes[1].result, Err(TrackError::Aborted(_))));
    assert!(outcomes[2].matched().is_some());

    assert_eq!(
        resolve::summarize(&outcomes),
        Summary {
            matched: 2,
            unmatched: 0,
            failed: 1,
        }
    );
}

#[tokio::test]
async fn test_matched_track_is_the_selected_candidate() {
    let search = FakeSearch::default().reply(
        "The Beatles Hey Jude",
        0,
        Reply::Tracks(vec![
            video("first", "Let It Be", "The Beatles"),
            video("second", "Hey Jude (Remastered)", "The Beatles"),
        ]),
    );

    let outcomes = run(vec![spotify_track("Hey Jude", "The Beatles")], search, 1).await;

    let matched = outcomes[0].matched().expect("matched");
    assert_eq!(
        matched.reference,
        TrackRef::YouTube {
            video_id: "second".to_string()
        }
    );
}

#[tokio::test]
async fn test_explicit_tracks_add_query_suffix() {
    let search = FakeSearch::default().reply(
        "Eminem Lose Yourself explicit",
        0,
        Reply::Tracks(vec![video("e", "Lose Yourself", "Eminem")]),
    );

    let mut track = spotify_track("Lose Yourself", "Eminem");
    track.metadata = Some(TrackMetadata {
        explicit: true,
        ..TrackMetadata::default()
    });

    let options = ResolveOptions {
        matcher: Matcher::default(),
        concurrency: 1,
        explicit_queries: true,
    };
    let outcomes = resolve::resolve_tracks(
        vec![track.clone()],
        Arc::new(search),
        options,
        ProgressBar::hidden(),
    )
    .await;
    assert!(outcomes[0].matched().is_some());

    // without the flag the plain query is used, which has no canned reply
    let search = FakeSearch::default().reply(
        "Eminem Lose Yourself explicit",
        0,
        Reply::Tracks(vec![video("e", "Lose Yourself", "Eminem")]),
    );
    let outcomes = run(vec![track], search, 1).await;
    assert!(outcomes[0].matched().is_none());
}

#[tokio::test]
async fn test_empty_playlist_resolves_to_nothing() {
    let outcomes = run(Vec::new(), FakeSearch::default(), 4).await;

    assert!(outcomes.is_empty());
    assert_eq!(resolve::summarize(&outcomes), Summary::default());
}
