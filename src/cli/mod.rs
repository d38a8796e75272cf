//! # CLI Module
//!
//! User-facing commands. Each command builds its clients from the resolved
//! [`Settings`](crate::config::Settings), reports progress on the terminal and
//! keeps going when single tracks fail; only errors affecting the whole run
//! (unreadable source playlist, missing credentials) end the process.
//!
//! - [`download`] - download a Spotify or YouTube Music playlist as tagged audio
//!   files
//! - [`convert`] - recreate a YouTube Music playlist on Spotify
//! - [`auth`] - authorize playlist-master to edit the user's Spotify playlists

mod auth;
mod convert;
mod download;

pub use auth::auth;
pub use convert::convert;
pub use download::download;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    info,
    resolve::{self, TrackOutcome},
    types::{TrackDescriptor, TrackTableRow},
    utils, warning,
};

const TABLE_TEXT_WIDTH: usize = 40;

fn progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .progress_chars("=> "),
    );
    pb
}

fn table_rows(outcomes: &[TrackOutcome]) -> Vec<TrackTableRow> {
    outcomes
        .iter()
        .map(|o| {
            let source = &o.source.descriptor;
            let (matched, score, status) = match &o.result {
                Ok(r) => match &r.matched {
                    Some(m) => (
                        format!("{} - {}", m.descriptor.artist, m.descriptor.title),
                        format!("{:.2}", r.result.score()),
                        "matched".to_string(),
                    ),
                    None => (
                        String::new(),
                        format!("{:.2}", r.result.score()),
                        "no match".to_string(),
                    ),
                },
                Err(e) => (String::new(), String::new(), format!("failed: {}", e)),
            };

            TrackTableRow {
                matched: utils::ellipsize(&matched, TABLE_TEXT_WIDTH),
                score,
                status: utils::ellipsize(&status, TABLE_TEXT_WIDTH),
                ..track_row(o.position, source)
            }
        })
        .collect()
}

/// Row showing only the source track; match columns are left empty.
fn track_row(position: usize, track: &TrackDescriptor) -> TrackTableRow {
    TrackTableRow {
        position: position + 1,
        title: utils::ellipsize(&track.title, TABLE_TEXT_WIDTH),
        artist: utils::ellipsize(&track.artist, TABLE_TEXT_WIDTH),
        matched: String::new(),
        score: String::new(),
        status: String::new(),
    }
}

/// Logs every track that did not make it and the totals.
fn report_unconverted(outcomes: &[TrackOutcome]) {
    for outcome in outcomes {
        let track = &outcome.source.descriptor;
        match &outcome.result {
            Ok(r) if !r.result.is_matched() => warning!(
                "no match for {} - {} (best score {:.2})",
                track.artist,
                track.title,
                r.result.score()
            ),
            Err(e) => warning!("unable to convert {} - {}: {}", track.artist, track.title, e),
            Ok(_) => {}
        }
    }

    let summary = resolve::summarize(outcomes);
    info!(
        "{} matched, {} without match, {} failed",
        summary.matched, summary.unmatched, summary.failed
    );
}

fn print_table(rows: Vec<TrackTableRow>) {
    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
}
