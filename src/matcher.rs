//! Picks the search result that best matches a playlist track.
//!
//! The provider's rank order is significant: candidates are never re-sorted,
//! and only the first two playable results are considered when choosing
//! between a song and a video.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Candidate, Track};
use crate::youtube::SearchProvider;

/// `"<all artists> <track name>"`.
pub fn primary_query(track: &Track) -> String {
    format!("{} {}", track.artists.join(" "), track.name)
        .trim()
        .to_string()
}

/// `"<first artist> <track name>"`, used when the primary query finds nothing.
pub fn fallback_query(track: &Track) -> Option<String> {
    track
        .primary_artist()
        .map(|artist| format!("{} {}", artist, track.name).trim().to_string())
}

/// Searches for `track` and selects the best candidate.
///
/// A second, narrower query is issued only when the first one returns no
/// results at all.
pub async fn resolve(track: &Track, search: &dyn SearchProvider) -> Result<Candidate> {
    let mut candidates = search.search(&primary_query(track)).await?;

    if candidates.is_empty() {
        if let Some(query) = fallback_query(track) {
            debug!("No results for {}, retrying with \"{query}\"", track.name);
            candidates = search.search(&query).await?;
        }
    }

    let candidate = select_best_match(track, candidates)?;
    debug!("Matched {} to {}", track.name, candidate.id);
    Ok(candidate)
}

/// Which of the playable candidates the policy picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Only,
    Song(usize),
    /// Neither of the first two results is a song; the first is used anyway.
    FirstWithoutSong,
}

fn choose(playable: &[Candidate]) -> Option<Choice> {
    match playable {
        [] => None,
        [_] => Some(Choice::Only),
        [first, ..] if first.is_song() => Some(Choice::Song(0)),
        [_, second, ..] if second.is_song() => Some(Choice::Song(1)),
        _ => Some(Choice::FirstWithoutSong),
    }
}

/// Applies the selection policy to an already fetched candidate list.
pub fn select_best_match(track: &Track, candidates: Vec<Candidate>) -> Result<Candidate> {
    let mut playable: Vec<Candidate> = candidates
        .into_iter()
        .filter(Candidate::is_playable)
        .collect();

    let index = match choose(&playable) {
        None => return Err(Error::NoMatch(track.name.clone())),
        Some(Choice::Only) => 0,
        Some(Choice::Song(index)) => index,
        Some(Choice::FirstWithoutSong) => {
            warn!("Warning! No song found for spotify track {}", track.name);
            0
        }
    };
    Ok(playable.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CandidateKind;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn track(name: &str, artists: &[&str]) -> Track {
        Track {
            uri: format!("spotify:track:{name}"),
            name: name.to_string(),
            artists: artists.iter().map(|a| a.to_string()).collect(),
            album: "Album".to_string(),
            cover_url: None,
        }
    }

    fn song(id: &str) -> Candidate {
        Candidate::new(id, CandidateKind::Song, id)
    }

    fn video(id: &str) -> Candidate {
        Candidate::new(id, CandidateKind::Video, id)
    }

    fn other(id: &str) -> Candidate {
        Candidate::new(id, CandidateKind::Other, id)
    }

    #[derive(Default)]
    struct ScriptedSearch {
        results: HashMap<String, Vec<Candidate>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedSearch {
        fn with(mut self, query: &str, results: Vec<Candidate>) -> Self {
            self.results.insert(query.to_string(), results);
            self
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedSearch {
        async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.results.get(query).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn queries_join_all_artists_then_first_only() {
        let t = track("Song A", &["Artist X", "Artist Y"]);
        assert_eq!(primary_query(&t), "Artist X Artist Y Song A");
        assert_eq!(fallback_query(&t).as_deref(), Some("Artist X Song A"));
        assert_eq!(fallback_query(&track("Solo", &[])), None);
    }

    #[test]
    fn song_in_first_position_wins() {
        let t = track("Song A", &["Artist X", "Artist Y"]);
        let picked = select_best_match(&t, vec![song("s"), video("v")]).unwrap();
        assert_eq!(picked.id, "s");
    }

    #[test]
    fn song_in_second_position_wins_over_leading_video() {
        let t = track("Song A", &["Artist X", "Artist Y"]);
        let picked = select_best_match(&t, vec![video("v"), song("s")]).unwrap();
        assert_eq!(picked.id, "s");
    }

    #[test]
    fn song_beyond_second_position_falls_back_to_first() {
        let t = track("Song A", &["Artist X"]);
        let candidates = vec![video("v1"), video("v2"), song("s")];
        assert_eq!(choose(&candidates), Some(Choice::FirstWithoutSong));

        let picked = select_best_match(&t, candidates).unwrap();
        assert_eq!(picked.id, "v1");
    }

    #[test]
    fn choice_reports_which_rule_applied() {
        assert_eq!(choose(&[]), None);
        assert_eq!(choose(&[video("v")]), Some(Choice::Only));
        assert_eq!(choose(&[song("s"), song("t")]), Some(Choice::Song(0)));
        assert_eq!(choose(&[video("v"), song("s")]), Some(Choice::Song(1)));
    }

    #[test]
    fn non_playable_results_are_ignored_before_ranking() {
        let t = track("Song A", &["Artist X"]);
        let picked =
            select_best_match(&t, vec![other("album"), video("v"), other("artist"), song("s")])
                .unwrap();
        assert_eq!(picked.id, "s");

        let single = select_best_match(&t, vec![other("album"), video("v")]).unwrap();
        assert_eq!(single.id, "v");
    }

    #[test]
    fn no_playable_results_is_no_match() {
        let t = track("Song A", &["Artist X"]);
        let err = select_best_match(&t, vec![other("album")]).unwrap_err();
        assert!(matches!(err, Error::NoMatch(name) if name == "Song A"));
    }

    #[tokio::test]
    async fn empty_primary_results_issue_one_fallback_query() {
        let t = track("Song A", &["Artist X", "Artist Y"]);
        let search = ScriptedSearch::default().with("Artist X Song A", vec![song("s")]);

        let picked = resolve(&t, &search).await.unwrap();

        assert_eq!(picked.id, "s");
        assert_eq!(
            search.queries(),
            vec!["Artist X Artist Y Song A", "Artist X Song A"]
        );
    }

    #[tokio::test]
    async fn fallback_without_playable_results_fails() {
        let t = track("Song A", &["Artist X", "Artist Y"]);
        let search = ScriptedSearch::default().with("Artist X Song A", vec![other("artist")]);

        let err = resolve(&t, &search).await.unwrap_err();

        assert!(matches!(err, Error::NoMatch(_)));
        assert_eq!(search.queries().len(), 2);
    }

    #[tokio::test]
    async fn non_empty_primary_results_skip_fallback() {
        let t = track("Song A", &["Artist X", "Artist Y"]);
        let search =
            ScriptedSearch::default().with("Artist X Artist Y Song A", vec![other("artist")]);

        let err = resolve(&t, &search).await.unwrap_err();

        assert!(matches!(err, Error::NoMatch(_)));
        assert_eq!(search.queries(), vec!["Artist X Artist Y Song A"]);
    }
}
