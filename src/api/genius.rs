//! Genius API client and lyrics scraping.
//!
//! Song lookups go through the Genius API; lyrics come from the public song
//! page, since the API does not serve them.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream, Stream, StreamExt};
use lru::LruCache;
use md5::{Digest, Md5};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::converters;
use crate::emotion::lyrics::{compute_emotion_match_score, dominant_emotion, extract_emotional_keywords};
use crate::error::{EmoRecError, Result};
use crate::models::{GeniusSong, LyricsProfile};

/// Base URL for the Genius API.
const API_BASE_URL: &str = "https://api.genius.com";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(3);
const LYRICS_TIMEOUT: Duration = Duration::from_secs(5);

/// Wall-clock budget for a batch of lyrics profiles.
pub const PROFILE_BATCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Wall-clock budget for a batch of song searches.
pub const SEARCH_BATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Search hits and lyrics profiles kept per cache.
const CACHE_ENTRIES: usize = 2_000;

/// Marker attribute of the lyrics blocks on a Genius song page.
const LYRICS_CONTAINER: &str = "data-lyrics-container=\"true\"";

/// Genius API client.
#[derive(Debug, Clone)]
pub struct GeniusApi {
    client: Client,
    access_token: String,
    /// Search hits keyed by [`cache_key`].
    songs: Arc<Mutex<LruCache<String, GeniusSong>>>,
    /// Lyrics profiles keyed by [`cache_key`].
    profiles: Arc<Mutex<LruCache<String, LyricsProfile>>>,
}

impl GeniusApi {
    pub fn new(access_token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; emorec/0.1)")
            .build()
            .map_err(|e| EmoRecError::ApiError(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            access_token: access_token.to_string(),
            songs: Arc::new(Mutex::new(LruCache::new(cache_capacity()))),
            profiles: Arc::new(Mutex::new(LruCache::new(cache_capacity()))),
        })
    }

    /// Top Genius hit for a song, or `None` when nothing matches.
    pub async fn search_song(&self, song_name: &str, artist: &str) -> Result<Option<GeniusSong>> {
        let key = cache_key(song_name, artist);
        if let Some(song) = self.songs.lock().await.get(&key) {
            return Ok(Some(song.clone()));
        }

        let url = format!("{}/search", API_BASE_URL);
        let query = format!("{} {}", song_name, artist);
        debug!("GET {} q={}", url, query);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("q", query.as_str())])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Genius search returned {}", response.status());
            return Ok(None);
        }

        let data: Value = response.json().await?;
        let song = converters::parse_genius_hit(&data);
        if let Some(song) = &song {
            self.songs.lock().await.put(key, song.clone());
        }
        Ok(song)
    }

    /// Lyrics text of a Genius song page, `None` when the page has none.
    pub async fn fetch_lyrics(&self, song_url: &str) -> Result<Option<String>> {
        debug!("GET {}", song_url);
        let response = self
            .client
            .get(song_url)
            .timeout(LYRICS_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Lyrics page returned {}", response.status());
            return Ok(None);
        }

        let html = response.text().await?;
        Ok(extract_lyrics(&html))
    }

    /// Keyword profile of a song's lyrics, scored against `target` if given.
    pub async fn emotional_profile(
        &self,
        song_name: &str,
        artist: &str,
        target: Option<&str>,
    ) -> Result<Option<LyricsProfile>> {
        let key = cache_key(song_name, artist);
        if let Some(cached) = self.profiles.lock().await.get(&key) {
            return Ok(Some(rescore(cached.clone(), target)));
        }

        let Some(song) = self.search_song(song_name, artist).await? else {
            return Ok(None);
        };
        let Some(lyrics) = self.fetch_lyrics(&song.url).await? else {
            return Ok(None);
        };

        let profile = build_profile(&song, &lyrics, target);
        self.profiles.lock().await.put(key, profile.clone());
        Ok(Some(profile))
    }

    /// Profiles for many songs, keyed `"song|artist"`.
    ///
    /// At most `max_concurrent` lookups run at once; songs still pending
    /// when [`PROFILE_BATCH_TIMEOUT`] elapses are left out.
    pub async fn batch_emotional_profiles(
        &self,
        songs: &[(String, String)],
        target: Option<&str>,
        max_concurrent: usize,
    ) -> HashMap<String, LyricsProfile> {
        let lookups = stream::iter(songs.iter().cloned())
            .map(|(song, artist)| async move {
                match self.emotional_profile(&song, &artist, target).await {
                    Ok(profile) => profile.map(|p| (batch_key(&song, &artist), p)),
                    Err(e) => {
                        debug!("Could not get profile for {}: {}", song, e);
                        None
                    }
                }
            })
            .buffer_unordered(max_concurrent.max(1));

        let results = collect_within(lookups, PROFILE_BATCH_TIMEOUT, "emotional profile").await;
        info!("Got emotional profiles for {}/{} songs", results.len(), songs.len());
        results
    }

    /// Search hits for many songs, keyed `"song|artist"`.
    pub async fn batch_search_songs(
        &self,
        songs: &[(String, String)],
        max_concurrent: usize,
    ) -> HashMap<String, GeniusSong> {
        let lookups = stream::iter(songs.iter().cloned())
            .map(|(song, artist)| async move {
                match self.search_song(&song, &artist).await {
                    Ok(hit) => hit.map(|s| (batch_key(&song, &artist), s)),
                    Err(e) => {
                        debug!("Error searching Genius for {}: {}", song, e);
                        None
                    }
                }
            })
            .buffer_unordered(max_concurrent.max(1));

        collect_within(lookups, SEARCH_BATCH_TIMEOUT, "search").await
    }
}

fn cache_capacity() -> NonZeroUsize {
    NonZeroUsize::new(CACHE_ENTRIES).unwrap_or(NonZeroUsize::MIN)
}

/// Drain keyed lookups until the stream ends or `budget` runs out.
///
/// Lookups finished before the deadline are kept; the rest are dropped.
async fn collect_within<S, T>(lookups: S, budget: Duration, label: &str) -> HashMap<String, T>
where
    S: Stream<Item = Option<(String, T)>>,
{
    let mut results = HashMap::new();
    let mut lookups = std::pin::pin!(lookups);

    let collect = async {
        while let Some(item) = lookups.next().await {
            if let Some((key, value)) = item {
                results.insert(key, value);
            }
        }
    };
    let finished = tokio::time::timeout(budget, collect).await.is_ok();

    if !finished {
        warn!(
            "Batch {} timed out after {:?}, keeping {} results",
            label,
            budget,
            results.len()
        );
    }
    results
}

/// Key used in batch results.
pub fn batch_key(song_name: &str, artist: &str) -> String {
    format!("{}|{}", song_name, artist)
}

/// Hex MD5 of `"song|artist"`.
pub fn cache_key(song_name: &str, artist: &str) -> String {
    md5_hex(&batch_key(song_name, artist))
}

fn md5_hex(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}

fn build_profile(song: &GeniusSong, lyrics: &str, target: Option<&str>) -> LyricsProfile {
    let keywords = extract_emotional_keywords(lyrics);
    let profile = LyricsProfile {
        song_id: song.song_id,
        genius_url: song.url.clone(),
        dominant_emotion: dominant_emotion(&keywords),
        emotional_keywords: keywords,
        emotion_match_score: 0.0,
        word_count: lyrics.split_whitespace().count(),
        has_lyrics: true,
    };
    rescore(profile, target)
}

fn rescore(mut profile: LyricsProfile, target: Option<&str>) -> LyricsProfile {
    profile.emotion_match_score = target
        .map(|t| compute_emotion_match_score(&profile.emotional_keywords, t))
        .unwrap_or(0.0);
    profile
}

/// Plain lyrics from a Genius song page.
///
/// Every lyrics container is extracted, `<br>` becomes a newline, other
/// tags are dropped and `[Verse]`-style section headers removed.
pub fn extract_lyrics(html: &str) -> Option<String> {
    let mut blocks = Vec::new();
    let mut rest = html;

    while let Some(marker) = rest.find(LYRICS_CONTAINER) {
        let after_marker = &rest[marker..];
        let Some(open_end) = after_marker.find('>') else {
            break;
        };
        let body = &after_marker[open_end + 1..];
        let (inner, remaining) = split_div(body);
        blocks.push(html_to_text(inner));
        rest = remaining;
    }

    let lines: Vec<String> = blocks
        .join("\n")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !(l.starts_with('[') && l.ends_with(']')))
        .map(|l| l.to_string())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Split `body` at the `</div>` closing an already opened div.
fn split_div(body: &str) -> (&str, &str) {
    let mut depth = 1usize;
    let mut pos = 0;

    loop {
        let open = body[pos..].find("<div").map(|i| i + pos);
        let close = body[pos..].find("</div").map(|i| i + pos);
        match (open, close) {
            (Some(o), Some(c)) if o < c => {
                depth += 1;
                pos = o + 4;
            }
            (_, Some(c)) => {
                depth -= 1;
                if depth == 0 {
                    return (&body[..c], &body[c..]);
                }
                pos = c + 5;
            }
            _ => return (body, ""),
        }
    }
}

/// Strip tags and decode common entities; `<br>` becomes a newline.
fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut chars = html.chars();

    while let Some(c) = chars.next() {
        if c != '<' {
            text.push(c);
            continue;
        }
        let tag: String = chars.by_ref().take_while(|c| *c != '>').collect();
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");
        if name.eq_ignore_ascii_case("br") {
            text.push('\n');
        }
    }

    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_md5_of_song_and_artist() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(cache_key("Yellow", "Coldplay"), md5_hex("Yellow|Coldplay"));
        assert_ne!(cache_key("Yellow", "Coldplay"), cache_key("Coldplay", "Yellow"));
    }

    #[test]
    fn test_extract_lyrics_from_page() {
        let html = r#"<html><body>
            <div class="x" data-lyrics-container="true">[Verse 1]<br/>I&#x27;m so <a href="/a"><span>happy</span></a> today<br>Sun is <i>bright</i>
            <div class="ad">ad</div></div>
            <div>not lyrics</div>
            <div data-lyrics-container="true">[Chorus]<br/>Rock &amp; roll</div>
        </body></html>"#;

        let lyrics = extract_lyrics(html).unwrap();
        assert_eq!(lyrics, "I'm so happy today\nSun is bright\nad\nRock & roll");
    }

    #[test]
    fn test_extract_lyrics_without_container() {
        assert!(extract_lyrics("<div>nothing here</div>").is_none());
        assert!(extract_lyrics(r#"<div data-lyrics-container="true">[Instrumental]</div>"#).is_none());
    }

    #[test]
    fn test_build_profile_scores_target() {
        let song = GeniusSong {
            song_id: 1,
            title: "Test".to_string(),
            artist: "Band".to_string(),
            url: "https://genius.com/test".to_string(),
        };
        let profile = build_profile(&song, "cry cry tears alone", Some("sad"));
        assert!(profile.has_lyrics);
        assert_eq!(profile.word_count, 4);
        assert_eq!(profile.dominant_emotion.as_deref(), Some("sad"));
        assert!(profile.emotion_match_score > 0.0);

        let unscored = rescore(profile, None);
        assert_eq!(unscored.emotion_match_score, 0.0);
    }

    #[test]
    fn test_batch_budgets() {
        assert_eq!(PROFILE_BATCH_TIMEOUT, Duration::from_secs(15));
        assert_eq!(SEARCH_BATCH_TIMEOUT, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_collect_within_keeps_finished_lookups() {
        let lookups = stream::iter(vec![("quick", 0u64), ("missing", 0), ("slow", 5_000)])
            .map(|(name, delay_ms)| async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                (name != "missing").then(|| (name.to_string(), delay_ms))
            })
            .buffer_unordered(3);

        let results = collect_within(lookups, Duration::from_millis(200), "test").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results.get("quick"), Some(&0));
    }

    #[tokio::test]
    async fn test_collect_within_drains_everything_in_time() {
        let lookups = stream::iter(["a", "b", "c"])
            .map(|name| async move { Some((name.to_string(), name.len())) })
            .buffer_unordered(2);

        let results = collect_within(lookups, Duration::from_secs(1), "test").await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_caches_are_bounded() {
        let api = GeniusApi::new("token").unwrap();
        assert_eq!(api.songs.lock().await.cap().get(), CACHE_ENTRIES);
        assert_eq!(api.profiles.lock().await.cap().get(), CACHE_ENTRIES);
    }
}
