//! Spotify Web API client.
//!
//! Authenticates with the client-credentials flow and exposes the catalogue
//! lookups the playlist generator and the proxy endpoints need.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::converters;
use crate::error::{EmoRecError, Result};
use crate::models::{SpotifyArtistInfo, SpotifyTrackInfo};

/// Base URL for the Spotify Web API.
const API_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Client-credentials token endpoint.
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens are refreshed this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Largest page Spotify returns for search and album listings.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Most track IDs accepted by one `tracks` request.
const TRACK_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Spotify API client.
///
/// Cloning is cheap; clones share the HTTP connection pool and the cached
/// access token.
#[derive(Debug, Clone)]
pub struct SpotifyApi {
    client: Client,
    client_id: String,
    client_secret: String,
    market: String,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl SpotifyApi {
    /// Create a client for the given application credentials.
    ///
    /// No request is made until the first lookup.
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| EmoRecError::ApiError(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            market: "US".to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Set the default market for top-track lookups.
    pub fn with_market(mut self, market: &str) -> Self {
        self.market = market.to_string();
        self
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    /// Current access token, fetching a new one when needed.
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let status = response.status();
        let data: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = data
                .get("error_description")
                .or_else(|| data.get("error"))
                .and_then(|m| m.as_str())
                .unwrap_or("Token request rejected");
            error!("Spotify token request failed ({}): {}", status, message);
            return Err(EmoRecError::SpotifyAuth(message.to_string()));
        }

        let value = data
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| EmoRecError::SpotifyAuth("Token response without access_token".to_string()))?
            .to_string();
        let expires_in = data.get("expires_in").and_then(|e| e.as_u64()).unwrap_or(3600);

        info!("Spotify access token acquired (expires in {}s)", expires_in);
        *slot = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        });
        Ok(value)
    }

    /// Make an authenticated GET request to the Web API.
    async fn get_api(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let token = self.access_token().await?;
        let url = format!("{}{}", API_BASE_URL, endpoint);
        debug!("GET {} with params: {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            self.token.write().await.take();
        }
        check_status(status, &body, endpoint)?;

        Ok(serde_json::from_str(&body)?)
    }

    /// Best match for a song, optionally narrowed by artist.
    pub async fn search_track(
        &self,
        song_name: &str,
        artist: Option<&str>,
    ) -> Result<Option<SpotifyTrackInfo>> {
        let query = track_query(song_name, artist);
        let track = self.search_tracks(&query, 1).await?.into_iter().next();
        if track.is_none() {
            info!("No track found for: {}", query);
        }
        Ok(track)
    }

    /// Search tracks with a raw Spotify query.
    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<SpotifyTrackInfo>> {
        let data = self
            .get_api(
                "search",
                &[
                    ("q", query.to_string()),
                    ("type", "track".to_string()),
                    ("limit", clamp_limit(limit).to_string()),
                ],
            )
            .await?;
        Ok(converters::parse_search_tracks(&data))
    }

    /// Get a track by ID.
    pub async fn get_track(&self, track_id: &str) -> Result<SpotifyTrackInfo> {
        let track_id = check_spotify_id(track_id)?;
        let data = self.get_api(&format!("tracks/{}", track_id), &[]).await?;
        converters::parse_track(&data)
    }

    /// Get several tracks, in batches. Unknown IDs are skipped.
    pub async fn get_tracks(&self, track_ids: &[String]) -> Result<Vec<SpotifyTrackInfo>> {
        for id in track_ids {
            check_spotify_id(id)?;
        }

        let mut tracks = Vec::with_capacity(track_ids.len());
        for batch in track_ids.chunks(TRACK_BATCH_SIZE) {
            let data = self
                .get_api("tracks", &[("ids", batch.join(","))])
                .await?;
            if let Some(items) = data.get("tracks").and_then(|t| t.as_array()) {
                tracks.extend(
                    items
                        .iter()
                        .filter(|t| !t.is_null())
                        .filter_map(|t| converters::parse_track(t).ok()),
                );
            }
        }
        Ok(tracks)
    }

    /// Run several searches and merge the results, first occurrence wins.
    ///
    /// A failing query is logged and skipped.
    pub async fn search_by_multiple_queries(
        &self,
        queries: &[String],
        limit_per_query: u32,
    ) -> Vec<SpotifyTrackInfo> {
        let mut seen = std::collections::HashSet::new();
        let mut tracks = Vec::new();

        for query in queries {
            match self.search_tracks(query, limit_per_query).await {
                Ok(found) => {
                    for track in found {
                        if seen.insert(track.spotify_id.clone()) {
                            tracks.push(track);
                        }
                    }
                }
                Err(e) => warn!("Search query '{}' failed: {}", query, e),
            }
        }

        info!("Found {} unique tracks from {} queries", tracks.len(), queries.len());
        tracks
    }

    /// Search artists by name.
    pub async fn search_artists(&self, query: &str, limit: u32) -> Result<Vec<SpotifyArtistInfo>> {
        let data = self
            .get_api(
                "search",
                &[
                    ("q", query.to_string()),
                    ("type", "artist".to_string()),
                    ("limit", clamp_limit(limit).to_string()),
                ],
            )
            .await?;
        Ok(converters::parse_search_artists(&data))
    }

    /// Get an artist by ID.
    pub async fn get_artist(&self, artist_id: &str) -> Result<SpotifyArtistInfo> {
        let artist_id = check_spotify_id(artist_id)?;
        let data = self.get_api(&format!("artists/{}", artist_id), &[]).await?;
        converters::parse_artist(&data)
    }

    /// An artist's most popular tracks in `market`.
    pub async fn get_artist_top_tracks(
        &self,
        artist_id: &str,
        market: &str,
    ) -> Result<Vec<SpotifyTrackInfo>> {
        let artist_id = check_spotify_id(artist_id)?;
        let data = self
            .get_api(
                &format!("artists/{}/top-tracks", artist_id),
                &[("market", market.to_string())],
            )
            .await?;

        Ok(data
            .get("tracks")
            .and_then(|t| t.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|t| converters::parse_track(t).ok())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Album IDs matching a query.
    pub async fn search_albums(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        let data = self
            .get_api(
                "search",
                &[
                    ("q", query.to_string()),
                    ("type", "album".to_string()),
                    ("limit", clamp_limit(limit).to_string()),
                ],
            )
            .await?;
        let ids = converters::parse_search_album_ids(&data);
        info!("Found {} albums for query: {}", ids.len(), query);
        Ok(ids)
    }

    /// Full track objects for every track on an album.
    pub async fn get_album_tracks(&self, album_id: &str) -> Result<Vec<SpotifyTrackInfo>> {
        let album_id = check_spotify_id(album_id)?;
        let data = self
            .get_api(
                &format!("albums/{}/tracks", album_id),
                &[("limit", MAX_PAGE_SIZE.to_string())],
            )
            .await?;

        // album listings hold simplified tracks without album or popularity
        let ids: Vec<String> = data
            .get("items")
            .and_then(|i| i.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|t| t.get("id").and_then(|id| id.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        let tracks = self.get_tracks(&ids).await?;
        info!("Got {} tracks from album {}", tracks.len(), album_id);
        Ok(tracks)
    }
}

/// Field-filtered query for a song and optional artist.
pub fn track_query(song_name: &str, artist: Option<&str>) -> String {
    match artist.map(str::trim).filter(|a| !a.is_empty()) {
        Some(artist) => format!("track:{} artist:{}", song_name.trim(), artist),
        None => format!("track:{}", song_name.trim()),
    }
}

/// Spotify IDs are base62; anything else never reaches a request path.
pub fn check_spotify_id(id: &str) -> Result<&str> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(EmoRecError::InvalidRequest(format!("Invalid Spotify ID: {:?}", id)));
    }
    Ok(id)
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_SIZE)
}

/// Map a non-success Web API response to an error.
fn check_status(status: StatusCode, body: &str, endpoint: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|data| {
            data.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED => Err(EmoRecError::SpotifyAuth(message)),
        StatusCode::NOT_FOUND => Err(EmoRecError::NotFound(endpoint.to_string())),
        StatusCode::TOO_MANY_REQUESTS => Err(EmoRecError::QuotaExceeded),
        _ => {
            error!("Spotify API error ({}): {}", status, message);
            Err(EmoRecError::ApiError(message))
        }
    }
}
