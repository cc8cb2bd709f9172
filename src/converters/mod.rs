//! JSON to model converters.
//!
//! This module provides functions to convert raw Spotify and Genius API
//! JSON responses into typed model structures.

use serde_json::Value;

use crate::error::{EmoRecError, Result};
use crate::models::{GeniusSong, SpotifyArtistInfo, SpotifyTrackInfo};

/// Get string from JSON, returning empty string if not found.
fn get_str(json: &Value, key: &str) -> String {
    json.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Get optional non-empty string from JSON.
fn get_opt_str(json: &Value, key: &str) -> Option<String> {
    json.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Get u32 from JSON.
fn get_u32(json: &Value, key: &str) -> u32 {
    json.get(key).and_then(|v| v.as_u64()).unwrap_or(0) as u32
}

/// Get u64 from JSON.
fn get_u64(json: &Value, key: &str) -> u64 {
    json.get(key).and_then(|v| v.as_u64()).unwrap_or(0)
}

/// Spotify link from an `external_urls` object.
fn spotify_url(json: &Value) -> String {
    json.get("external_urls")
        .and_then(|u| u.get("spotify"))
        .and_then(|s| s.as_str())
        .unwrap_or("")
        .to_string()
}

/// URL of the first (largest) image in an `images` array.
pub fn first_image(json: &Value) -> Option<String> {
    json.get("images")
        .and_then(|i| i.as_array())
        .and_then(|arr| arr.first())
        .and_then(|img| get_opt_str(img, "url"))
}

/// Artist names of a track, in credit order.
fn artist_names(json: &Value) -> Vec<String> {
    json.get("artists")
        .and_then(|a| a.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|a| a.get("name").and_then(|n| n.as_str()))
                .map(|n| n.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a Spotify track object.
pub fn parse_track(json: &Value) -> Result<SpotifyTrackInfo> {
    let spotify_id = get_opt_str(json, "id")
        .ok_or_else(|| EmoRecError::ApiError("Track object without id".to_string()))?;

    let album = json.get("album").cloned().unwrap_or(Value::Null);
    let artists = artist_names(json);

    Ok(SpotifyTrackInfo {
        spotify_id,
        song_name: get_str(json, "name"),
        artist: artists.join(", "),
        artists,
        album: get_str(&album, "name"),
        preview_url: get_opt_str(json, "preview_url"),
        external_url: spotify_url(json),
        duration_ms: get_u64(json, "duration_ms"),
        popularity: get_u32(json, "popularity"),
        album_image: first_image(&album),
    })
}

/// Parse a Spotify artist object.
pub fn parse_artist(json: &Value) -> Result<SpotifyArtistInfo> {
    let spotify_id = get_opt_str(json, "id")
        .ok_or_else(|| EmoRecError::ApiError("Artist object without id".to_string()))?;

    let genres = json
        .get("genres")
        .and_then(|g| g.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|g| g.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(SpotifyArtistInfo {
        spotify_id,
        name: get_str(json, "name"),
        genres,
        popularity: get_u32(json, "popularity"),
        image_url: first_image(json),
        external_url: spotify_url(json),
    })
}

/// Parse every track in a `{"<kind>s": {"items": [...]}}` search page.
///
/// Items that fail to parse (or are `null`) are skipped.
pub fn parse_search_tracks(json: &Value) -> Vec<SpotifyTrackInfo> {
    search_items(json, "tracks")
        .iter()
        .filter(|t| !t.is_null())
        .filter_map(|t| parse_track(t).ok())
        .collect()
}

/// Parse every artist in a search page.
pub fn parse_search_artists(json: &Value) -> Vec<SpotifyArtistInfo> {
    search_items(json, "artists")
        .iter()
        .filter(|a| !a.is_null())
        .filter_map(|a| parse_artist(a).ok())
        .collect()
}

/// Album IDs in an album search page.
pub fn parse_search_album_ids(json: &Value) -> Vec<String> {
    search_items(json, "albums")
        .iter()
        .filter_map(|a| get_opt_str(a, "id"))
        .collect()
}

fn search_items<'a>(json: &'a Value, kind: &str) -> &'a [Value] {
    json.get(kind)
        .and_then(|k| k.get("items"))
        .and_then(|i| i.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Parse the first hit of a Genius `/search` response.
pub fn parse_genius_hit(json: &Value) -> Option<GeniusSong> {
    let result = json
        .get("response")?
        .get("hits")?
        .as_array()?
        .first()?
        .get("result")?;

    Some(GeniusSong {
        song_id: get_u64(result, "id"),
        title: get_str(result, "title"),
        artist: result
            .get("primary_artist")
            .map(|a| get_str(a, "name"))
            .unwrap_or_default(),
        url: get_opt_str(result, "url")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn track_json() -> Value {
        json!({
            "id": "3n3Ppam7vgaVa1iaRUc9Lp",
            "name": "Mr. Brightside",
            "artists": [{"name": "The Killers"}, {"name": "Guest"}],
            "album": {
                "name": "Hot Fuss",
                "images": [{"url": "https://i.scdn.co/image/large"}, {"url": "https://i.scdn.co/image/small"}]
            },
            "preview_url": null,
            "external_urls": {"spotify": "https://open.spotify.com/track/3n3Ppam7vgaVa1iaRUc9Lp"},
            "duration_ms": 222075,
            "popularity": 86
        })
    }

    #[test]
    fn test_parse_track() {
        let track = parse_track(&track_json()).unwrap();
        assert_eq!(track.spotify_id, "3n3Ppam7vgaVa1iaRUc9Lp");
        assert_eq!(track.song_name, "Mr. Brightside");
        assert_eq!(track.artist, "The Killers, Guest");
        assert_eq!(track.artists, vec!["The Killers", "Guest"]);
        assert_eq!(track.primary_artist(), "The Killers");
        assert_eq!(track.album, "Hot Fuss");
        assert_eq!(track.preview_url, None);
        assert_eq!(track.album_image.as_deref(), Some("https://i.scdn.co/image/large"));
        assert_eq!(track.duration_ms, 222075);
        assert_eq!(track.popularity, 86);
    }

    #[test]
    fn test_parse_track_keeps_commas_inside_artist_names() {
        let track = parse_track(&json!({
            "id": "2P5yIMu2DNeMXTyOANKS6k",
            "name": "EARFQUAKE",
            "artists": [{"name": "Tyler, The Creator"}],
        }))
        .unwrap();
        assert_eq!(track.artists, vec!["Tyler, The Creator"]);
        assert_eq!(track.primary_artist(), "Tyler, The Creator");
    }

    #[test]
    fn test_parse_track_without_id_fails() {
        assert!(parse_track(&json!({"name": "Nameless"})).is_err());
    }

    #[test]
    fn test_parse_artist_without_images() {
        let artist = parse_artist(&json!({
            "id": "0oSGxfWSnnOXhD2fKuz2Gy",
            "name": "David Bowie",
            "genres": ["art rock", "glam rock"],
            "popularity": 80,
            "images": [],
            "external_urls": {"spotify": "https://open.spotify.com/artist/0oSGxfWSnnOXhD2fKuz2Gy"}
        }))
        .unwrap();
        assert_eq!(artist.genres, vec!["art rock", "glam rock"]);
        assert!(artist.image_url.is_none());
    }

    #[test]
    fn test_parse_search_tracks_skips_bad_items() {
        let page = json!({"tracks": {"items": [track_json(), null, {"name": "no id"}]}});
        let tracks = parse_search_tracks(&page);
        assert_eq!(tracks.len(), 1);
        assert!(parse_search_tracks(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_genius_hit() {
        let response = json!({
            "response": {"hits": [{"result": {
                "id": 378195,
                "title": "Hallelujah",
                "url": "https://genius.com/Leonard-cohen-hallelujah-lyrics",
                "primary_artist": {"name": "Leonard Cohen"}
            }}]}
        });
        let song = parse_genius_hit(&response).unwrap();
        assert_eq!(song.song_id, 378195);
        assert_eq!(song.artist, "Leonard Cohen");

        assert!(parse_genius_hit(&json!({"response": {"hits": []}})).is_none());
    }
}
