//! Built-in catalogue ranked when Spotify is unavailable.

use crate::models::SpotifyTrackInfo;

/// `(song, artist, album, popularity)`
const CATALOGUE: &[(&str, &str, &str, u32)] = &[
    ("Bohemian Rhapsody", "Queen", "A Night at the Opera", 88),
    ("Imagine", "John Lennon", "Imagine", 80),
    ("Hotel California", "Eagles", "Hotel California", 85),
    ("Stairway to Heaven", "Led Zeppelin", "Led Zeppelin IV", 82),
    ("Hey Jude", "The Beatles", "Hey Jude", 79),
    ("Smells Like Teen Spirit", "Nirvana", "Nevermind", 84),
    ("Billie Jean", "Michael Jackson", "Thriller", 87),
    ("Sweet Child O' Mine", "Guns N' Roses", "Appetite for Destruction", 86),
    ("Come Together", "The Beatles", "Abbey Road", 80),
    ("Purple Haze", "Jimi Hendrix", "Are You Experienced", 72),
    ("Here Comes the Sun", "The Beatles", "Abbey Road", 83),
    ("Happy", "Pharrell Williams", "G I R L", 81),
    ("Walking on Sunshine", "Katrina and the Waves", "Walking on Sunshine", 76),
    ("Don't Stop Me Now", "Queen", "Jazz", 85),
    ("Good Vibrations", "The Beach Boys", "Smiley Smile", 70),
    ("Yesterday", "The Beatles", "Help!", 76),
    ("Everybody Hurts", "R.E.M.", "Automatic for the People", 73),
    ("Hurt", "Johnny Cash", "American IV: The Man Comes Around", 77),
    ("Tears in Heaven", "Eric Clapton", "Rush", 72),
    ("Nothing Compares 2 U", "Sinead O'Connor", "I Do Not Want What I Haven't Got", 71),
    ("Killing in the Name", "Rage Against the Machine", "Rage Against the Machine", 78),
    ("Break Stuff", "Limp Bizkit", "Significant Other", 74),
    ("Clair de Lune", "Claude Debussy", "Suite bergamasque", 68),
    ("Weightless", "Marconi Union", "Weightless", 62),
    ("Teardrop", "Massive Attack", "Mezzanine", 72),
    ("Lose Yourself", "Eminem", "8 Mile", 86),
    ("Eye of the Tiger", "Survivor", "Eye of the Tiger", 80),
    ("Can't Help Falling in Love", "Elvis Presley", "Blue Hawaii", 82),
    ("Dreams", "Fleetwood Mac", "Rumours", 86),
    ("Fix You", "Coldplay", "X&Y", 84),
];

/// Catalogue entries as tracks without Spotify identifiers.
pub fn offline_tracks() -> Vec<SpotifyTrackInfo> {
    CATALOGUE
        .iter()
        .map(|(song, artist, album, popularity)| SpotifyTrackInfo {
            song_name: song.to_string(),
            artist: artist.to_string(),
            artists: vec![artist.to_string()],
            album: album.to_string(),
            popularity: *popularity,
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_tracks_have_no_spotify_ids() {
        let tracks = offline_tracks();
        assert_eq!(tracks.len(), CATALOGUE.len());
        assert!(tracks.iter().all(|t| t.spotify_id.is_empty() && !t.artist.is_empty()));
    }
}
