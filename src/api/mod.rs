//! External API clients.
//!
//! - [`SpotifyApi`]: catalogue search and lookups (client credentials)
//! - [`GeniusApi`]: song search and lyrics profiles

pub mod genius;
pub mod spotify;

pub use genius::GeniusApi;
pub use spotify::SpotifyApi;
