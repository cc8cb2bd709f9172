//! Emotion understanding.
//!
//! - [`EmotionMapper`]: static emotion to audio-feature ranges
//! - [`EmotionContext`]: embedding-based emotion similarity and analysis
//! - [`lyrics`]: keyword scoring of song lyrics

pub mod context;
pub mod lyrics;
pub mod mapper;

pub use context::{EmotionContext, TextContext};
pub use mapper::EmotionMapper;
