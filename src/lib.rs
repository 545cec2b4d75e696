//! dualsub - Bilingual Subtitle Merging
//!
//! Fetches subtitles for a movie or episode in two languages, repairs their
//! text encoding, aligns the cues by time and renders a single SRT track with
//! the translation in italics below each line.

pub mod align;
pub mod cli;
pub mod config;
pub mod encoding;
pub mod error;
pub mod language;
pub mod merge;
pub mod source;
pub mod store;
pub mod subtitle;
pub mod workflow;
