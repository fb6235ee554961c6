//! translate-movie - Translated subtitles for a video
//!
//! Chains yt-dlp, whisper, and chatgpt-subtitle-translator: a local or downloaded
//! video is transcribed to `<name>.srt`, which is then translated to
//! `<name>_<lang>.srt` next to it.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod report;
pub mod setup;
pub mod subtitle;
pub mod tools;
pub mod transcribe;
pub mod translate;
pub mod workflow;
