#![forbid(unsafe_code)]

//! Shared library for the tubecast tools.
//!
//! Turns YouTube videos and playlists into ErsatzTV "remote stream" YAML
//! descriptors. The [`remote_stream`] module is the generation engine; the
//! rest are its collaborators: the Data API client, the TTL cache behind it,
//! boundary validation, filename formatting, and service plumbing shared by
//! the binaries.

pub mod cache;
pub mod config;
pub mod duration;
pub mod filename;
pub mod rate_limit;
pub mod remote_stream;
pub mod validate;
pub mod youtube;
