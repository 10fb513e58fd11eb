//! portrait-ingest: GitHub payload types, conversion into `RawProfile`, and the disk cache.

pub mod cache;
pub mod parsers;
pub mod types;

pub use cache::JsonDirCache;
pub use parsers::github::{decode_readme, to_raw_profile, window_start};
pub use types::{GhCommit, GhReadme, GhRepo, GhUser, ProfileSnapshot, RepoSnapshot};
