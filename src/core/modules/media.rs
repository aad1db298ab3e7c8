//! Media session contract.
//!
//! No OS backend ships with the crate; the media schedule publishes heartbeats
//! until one is supplied to [`crate::core::DataUpdate::with_media_session`].

use super::types::Media;
use crate::error::Result;

/// Source of the currently playing media.
pub trait MediaSession: Send {
    /// The current session's media info, or `None` when nothing is open.
    fn current_media(&mut self) -> Result<Option<Media>>;
}
