//! Media schedule step.
//!
//! Polls the media session once per tick. While something is playing the
//! schedule speeds up to the playing interval, otherwise it falls back to the
//! idle interval.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use parking_lot::Mutex;

use crate::core::modules::{Media, MediaSession, ModuleCallback, ModuleData};
use crate::error::Result;

use super::{IntervalHandle, UpdateStep};

pub type SharedMediaSession = Arc<Mutex<Option<Box<dyn MediaSession>>>>;

pub struct MediaUpdateStep {
    session: SharedMediaSession,
    callback: ModuleCallback,
    interval: IntervalHandle,
    idle_interval: Duration,
    playing_interval: Duration,
}

impl MediaUpdateStep {
    pub fn new(
        session: SharedMediaSession,
        callback: ModuleCallback,
        interval: IntervalHandle,
        idle_interval: Duration,
        playing_interval: Duration,
    ) -> Self {
        Self {
            session,
            callback,
            interval,
            idle_interval,
            playing_interval,
        }
    }

    fn query(&self) -> Option<Media> {
        let mut session = self.session.lock();
        let session = session.as_mut()?;

        match session.current_media() {
            Ok(media) => media,
            Err(e) => {
                error!("Failed to update media: {}", e);
                None
            }
        }
    }
}

impl UpdateStep for MediaUpdateStep {
    type Params = ();

    async fn update(&mut self, _params: Option<()>) -> Result<()> {
        match self.query() {
            Some(media) => {
                let interval = if media.is_playing() {
                    self.playing_interval
                } else {
                    self.idle_interval
                };
                self.interval.set(interval);
                (self.callback)(ModuleData::Media(media));
            }
            None => {
                debug!("No media session, sending heartbeat");
                (self.callback)(ModuleData::Media(Media::heartbeat()));
            }
        }
        Ok(())
    }
}
