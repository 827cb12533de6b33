//! Bounded-retry publisher over the [`LinkPort`].
//!
//! Each message gets `publish_max_attempts` tries with a fixed delay in
//! between.  Every try first makes sure the link is up.  The publisher
//! turns *deferred* when the link itself cannot be brought up within a
//! message's budget, or once the episode has spent its failure budget
//! ([`failure_budget`]) on any kind of error.  After that every publish in
//! the same episode fails immediately with [`CommsError::Deferred`] so the
//! episode can finish and sleep.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::topics::Topic;

use super::ports::LinkPort;

/// Messages allowed to fail outright before the rest of the episode is
/// deferred.
pub const FAILED_MESSAGES_PER_EPISODE: u32 = 2;

/// Failed attempts one episode may spend before it defers.
pub fn failure_budget(config: &SystemConfig) -> u32 {
    u32::from(config.publish_max_attempts.max(1)) * FAILED_MESSAGES_PER_EPISODE
}

pub struct Publisher<'a, L: LinkPort, D: DelayNs> {
    link: &'a mut L,
    delay: &'a mut D,
    max_attempts: u8,
    retry_delay_ms: u32,
    failures_left: u32,
    deferred: bool,
}

impl<'a, L: LinkPort, D: DelayNs> Publisher<'a, L, D> {
    pub fn new(link: &'a mut L, delay: &'a mut D, config: &SystemConfig) -> Self {
        Self {
            link,
            delay,
            max_attempts: config.publish_max_attempts.max(1),
            retry_delay_ms: config.publish_retry_delay_ms,
            failures_left: failure_budget(config),
            deferred: false,
        }
    }

    /// Bring the link up within the retry budget.
    pub fn connect(&mut self) -> Result<(), CommsError> {
        self.with_retry("connect", |link| link.ensure_connected())
    }

    /// Publish one message within the retry budget.
    pub fn publish(&mut self, topic: Topic, payload: &str) -> Result<(), CommsError> {
        self.with_retry(topic.as_str(), |link| {
            link.ensure_connected()?;
            link.publish(topic.as_str(), payload)
        })
    }

    /// `true` once the link was given up for this episode.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Shared view of the link, for diagnostics.
    pub fn link(&self) -> &L {
        &*self.link
    }

    fn with_retry(
        &mut self,
        what: &str,
        mut op: impl FnMut(&mut L) -> Result<(), CommsError>,
    ) -> Result<(), CommsError> {
        if self.deferred {
            return Err(CommsError::Deferred);
        }

        let mut last = CommsError::PublishFailed;
        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                self.delay.delay_ms(self.retry_delay_ms);
            }
            match op(&mut *self.link) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!("{what}: attempt {attempt}/{} failed: {e}", self.max_attempts);
                    last = e;
                    self.failures_left = self.failures_left.saturating_sub(1);
                    if self.failures_left == 0 {
                        info!("episode failure budget spent, deferring remaining publishes");
                        self.deferred = true;
                        return Err(last);
                    }
                }
            }
        }

        if last.is_link_down() {
            info!("link unavailable, deferring remaining publishes");
            self.deferred = true;
        }
        Err(last)
    }
}
