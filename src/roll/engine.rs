//! Roll engine state machine.

use super::RosterSource;
use crate::config::RollConfig;
use crate::error::RollError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Result of [`RollEngine::toggle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Toggle {
    /// A roll began. Call `advance` after `first_delay`.
    Started { first_delay: Duration },
    /// The running roll was cancelled. Nothing was recorded.
    Stopped,
}

/// One step of a roll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Name to display.
    pub name: String,
    /// 1-based position within the roll.
    pub index: u32,
    /// Delay that preceded this tick.
    pub interval: Duration,
    /// Delay before the next tick, `None` on the final pick.
    pub next_delay: Option<Duration>,
}

impl Tick {
    /// Whether this tick ended the roll.
    pub fn is_final(&self) -> bool {
        self.next_delay.is_none()
    }
}

/// State of a running roll.
struct RollSession {
    /// Names not yet shown in the current pass.
    pool: Vec<String>,
    /// Delay in milliseconds that precedes the next tick.
    interval: u64,
    ticks: u32,
}

/// Drives decelerating rolls over a roster.
///
/// Idle until [`toggle`](Self::toggle) starts a roll; each
/// [`advance`](Self::advance) produces one [`Tick`]. The final tick is
/// reported to the source with `record_call` and the engine returns to
/// idle.
pub struct RollEngine<R = StdRng> {
    config: RollConfig,
    rng: R,
    session: Option<RollSession>,
}

impl RollEngine<StdRng> {
    /// Create an engine seeded from the operating system.
    pub fn new(config: RollConfig) -> Result<Self, RollError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> RollEngine<R> {
    /// Create an engine with a caller-supplied random source.
    pub fn with_rng(config: RollConfig, rng: R) -> Result<Self, RollError> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            session: None,
        })
    }

    /// Start a roll when idle, cancel it when running.
    ///
    /// Starting snapshots `source.list_names()`. An empty roster is
    /// rejected with [`RollError::EmptyRoster`] and nothing changes.
    pub fn toggle<S: RosterSource + ?Sized>(&mut self, source: &S) -> Result<Toggle, RollError> {
        if self.stop() {
            return Ok(Toggle::Stopped);
        }

        let mut pool = source.list_names();
        if pool.is_empty() {
            tracing::warn!("Refusing to start a roll on an empty roster");
            return Err(RollError::EmptyRoster);
        }
        pool.shuffle(&mut self.rng);

        tracing::debug!(
            names = pool.len(),
            min_speed = self.config.min_speed,
            max_speed = self.config.max_speed,
            "Roll started"
        );

        let interval = self.config.min_speed;
        self.session = Some(RollSession {
            pool,
            interval,
            ticks: 0,
        });

        Ok(Toggle::Started {
            first_delay: Duration::from_millis(interval),
        })
    }

    /// Cancel the running roll. Returns false if none was running.
    pub fn stop(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                tracing::debug!(ticks = session.ticks, "Roll stopped");
                true
            }
            None => false,
        }
    }

    /// Produce the next tick, or `None` when idle.
    ///
    /// An exhausted pool is refilled from `source` and reshuffled, so a
    /// long roll may show a name again, but never twice within one pass.
    /// If the roster has become empty the roll stops and `None` is
    /// returned.
    pub fn advance<S: RosterSource + ?Sized>(&mut self, source: &S) -> Option<Tick> {
        let session = self.session.as_mut()?;

        if session.pool.is_empty() {
            let mut fresh = source.list_names();
            if fresh.is_empty() {
                tracing::warn!("Roster emptied during a roll, stopping");
                self.session = None;
                return None;
            }
            fresh.shuffle(&mut self.rng);
            tracing::debug!(names = fresh.len(), "Refilled roll pool");
            session.pool = fresh;
        }

        let pick = self.rng.random_range(0..session.pool.len());
        let name = session.pool.swap_remove(pick);
        session.ticks += 1;

        let interval = session.interval;
        let index = session.ticks;

        if interval >= self.config.max_speed {
            self.session = None;
            if !source.record_call(&name) {
                tracing::warn!(name = %name, "Final pick was not recorded");
            }
            tracing::info!(name = %name, ticks = index, "Roll finished");
            return Some(Tick {
                name,
                index,
                interval: Duration::from_millis(interval),
                next_delay: None,
            });
        }

        session.interval = interval
            .saturating_add(self.config.step)
            .min(self.config.max_speed);

        Some(Tick {
            name,
            index,
            interval: Duration::from_millis(interval),
            next_delay: Some(Duration::from_millis(session.interval)),
        })
    }

    /// Whether a roll is in progress.
    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Delay before the next tick of the running roll.
    pub fn interval(&self) -> Option<Duration> {
        self.session
            .as_ref()
            .map(|s| Duration::from_millis(s.interval))
    }

    /// Names left in the current pass.
    pub fn pool_remaining(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.pool.len())
    }

    /// Timing this engine was built with.
    pub fn config(&self) -> &RollConfig {
        &self.config
    }
}
