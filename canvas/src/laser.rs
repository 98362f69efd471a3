//! Laser trail decay.
//!
//! Finished laser strokes fade out on a fixed timer. The host owns the actual
//! interval; the animator only tells it when to start and stop one, so no
//! timer runs while there is nothing to fade.

#[cfg(test)]
#[path = "laser_test.rs"]
mod laser_test;

use frames::LaserTrail;

use crate::consts::{
    CONTROLLER_DECAY_INTERVAL_MS, CONTROLLER_DECAY_STEP, DISPLAY_DECAY_INTERVAL_MS, DISPLAY_DECAY_STEP,
    OPACITY_EPSILON,
};

/// Opacity decrement per tick and tick cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayConfig {
    pub step: f64,
    pub interval_ms: u32,
}

impl DecayConfig {
    pub const DISPLAY: Self = Self { step: DISPLAY_DECAY_STEP, interval_ms: DISPLAY_DECAY_INTERVAL_MS };
    pub const CONTROLLER: Self = Self { step: CONTROLLER_DECAY_STEP, interval_ms: CONTROLLER_DECAY_INTERVAL_MS };
}

/// Instruction for the host's interval timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start { interval_ms: u32 },
    Stop,
}

/// Owns the live laser trails and their decay timer state.
#[derive(Debug, Clone)]
pub struct DecayAnimator {
    config: DecayConfig,
    trails: Vec<LaserTrail>,
    running: bool,
}

impl DecayAnimator {
    #[must_use]
    pub fn new(config: DecayConfig) -> Self {
        Self { config, trails: Vec::new(), running: false }
    }

    #[must_use]
    pub fn trails(&self) -> &[LaserTrail] {
        &self.trails
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Add a trail at full opacity, starting the timer if it is idle.
    pub fn push(&mut self, trail: LaserTrail) -> Option<TimerCommand> {
        self.trails.push(trail);
        if self.running {
            return None;
        }
        self.running = true;
        Some(TimerCommand::Start { interval_ms: self.config.interval_ms })
    }

    /// Advance every trail by one step and drop the ones that reached zero.
    /// Returns [`TimerCommand::Stop`] once nothing is left.
    pub fn tick(&mut self) -> Option<TimerCommand> {
        let step = self.config.step;
        for trail in &mut self.trails {
            trail.opacity = (trail.opacity - step).max(0.0);
        }
        self.trails.retain(|t| t.opacity > OPACITY_EPSILON);
        if self.trails.is_empty() && self.running {
            self.running = false;
            return Some(TimerCommand::Stop);
        }
        None
    }

    /// Replace the trail list wholesale (presenter mirror).
    pub fn replace(&mut self, trails: Vec<LaserTrail>) {
        self.trails = trails;
    }

    /// Drop all trails, stopping the timer if it was running.
    pub fn clear(&mut self) -> Option<TimerCommand> {
        self.trails.clear();
        if self.running {
            self.running = false;
            return Some(TimerCommand::Stop);
        }
        None
    }
}
