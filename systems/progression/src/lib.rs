#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Experience and level tracking for the player.
//!
//! Collected XP orbs feed [`Progression::handle`]. Every level crossed emits a
//! `LevelUp` followed by an `ExperienceChanged`, and every grant finishes with
//! one more `ExperienceChanged` describing the final state.

use horde_core::{Event, LootKind, ProgressionConfig};

/// Player experience and level.
#[derive(Clone, Debug, PartialEq)]
pub struct Progression {
    xp: u32,
    level: u32,
    base_required: f32,
    growth_per_level: f32,
}

impl Progression {
    /// Creates a level one tracker with no experience.
    #[must_use]
    pub fn new(config: &ProgressionConfig) -> Self {
        Self {
            xp: 0,
            level: 1,
            base_required: config.base_required,
            growth_per_level: config.growth_per_level,
        }
    }

    /// Experience accumulated toward the next level.
    #[must_use]
    pub const fn xp(&self) -> u32 {
        self.xp
    }

    /// Current level, starting at one.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Experience needed to leave the current level.
    #[must_use]
    pub fn required_xp(&self) -> u32 {
        let exponent = i32::try_from(self.level.saturating_sub(1)).unwrap_or(i32::MAX);
        let required = (self.base_required * self.growth_per_level.powi(exponent)).round();
        if required.is_finite() && required >= 1.0 {
            // Saturating float-to-int cast.
            required as u32
        } else if required.is_finite() {
            1
        } else {
            u32::MAX
        }
    }

    /// Adds experience, levelling up as many times as the total allows.
    ///
    /// A zero grant is ignored.
    pub fn add_xp(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }

        self.xp = self.xp.saturating_add(amount);
        loop {
            let required = self.required_xp();
            if self.xp < required {
                break;
            }
            self.xp -= required;
            self.level = self.level.saturating_add(1);
            log::info!("player reached level {}", self.level);
            out_events.push(Event::LevelUp { level: self.level });
            out_events.push(self.changed());
        }
        out_events.push(self.changed());
    }

    /// Consumes world events, granting experience for collected orbs.
    pub fn handle(&mut self, events: &[Event], out_events: &mut Vec<Event>) {
        for event in events {
            if let Event::PickupCollected {
                kind: LootKind::XpOrb,
                amount,
            } = event
            {
                let amount = amount.max(0.0).round();
                if amount.is_finite() {
                    self.add_xp(amount as u32, out_events);
                }
            }
        }
    }

    fn changed(&self) -> Event {
        Event::ExperienceChanged {
            current: self.xp,
            required: self.required_xp(),
            level: self.level,
        }
    }
}
