// Touch and swipe handling
//
// A best-effort two-event gesture recognizer: touch-down over an obstacle
// records it, and a touch-up anywhere within the time window classifies
// the displacement into at most one directional swipe, dispatched to the
// obstacle's one-shot swipe action. Drag and poke interactions route
// through the same touch entry points.

use glam::Vec2;
use log::debug;

use crate::game::entities::{EntityId, SwipeDir, SwipeState, TouchBehavior};
use crate::game::hazards;
use crate::game::level::Level;

/// Seconds between touch-down and touch-up for a swipe to count
pub const SWIPE_WINDOW: f32 = 0.3;

/// Minimum displacement for a swipe to count, in world units
pub const SWIPE_MIN_DISTANCE: f32 = 65.0;

/// Seconds between pokes that count as a delete double-tap
pub const POKE_DELETE_WINDOW: f32 = 0.5;

/// Recognizer state carried between touch events
#[derive(Default)]
pub struct GestureState {
    /// Obstacle under the most recent touch-down
    pub last_touched: Option<EntityId>,
    pub last_touch_time: f32,

    /// Poked obstacle waiting for a placement tap
    pub poke_selected: Option<EntityId>,
    pub last_poke_time: f32,
}

/// Classify a displacement into a swipe direction
///
/// The dominant axis wins; below the minimum distance nothing fires.
pub fn classify(delta: Vec2) -> Option<SwipeDir> {
    if delta.y.abs() > delta.x.abs() {
        if delta.y > SWIPE_MIN_DISTANCE {
            Some(SwipeDir::Down)
        } else if delta.y < -SWIPE_MIN_DISTANCE {
            Some(SwipeDir::Up)
        } else {
            None
        }
    } else if delta.x > SWIPE_MIN_DISTANCE {
        Some(SwipeDir::Right)
    } else if delta.x < -SWIPE_MIN_DISTANCE {
        Some(SwipeDir::Left)
    } else {
        None
    }
}

impl Level {
    pub(crate) fn on_touch_down(&mut self, target: Option<EntityId>, at: Vec2) {
        let Some(id) = target else {
            // a bare scene tap places the pending poked obstacle
            if let Some(pending) = self.gestures.poke_selected.take() {
                if self.entities.contains(pending) {
                    self.set_entity_position(pending, at);
                }
            }
            return;
        };

        if self.entities.get(id).map(|e| e.hero().is_some()).unwrap_or(false) {
            self.hero_touched(id);
            return;
        }

        let Some(touch) = self.entities.get(id).and_then(|e| e.obstacle()).map(|d| d.touch)
        else {
            return;
        };

        // remember the obstacle for swipe classification on touch-up
        self.gestures.last_touched = Some(id);
        self.gestures.last_touch_time = self.clock;

        match touch {
            TouchBehavior::Drag => self.set_entity_position(id, at),
            TouchBehavior::Poke => self.poked(id),
            TouchBehavior::None => {}
        }
    }

    pub(crate) fn on_touch_move(&mut self, target: Option<EntityId>, at: Vec2) {
        let Some(id) = target else { return };
        let dragging = self
            .entities
            .get(id)
            .and_then(|e| e.obstacle())
            .map(|d| d.touch == TouchBehavior::Drag)
            .unwrap_or(false);
        if dragging {
            self.set_entity_position(id, at);
        }
    }

    /// Resolve a possible swipe against the last-touched obstacle
    pub(crate) fn on_touch_up(&mut self, at: Vec2) {
        let Some(last) = self.gestures.last_touched else {
            return;
        };
        if self.clock - self.gestures.last_touch_time >= SWIPE_WINDOW {
            return;
        }
        let Some(origin) = self.entities.get(last).map(|e| e.top_left()) else {
            return;
        };
        let Some(dir) = classify(at - origin) else {
            return;
        };
        // one-shot: only a matching armed action fires, and firing
        // consumes it for the rest of the level
        let action = match self.entities.get(last).and_then(|e| e.obstacle()) {
            Some(data) => match data.swipe {
                SwipeState::Armed(action) if action.dir == dir => Some(action),
                _ => None,
            },
            None => None,
        };
        let Some(action) = action else { return };
        if let Some(data) = self.entities.get_mut(last).and_then(|e| e.obstacle_mut()) {
            data.swipe = SwipeState::Consumed;
        }
        debug!("swipe {:?} fired", dir);
        hazards::run_swipe_effect(self, action.effect);
    }

    /// Poke selection: double-poke deletes, otherwise the obstacle becomes
    /// the pending selection for the next scene tap
    fn poked(&mut self, id: EntityId) {
        let now = self.clock;
        if self.gestures.poke_selected == Some(id)
            && now - self.gestures.last_poke_time < POKE_DELETE_WINDOW
        {
            self.hide_entity(id);
            self.gestures.poke_selected = None;
        } else {
            self.gestures.poke_selected = Some(id);
            self.gestures.last_poke_time = now;
        }
    }
}
