// Obstacles are entities that change the hero's fate on contact. They can
// be plain walls, hero-killers, ramps, pit covers, velocity-damping pads,
// or trigger zones that run external code. They can also be dragged,
// poked, or armed with a one-shot swipe action.

use crate::engine::physics::{BodyConfig, BodyKind};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::level::Level;

/// What the obstacle does to a hero that touches it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObstacleRole {
    /// A wall: resets the hero's in-air flag so it can jump again
    Plain,
    /// Lowered ramps lift the hero over what follows; raised ramps kill
    Ramp { lowered: bool },
    /// Invisible cover over a pit; kills while armed
    PitCover { armed: bool },
    /// Always kills the hero
    Killer,
    /// Runs external code once the goodie requirement is met, then
    /// deactivates
    Trigger { activation: u32, id: u32 },
    /// Extends the endless level, carrying the next hero speed
    StreamTrigger { speed: u32 },
}

/// Which touch interaction the obstacle supports (at most one)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchBehavior {
    None,
    /// Follows the finger
    Drag,
    /// Poke, then poke the screen to move it; rapid double-poke deletes
    Poke,
}

/// Swipe direction inferred from a touch-down/touch-up pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDir {
    Up,
    Down,
    Left,
    Right,
}

/// The scripted transition a swipe performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeEffect {
    /// Slide the box up onto the top rail, out of the hero's way
    RaiseBox { target: EntityId },
    /// Slide the box down over a pit, disarming the pit cover
    CoverPit { target: EntityId, pit: EntityId },
    /// Bring the ramp down to the floor
    LowerRamp { ramp: EntityId },
    /// Open the trapdoor and drop the enemy into the pit
    DropEnemy { door: EntityId, enemy: EntityId },
}

/// A directional one-shot action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeAction {
    pub dir: SwipeDir,
    pub effect: SwipeEffect,
}

/// One-shot swipe state machine: armed once, consumed forever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeState {
    /// No swipe behavior
    Unarmed,
    /// Holds the transition to run on the first qualifying swipe
    Armed(SwipeAction),
    /// Terminal: further swipes do nothing
    Consumed,
}

/// Per-obstacle state
pub struct ObstacleData {
    pub role: ObstacleRole,

    /// Multiplier applied to the hero's velocity while overlapping
    pub damp: Option<f32>,

    pub touch: TouchBehavior,

    pub swipe: SwipeState,
}

impl ObstacleData {
    pub fn plain() -> Self {
        Self {
            role: ObstacleRole::Plain,
            damp: None,
            touch: TouchBehavior::None,
            swipe: SwipeState::Unarmed,
        }
    }

    pub fn with_role(role: ObstacleRole) -> Self {
        Self {
            role,
            ..Self::plain()
        }
    }
}

impl Level {
    /// Draw an obstacle from its top-left corner
    ///
    /// All obstacle behaviors start here; the `set_*` methods below refine
    /// the result.
    pub fn add_obstacle(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: &str,
        cfg: BodyConfig,
    ) -> EntityId {
        self.spawn(
            EntityKind::Obstacle(ObstacleData::plain()),
            x,
            y,
            w,
            h,
            Some(image),
            Some(cfg),
        )
    }

    /// Standard static square obstacle with the default material
    pub fn add_square_obstacle(&mut self, x: f32, y: f32, w: f32, h: f32, image: &str) -> EntityId {
        self.add_obstacle(
            x,
            y,
            w,
            h,
            image,
            BodyConfig::box_shape().kind(BodyKind::Static),
        )
    }

    /// Change what the obstacle does to heroes
    pub fn set_obstacle_role(&mut self, obstacle: EntityId, role: ObstacleRole) {
        if let Some(data) = self.entities.get_mut(obstacle).and_then(|e| e.obstacle_mut()) {
            data.role = role;
        }
    }

    /// Give the obstacle a velocity-damping factor
    ///
    /// Damp pads are sensors the hero glides over: factors below 1 act as
    /// friction pads, above 1 as zoom strips, negative factors reverse.
    pub fn set_damp(&mut self, obstacle: EntityId, factor: f32) {
        if let Some(data) = self.entities.get_mut(obstacle).and_then(|e| e.obstacle_mut()) {
            data.damp = Some(factor);
        }
        if let Some(body) = self.entities.get(obstacle).and_then(|e| e.body) {
            self.physics.set_sensor(body, true);
        }
    }

    /// Make this a trigger zone requiring `activation` goodies
    pub fn set_trigger(&mut self, obstacle: EntityId, activation: u32, id: u32) {
        if let Some(data) = self.entities.get_mut(obstacle).and_then(|e| e.obstacle_mut()) {
            data.role = ObstacleRole::Trigger { activation, id };
        }
        if let Some(body) = self.entities.get(obstacle).and_then(|e| e.body) {
            self.physics.set_sensor(body, true);
        }
    }

    /// Arm a one-shot swipe action on this obstacle
    pub fn arm_swipe(&mut self, obstacle: EntityId, action: SwipeAction) {
        if let Some(data) = self.entities.get_mut(obstacle).and_then(|e| e.obstacle_mut()) {
            data.swipe = SwipeState::Armed(action);
        }
    }

    /// Let the user drag this obstacle around
    pub fn enable_drag(&mut self, obstacle: EntityId) {
        if let Some(data) = self.entities.get_mut(obstacle).and_then(|e| e.obstacle_mut()) {
            data.touch = TouchBehavior::Drag;
        }
    }

    /// Let the user poke-select this obstacle
    pub fn enable_poke(&mut self, obstacle: EntityId) {
        if let Some(data) = self.entities.get_mut(obstacle).and_then(|e| e.obstacle_mut()) {
            data.touch = TouchBehavior::Poke;
        }
    }

    /// Rotate an obstacle in place (radians)
    pub fn rotate_obstacle(&mut self, obstacle: EntityId, angle: f32) {
        let Some(body) = self.entities.get(obstacle).and_then(|e| e.body) else {
            return;
        };
        let pos = self.physics.translation(body).unwrap_or_default();
        self.physics.set_pose(body, pos, angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::LevelConfig;

    #[test]
    fn test_plain_obstacle_defaults() {
        let data = ObstacleData::plain();
        assert_eq!(data.role, ObstacleRole::Plain);
        assert_eq!(data.damp, None);
        assert_eq!(data.touch, TouchBehavior::None);
        assert_eq!(data.swipe, SwipeState::Unarmed);
    }

    #[test]
    fn test_set_damp_makes_sensor() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        let id = level.add_square_obstacle(0.0, 0.0, 70.0, 70.0, "invis.png");
        level.set_damp(id, 0.5);
        let entity = level.entities.get(id).unwrap();
        assert_eq!(entity.obstacle().unwrap().damp, Some(0.5));
        assert!(level.physics.is_sensor(entity.body.unwrap()));
    }

    #[test]
    fn test_trigger_role() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        let id = level.add_square_obstacle(0.0, 0.0, 10.0, 10.0, "purpleball.png");
        level.set_trigger(id, 3, 7);
        assert_eq!(
            level.entities.get(id).unwrap().obstacle().unwrap().role,
            ObstacleRole::Trigger { activation: 3, id: 7 }
        );
    }
}
