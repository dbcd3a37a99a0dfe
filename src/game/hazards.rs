// Composite factory hazards
//
// Each builder assembles one interactive obstacle course piece out of
// visible parts, an invisible padded touch area and a one-shot swipe
// action: boxes that must be swiped out of the hero's path, trapdoors
// that drop an enemy into a pit, and ramps that launch the hero over
// whatever waits behind them.

use glam::Vec2;

use crate::game::entities::enemy::{ENEMY_HEIGHT, ENEMY_WIDTH};
use crate::game::entities::{
    EntityId, ObstacleRole, SwipeAction, SwipeDir, SwipeEffect,
};
use crate::game::level::{Level, PathOutcome, FLOOR_TOP};

pub const BOX_WIDTH: f32 = 70.0;
pub const BOX_HEIGHT: f32 = 70.0;
pub const PIT_WIDTH: f32 = 70.0;
pub const PIT_HEIGHT: f32 = 70.0;
pub const RAMP_WIDTH: f32 = 70.0;
pub const RAMP_HEIGHT: f32 = 70.0;
pub const TRAPDOOR_WIDTH: f32 = 35.0;
pub const TRAPDOOR_HEIGHT: f32 = 10.0;
pub const FORKLIFT_WIDTH: f32 = 105.0;
pub const FORKLIFT_HEIGHT: f32 = 135.0;

/// Padding around swipeable parts so the touch surface is forgiving
const TOUCH_PADDING: f32 = 8.0;

/// Resting y for a box parked on the forklift rail
const RAIL_Y: f32 = FLOOR_TOP - FORKLIFT_HEIGHT + 10.0 - BOX_HEIGHT;

impl Level {
    /// A box on the floor that kills the hero unless swiped up onto the
    /// forklift rail
    pub fn add_upbox(&mut self, x: f32) -> EntityId {
        let y = FLOOR_TOP - BOX_HEIGHT;
        self.add_decoration(
            x - (FORKLIFT_WIDTH - BOX_WIDTH) / 2.0,
            FLOOR_TOP - FORKLIFT_HEIGHT,
            FORKLIFT_WIDTH,
            FORKLIFT_HEIGHT,
            "forklift.png",
        );
        let touch = self.add_square_obstacle(
            x - TOUCH_PADDING,
            y - TOUCH_PADDING,
            BOX_WIDTH + TOUCH_PADDING * 2.0,
            BOX_HEIGHT + TOUCH_PADDING * 2.0,
            "invis.png",
        );
        self.set_damp(touch, 1.0);

        let upbox = self.add_square_obstacle(x, y, BOX_WIDTH, BOX_HEIGHT, "upbox.png");
        self.set_obstacle_role(upbox, ObstacleRole::Killer);
        self.arm_swipe(
            touch,
            SwipeAction {
                dir: SwipeDir::Up,
                effect: SwipeEffect::RaiseBox { target: upbox },
            },
        );
        upbox
    }

    /// A box on the forklift rail that must be swiped down to cover the
    /// pit below it
    pub fn add_downbox(&mut self, x: f32) -> EntityId {
        let y = RAIL_Y;
        self.add_decoration(
            x - (FORKLIFT_WIDTH - BOX_WIDTH) / 2.0,
            FLOOR_TOP - FORKLIFT_HEIGHT,
            FORKLIFT_WIDTH,
            FORKLIFT_HEIGHT,
            "forklift.png",
        );
        let touch = self.add_square_obstacle(
            x - TOUCH_PADDING,
            y - TOUCH_PADDING,
            BOX_WIDTH + TOUCH_PADDING * 2.0,
            BOX_HEIGHT + TOUCH_PADDING * 2.0,
            "invis.png",
        );
        let hole = self.add_square_obstacle(x, FLOOR_TOP, PIT_WIDTH, PIT_HEIGHT, "ground_hole.png");
        let pit = self.add_square_obstacle(x, FLOOR_TOP - 5.0, PIT_WIDTH, 5.0, "invis.png");
        let downbox = self.add_square_obstacle(x, y, BOX_WIDTH, BOX_HEIGHT, "downbox.png");

        self.set_damp(touch, 1.0);
        self.set_damp(hole, 1.0);
        self.set_damp(pit, 1.0);
        self.set_damp(downbox, 1.0);

        self.set_obstacle_role(pit, ObstacleRole::PitCover { armed: true });
        self.set_obstacle_role(downbox, ObstacleRole::Killer);
        self.arm_swipe(
            touch,
            SwipeAction {
                dir: SwipeDir::Down,
                effect: SwipeEffect::CoverPit {
                    target: downbox,
                    pit,
                },
            },
        );
        downbox
    }

    /// A raised ramp; swiped down it lifts the hero over what follows,
    /// left up it is a wall of death
    ///
    /// The hero passes through the square body (the ramp image is a
    /// triangle), so the ramp is a sensor and the collision policy
    /// decides between launch and death.
    pub fn add_ramp(&mut self, x: f32, enemy_after: bool) -> EntityId {
        let ramp = self.add_square_obstacle(x, 0.0, RAMP_WIDTH, RAMP_HEIGHT, "ramp.png");
        let touch = self.add_square_obstacle(
            x - TOUCH_PADDING,
            -TOUCH_PADDING,
            BOX_WIDTH + TOUCH_PADDING * 2.0,
            BOX_HEIGHT + TOUCH_PADDING * 2.0,
            "invis.png",
        );
        self.set_damp(touch, 1.0);
        self.set_damp(ramp, 1.0);
        if let Some(data) = self.entities.get_mut(ramp).and_then(|e| e.obstacle_mut()) {
            data.damp = None;
        }
        self.rotate_obstacle(ramp, -std::f32::consts::FRAC_PI_4);
        self.set_obstacle_role(ramp, ObstacleRole::Ramp { lowered: false });
        self.arm_swipe(
            touch,
            SwipeAction {
                dir: SwipeDir::Down,
                effect: SwipeEffect::LowerRamp { ramp },
            },
        );

        if enemy_after {
            self.add_stationary_enemy(
                x + RAMP_WIDTH + 10.0,
                FLOOR_TOP - ENEMY_HEIGHT,
                ENEMY_WIDTH,
                ENEMY_HEIGHT,
                "boss.png",
            );
        }
        ramp
    }

    /// A trapdoor with an enemy standing on it; swiped right, the door
    /// opens and the enemy falls into the pit
    pub fn add_trapdoor(&mut self, x: f32) -> EntityId {
        let y = FLOOR_TOP;
        let hole = self.add_square_obstacle(x, FLOOR_TOP, PIT_WIDTH, PIT_HEIGHT, "ground_hole.png");
        let door = self.add_square_obstacle(x, y, TRAPDOOR_WIDTH, TRAPDOOR_HEIGHT, "trapdoor.png");
        let closed = self.add_square_obstacle(
            x + TRAPDOOR_WIDTH,
            y,
            PIT_WIDTH - TRAPDOOR_WIDTH,
            TRAPDOOR_HEIGHT,
            "ground.png",
        );
        let enemy = self.add_stationary_enemy(
            x + 5.0,
            y - ENEMY_HEIGHT,
            ENEMY_WIDTH,
            ENEMY_HEIGHT,
            "boss.png",
        );
        let swipe_area = self.add_square_obstacle(
            x - 15.0,
            y - TRAPDOOR_WIDTH + 10.0,
            TRAPDOOR_WIDTH + 30.0,
            70.0,
            "invis.png",
        );

        self.set_damp(hole, 1.0);
        self.set_damp(door, 1.0);
        self.set_damp(closed, 1.0);
        self.set_damp(swipe_area, 1.0);

        self.arm_swipe(
            swipe_area,
            SwipeAction {
                dir: SwipeDir::Right,
                effect: SwipeEffect::DropEnemy { door, enemy },
            },
        );
        door
    }
}

/// Execute a consumed swipe action's scripted transition
pub(crate) fn run_swipe_effect(level: &mut Level, effect: SwipeEffect) {
    match effect {
        SwipeEffect::RaiseBox { target } => {
            let (Some(pos), Some(size)) = (
                level.position(target),
                level.entities.get(target).map(|e| e.size),
            ) else {
                return;
            };
            let dest = Vec2::new(pos.x, RAIL_Y + size.y * 0.5);
            level.start_path(target, vec![pos, dest], 0.5, PathOutcome::None);
        }

        SwipeEffect::CoverPit { target, pit } => {
            let (Some(pos), Some(size)) = (
                level.position(target),
                level.entities.get(target).map(|e| e.size),
            ) else {
                return;
            };
            let dest = Vec2::new(pos.x, FLOOR_TOP + 2.0 + size.y * 0.5);
            level.start_path(target, vec![pos, dest], 0.3, PathOutcome::None);
            // the covered pit can no longer hurt anyone
            level.set_obstacle_role(pit, ObstacleRole::PitCover { armed: false });
        }

        SwipeEffect::LowerRamp { ramp } => {
            let Some(pos) = level.position(ramp) else { return };
            let Some(size) = level.entities.get(ramp).map(|e| e.size) else {
                return;
            };
            let dest = Vec2::new(pos.x, FLOOR_TOP - size.y * 0.5);
            // the lowered flag flips only when the descent completes
            level.start_path(ramp, vec![pos, dest], 1.0, PathOutcome::RampLowered(ramp));
        }

        SwipeEffect::DropEnemy { door, enemy } => {
            if let (Some(pos), Some(size)) = (
                level.position(enemy),
                level.entities.get(enemy).map(|e| e.size),
            ) {
                let dest = pos + Vec2::new(0.0, size.y + 10.0);
                level.start_path(enemy, vec![pos, dest], 0.5, PathOutcome::None);
            }
            if let (Some(pos), Some(size)) = (
                level.position(door),
                level.entities.get(door).map(|e| e.size),
            ) {
                // slide open and back while the enemy falls through
                let open = pos + Vec2::new(size.x, 0.0);
                level.start_path(door, vec![pos, open, pos], 1.0, PathOutcome::None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::BodyConfig;
    use crate::game::collision;
    use crate::game::entities::hero::{HERO_HEIGHT, HERO_WIDTH};
    use crate::game::entities::SwipeState;
    use crate::game::level::{InputEvent, LevelConfig, LevelOutcome};

    fn level() -> Level {
        let mut config = LevelConfig::new(3000.0, 320.0);
        config.gravity = Vec2::ZERO;
        Level::new(config)
    }

    /// The invisible touch area carrying the armed swipe action
    fn armed_touch_area(level: &Level) -> EntityId {
        level
            .entities
            .iter()
            .find(|(_, e)| {
                matches!(
                    e.obstacle().map(|d| d.swipe),
                    Some(SwipeState::Armed(_))
                )
            })
            .map(|(id, _)| id)
            .expect("an armed touch area")
    }

    fn swipe(level: &mut Level, target: EntityId, dir: SwipeDir) {
        let origin = level.entities.get(target).unwrap().top_left();
        let delta = match dir {
            SwipeDir::Up => Vec2::new(0.0, -100.0),
            SwipeDir::Down => Vec2::new(0.0, 100.0),
            SwipeDir::Left => Vec2::new(-100.0, 0.0),
            SwipeDir::Right => Vec2::new(100.0, 0.0),
        };
        level.handle_input(InputEvent::TouchDown {
            target: Some(target),
            at: origin,
        });
        level.handle_input(InputEvent::TouchUp { at: origin + delta });
    }

    fn settle(level: &mut Level) {
        for _ in 0..90 {
            level.tick();
        }
    }

    #[test]
    fn test_upbox_rises_to_rail_on_swipe() {
        let mut level = level();
        let upbox = level.add_upbox(300.0);
        let touch = armed_touch_area(&level);
        swipe(&mut level, touch, SwipeDir::Up);
        settle(&mut level);
        let top = level.entities.get(upbox).unwrap().top_left();
        assert!((top.y - RAIL_Y).abs() < 1.0, "box parked on the rail");
        // the box is still a killer, just out of the running line
        assert_eq!(
            level.entities.get(upbox).unwrap().obstacle().unwrap().role,
            ObstacleRole::Killer
        );
    }

    #[test]
    fn test_unswiped_upbox_kills_hero() {
        let mut level = level();
        let upbox = level.add_upbox(300.0);
        let hero = level.add_hero(0.0, 200.0, HERO_WIDTH, HERO_HEIGHT, "hero.png", BodyConfig::circle());
        collision::dispatch(&mut level, hero, upbox);
        assert_eq!(level.outcome(), LevelOutcome::Lost);
    }

    #[test]
    fn test_downbox_swipe_disarms_pit() {
        let mut level = level();
        level.add_downbox(400.0);
        let pit = level
            .entities
            .iter()
            .find(|(_, e)| {
                matches!(
                    e.obstacle().map(|d| d.role),
                    Some(ObstacleRole::PitCover { armed: true })
                )
            })
            .map(|(id, _)| id)
            .expect("an armed pit cover");
        let hero = level.add_hero(0.0, 200.0, HERO_WIDTH, HERO_HEIGHT, "hero.png", BodyConfig::circle());

        let touch = armed_touch_area(&level);
        swipe(&mut level, touch, SwipeDir::Down);
        settle(&mut level);

        // the neutralized pit no longer kills
        collision::dispatch(&mut level, hero, pit);
        assert_eq!(level.outcome(), LevelOutcome::Playing);
    }

    #[test]
    fn test_armed_pit_kills() {
        let mut level = level();
        level.add_downbox(400.0);
        let pit = level
            .entities
            .iter()
            .find(|(_, e)| {
                matches!(
                    e.obstacle().map(|d| d.role),
                    Some(ObstacleRole::PitCover { armed: true })
                )
            })
            .map(|(id, _)| id)
            .unwrap();
        let hero = level.add_hero(0.0, 200.0, HERO_WIDTH, HERO_HEIGHT, "hero.png", BodyConfig::circle());
        collision::dispatch(&mut level, hero, pit);
        assert_eq!(level.outcome(), LevelOutcome::Lost);
    }

    #[test]
    fn test_raised_ramp_kills_lowered_ramp_launches() {
        let mut level = level();
        let ramp = level.add_ramp(400.0, false);
        let hero = level.add_hero(0.0, 200.0, HERO_WIDTH, HERO_HEIGHT, "hero.png", BodyConfig::circle());
        level.set_hero_velocity(hero, Vec2::new(160.0, 0.0));

        // raised: deadly
        collision::dispatch(&mut level, hero, ramp);
        assert_eq!(level.outcome(), LevelOutcome::Lost);

        // rebuild with the ramp swiped down first
        let mut level = tests_level_with_lowered_ramp();
        let ramp = level
            .entities
            .iter()
            .find(|(_, e)| {
                matches!(
                    e.obstacle().map(|d| d.role),
                    Some(ObstacleRole::Ramp { lowered: true })
                )
            })
            .map(|(id, _)| id)
            .expect("a lowered ramp");
        let hero = level.add_hero(300.0, 200.0, HERO_WIDTH, HERO_HEIGHT, "hero.png", BodyConfig::circle());
        level.set_hero_velocity(hero, Vec2::new(160.0, 0.0));
        collision::dispatch(&mut level, hero, ramp);
        assert!(level.on_path(hero), "lowered ramp sends the hero on a travel path");
        assert_eq!(level.outcome(), LevelOutcome::Playing);
    }

    fn tests_level_with_lowered_ramp() -> Level {
        let mut level = level();
        level.add_ramp(400.0, false);
        let touch = armed_touch_area(&level);
        swipe(&mut level, touch, SwipeDir::Down);
        settle(&mut level);
        level
    }

    #[test]
    fn test_ramp_lowered_flag_waits_for_descent() {
        let mut level = level();
        let ramp = level.add_ramp(400.0, false);
        let touch = armed_touch_area(&level);
        swipe(&mut level, touch, SwipeDir::Down);
        // mid-descent the ramp still counts as raised
        level.tick();
        assert_eq!(
            level.entities.get(ramp).unwrap().obstacle().unwrap().role,
            ObstacleRole::Ramp { lowered: false }
        );
        settle(&mut level);
        assert_eq!(
            level.entities.get(ramp).unwrap().obstacle().unwrap().role,
            ObstacleRole::Ramp { lowered: true }
        );
    }

    #[test]
    fn test_trapdoor_drops_enemy() {
        let mut level = level();
        level.add_trapdoor(500.0);
        let enemy = level
            .entities
            .iter()
            .find(|(_, e)| e.enemy().is_some())
            .map(|(id, _)| id)
            .unwrap();
        let before = level.position(enemy).unwrap();
        let touch = armed_touch_area(&level);
        swipe(&mut level, touch, SwipeDir::Right);
        settle(&mut level);
        let after = level.position(enemy).unwrap();
        assert!(after.y > before.y + ENEMY_HEIGHT, "enemy fell into the pit");
    }

    #[test]
    fn test_ramp_spawns_trailing_enemy() {
        let mut level = level();
        level.add_ramp(400.0, true);
        assert_eq!(level.score().enemies_created, 1);
    }
}
