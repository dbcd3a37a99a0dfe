// The infinite level streamer
//
// Survival mode has no fixed end: content is generated one window ahead
// of the camera and retired once it falls behind, so the working set
// stays around two windows no matter how far the hero runs. Each window
// plants an invisible trigger at its frontier carrying the next hero
// speed; crossing it generates the window after, a little harder.

use glam::Vec2;
use log::{debug, info};
use rand::Rng;

use crate::engine::physics::{BodyConfig, BodyKind};
use crate::game::entities::hero::{HERO_HEIGHT, HERO_WIDTH};
use crate::game::entities::{EntityKind, ObstacleRole};
use crate::game::level::{Level, FLOOR_HEIGHT, FLOOR_TOP, PIXELS_PER_METER};

/// One generation step's worth of world, in world units
/// (two background tiles at parallax factor 4)
pub const STREAM_WINDOW: f32 = 2320.0;

const PARALLAX_FACTOR: f32 = 4.0;

const SHELF_WIDTH: f32 = 161.0;
const SHELF_HEIGHT: f32 = 125.0;
const I_BEAM_WIDTH: f32 = 91.0;
const I_BEAM_HEIGHT: f32 = 150.0;
const CHAINS_WIDTH: f32 = 200.0;
const CHAINS_HEIGHT: f32 = 77.0;

/// Hazard count stops scaling linearly at this speed and jitters instead
const SPEED_CAP: u32 = 8;

impl Level {
    /// Begin an endless run at the given hero speed
    pub fn start_infinite(&mut self, speed: u32) {
        self.extend_world(speed, 0.0);
    }

    /// Extend the world from `origin_x`
    ///
    /// The initial call (`origin_x == 0`) attaches the background,
    /// decorates the first stretch and creates the running hero. Every
    /// later call retires the geometry the hero has passed, then fills
    /// `[origin_x + camera, origin_x + camera + window)` with scenery and
    /// hazards. The floor tile is always redrawn for the whole window,
    /// overlapping the previous one so no seam opens under the hero.
    pub(crate) fn extend_world(&mut self, speed: u32, origin_x: f32) {
        let camera = self.config.camera_width;
        let start = origin_x + camera;
        let end = start + STREAM_WINDOW;
        info!("streaming window [{start}, {end}) at speed {speed}");

        if origin_x == 0.0 {
            let background = self.media.image("background.png");
            self.scene.set_background(background, -1.0 / PARALLAX_FACTOR);
            // keep the first camera width clear so the start is survivable
            self.decorate(camera, end, (end / 2000.0) as u32);
            let hero = self.add_hero(
                0.0,
                FLOOR_TOP - HERO_HEIGHT,
                HERO_WIDTH,
                HERO_HEIGHT,
                "hero.png",
                BodyConfig::circle().density(1.0).elasticity(0.0).friction(0.0),
            );
            self.set_hero_velocity(hero, Vec2::new(speed as f32 * PIXELS_PER_METER, 0.0));
        } else {
            self.retire_behind(origin_x);
            self.decorate(start, end, (STREAM_WINDOW / 2000.0) as u32);
        }

        self.add_square_obstacle(
            origin_x,
            FLOOR_TOP,
            STREAM_WINDOW + camera * 2.0,
            FLOOR_HEIGHT,
            "ground.png",
        );

        // difficulty: density scales with speed until the cap, then jitters
        let hazards = if speed < SPEED_CAP {
            speed + 1
        } else {
            SPEED_CAP + self.rng.gen_range(0..4)
        };
        self.add_random_hazards(start, end, hazards);
        self.add_stream_trigger(end, speed + 1);
    }

    /// Scatter factory scenery across `[start, end)`
    fn decorate(&mut self, start: f32, end: f32, count: u32) {
        if count == 0 || end <= start {
            return;
        }
        let step = (end - start) / count as f32;
        let mut x = start;
        while x < end {
            match self.rng.gen_range(0..3) {
                0 => self.add_decoration(x, 0.0, CHAINS_WIDTH, CHAINS_HEIGHT, "chains.png"),
                1 => self.add_decoration(x, 0.0, I_BEAM_WIDTH, I_BEAM_HEIGHT, "i-beam.png"),
                _ => self.add_decoration(
                    x,
                    FLOOR_TOP - SHELF_HEIGHT,
                    SHELF_WIDTH,
                    SHELF_HEIGHT,
                    "shelf.png",
                ),
            };
            x += step;
        }
    }

    /// Spread a random mix of hazards across `[start, end)`
    fn add_random_hazards(&mut self, start: f32, end: f32, count: u32) {
        if count == 0 || end <= start {
            return;
        }
        let step = (end - start) / count as f32;
        let mut x = start;
        while x < end {
            match self.rng.gen_range(0..4) {
                0 => self.add_upbox(x),
                1 => self.add_downbox(x),
                2 => self.add_ramp(x, true),
                _ => self.add_trapdoor(x),
            };
            x += step;
        }
    }

    /// Plant the invisible trigger that extends the world when crossed
    fn add_stream_trigger(&mut self, frontier: f32, next_speed: u32) {
        let trigger = self.add_obstacle(
            frontier - 5.0,
            FLOOR_TOP - HERO_HEIGHT,
            5.0,
            HERO_HEIGHT,
            "invis.png",
            BodyConfig::box_shape().kind(BodyKind::Static).sensor(true),
        );
        self.set_obstacle_role(trigger, ObstacleRole::StreamTrigger { speed: next_speed });
    }

    /// Retire world content strictly behind `x`
    ///
    /// Floor tiles are identified by sitting exactly on the window stride
    /// and are kept, so the ground never opens up under the hero. Heroes
    /// and pooled bullets are never streamed out.
    fn retire_behind(&mut self, x: f32) {
        let stride = (self.config.camera_width + STREAM_WINDOW) as i64;
        let mut retired = 0usize;
        for id in self.entities.ids() {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            if matches!(entity.kind, EntityKind::Hero(_) | EntityKind::Bullet) {
                continue;
            }
            let left = entity.top_left().x;
            if left >= x {
                continue;
            }
            if (left.round() as i64).rem_euclid(stride) == 0 {
                continue;
            }
            self.retire_entity(id);
            retired += 1;
        }
        debug!("retired {retired} entities behind x {x}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::LevelConfig;

    fn infinite_level() -> Level {
        Level::new(LevelConfig::infinite())
    }

    /// Is there a full-height floor tile under `x`?
    fn floor_covers(level: &Level, x: f32) -> bool {
        level.entities.iter().any(|(_, e)| {
            let Some(data) = e.obstacle() else { return false };
            if data.role != ObstacleRole::Plain {
                return false;
            }
            let top_left = e.top_left();
            e.size.y == FLOOR_HEIGHT
                && top_left.y == FLOOR_TOP
                && top_left.x <= x
                && x <= top_left.x + e.size.x
        })
    }

    fn stream_trigger_speed(level: &Level) -> Option<u32> {
        level.entities.iter().find_map(|(_, e)| match e.obstacle().map(|d| d.role) {
            Some(ObstacleRole::StreamTrigger { speed }) => Some(speed),
            _ => None,
        })
    }

    #[test]
    fn test_initial_call_creates_running_hero() {
        let mut level = infinite_level();
        level.start_infinite(5);
        let hero = level.last_hero.expect("streamer creates the hero");
        let body = level.entities.get(hero).unwrap().body.unwrap();
        assert_eq!(
            level.physics.linvel(body),
            Vec2::new(5.0 * PIXELS_PER_METER, 0.0)
        );
        assert!(floor_covers(&level, 100.0));
        assert_eq!(stream_trigger_speed(&level), Some(6));
    }

    #[test]
    fn test_extension_advances_trigger_speed() {
        let mut level = infinite_level();
        level.start_infinite(5);
        let frontier = level.config.camera_width + STREAM_WINDOW;
        level.extend_world(6, frontier);
        // the old trigger was retired; the new one carries speed + 1
        assert_eq!(stream_trigger_speed(&level), Some(7));
    }

    #[test]
    fn test_working_set_is_bounded() {
        let mut level = infinite_level();
        level.start_infinite(5);
        let stride = level.config.camera_width + STREAM_WINDOW;
        let mut origin = stride;
        let mut max_live = level.entities.len();
        for step in 0..12u32 {
            level.extend_world(6 + step, origin);
            max_live = max_live.max(level.entities.len());
            origin += stride;
        }
        // roughly two windows of content, regardless of total distance
        assert!(
            max_live < 400,
            "working set grew to {max_live}, expected a bounded streamer"
        );
    }

    #[test]
    fn test_floor_is_always_under_the_hero() {
        let mut level = infinite_level();
        level.start_infinite(5);
        let stride = level.config.camera_width + STREAM_WINDOW;
        let mut origin = stride;
        for step in 0..6u32 {
            level.extend_world(6 + step, origin);
            // the hero stands just past the trigger it crossed
            assert!(
                floor_covers(&level, origin + 10.0),
                "floor missing at extension {step}"
            );
            // and the new window's floor is already down
            assert!(floor_covers(&level, origin + stride - 10.0));
            origin += stride;
        }
    }

    #[test]
    fn test_retirement_clears_passed_hazards() {
        let mut level = infinite_level();
        level.start_infinite(7);
        let before = level.entities.len();
        let stride = level.config.camera_width + STREAM_WINDOW;
        level.extend_world(8, stride);
        level.extend_world(9, stride * 2.0);
        level.extend_world(10, stride * 3.0);
        // content behind the camera is gone, so three extensions later the
        // arena is nowhere near three windows deep
        assert!(level.entities.len() < before * 3);
        // nothing but floor (and the hero) survives far behind the camera
        let stale = level
            .entities
            .iter()
            .filter(|(_, e)| {
                e.top_left().x < stride && e.enemy().is_some()
            })
            .count();
        assert_eq!(stale, 0, "enemies behind the camera must be retired");
    }

    #[test]
    fn test_hero_survives_retirement() {
        let mut level = infinite_level();
        level.start_infinite(5);
        let hero = level.last_hero.unwrap();
        let stride = level.config.camera_width + STREAM_WINDOW;
        level.extend_world(6, stride);
        assert!(level.entities.contains(hero));
    }
}
