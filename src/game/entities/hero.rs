// Heroes are the focus of games: they must reach destinations, collect
// goodies or clear out enemies for the level to complete. They can jump,
// shoot, headbutt, be made invincible, and carry strength that enemy
// damage chips away at. Nearly all interesting collision logic runs on
// the hero's side of the contact.

use glam::Vec2;

use crate::engine::physics::{BodyConfig, BodyKind};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::level::Level;

/// Dimensions of the runner hero
pub const HERO_WIDTH: f32 = 40.0;
pub const HERO_HEIGHT: f32 = 40.0;

/// Seconds during which repeat touches on the hero are swallowed
const TOUCH_COOLDOWN: f32 = 0.25;

/// Per-hero state
pub struct HeroData {
    /// Collisions the hero can sustain; dies at 0. Default 1, against the
    /// default enemy damage of 2, so an unmodified hero dies on contact.
    pub strength: i32,

    /// Level-clock time when invincibility runs out
    pub invincible_until: f32,

    /// Is the hero currently in headbutt mode?
    pub headbutt: bool,

    /// Flip the image when moving backwards
    pub reverse_face: bool,

    /// Touching the hero makes it jump
    pub touch_jump: bool,

    /// Touching the hero makes it shoot
    pub touch_shoot: bool,

    /// Touching the hero starts it moving (one-shot)
    pub touch_and_go: bool,

    /// Configured cruise velocity, restored after scripted travel
    pub velocity: Vec2,

    /// Set while airborne so jumps can't be chained
    pub in_air: bool,

    /// Last accepted touch, for swallowing rapid repeats
    pub last_touch: f32,
}

impl HeroData {
    pub fn new() -> Self {
        Self {
            strength: 1,
            invincible_until: 0.0,
            headbutt: false,
            reverse_face: false,
            touch_jump: false,
            touch_shoot: false,
            touch_and_go: false,
            velocity: Vec2::ZERO,
            in_air: false,
            last_touch: -TOUCH_COOLDOWN,
        }
    }

    pub fn is_invincible(&self, now: f32) -> bool {
        now < self.invincible_until
    }
}

impl Default for HeroData {
    fn default() -> Self {
        Self::new()
    }
}

impl Level {
    /// Draw a hero from its top-left corner
    ///
    /// The last hero created becomes the one touch controls operate on.
    pub fn add_hero(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: &str,
        cfg: BodyConfig,
    ) -> EntityId {
        let cfg = cfg.kind(BodyKind::Dynamic).can_sleep(false);
        let id = self.spawn(EntityKind::Hero(HeroData::new()), x, y, w, h, Some(image), Some(cfg));
        self.score.heroes_created += 1;
        self.register_tilt(id);
        self.last_hero = Some(id);
        id
    }

    /// Record the hero's cruise velocity and add it to the body's motion
    pub fn set_hero_velocity(&mut self, hero: EntityId, velocity: Vec2) {
        if let Some(data) = self.entities.get_mut(hero).and_then(|e| e.hero_mut()) {
            data.velocity = velocity;
        }
        if let Some(body) = self.entities.get(hero).and_then(|e| e.body) {
            let current = self.physics.linvel(body);
            self.physics.set_linvel(body, current + velocity);
        }
    }

    /// Make the hero jump, unless it is already in the air
    pub fn jump(&mut self, hero: EntityId) {
        let airborne = self
            .entities
            .get(hero)
            .and_then(|e| e.hero())
            .map(|h| h.in_air)
            .unwrap_or(true);
        if airborne {
            return;
        }
        if let Some(body) = self.entities.get(hero).and_then(|e| e.body) {
            let v = self.physics.linvel(body);
            self.physics.set_linvel(body, v + self.jump_impulse);
        }
        if let Some(data) = self.entities.get_mut(hero).and_then(|e| e.hero_mut()) {
            data.in_air = true;
        }
    }

    /// Put the hero in headbutt mode (rotated a quarter turn)
    pub fn headbutt_on(&mut self, hero: EntityId) {
        if let Some(data) = self.entities.get_mut(hero).and_then(|e| e.hero_mut()) {
            data.headbutt = true;
        }
        if let Some(body) = self.entities.get(hero).and_then(|e| e.body) {
            let pos = self.physics.translation(body).unwrap_or_default();
            self.physics.set_pose(body, pos, std::f32::consts::FRAC_PI_2);
        }
    }

    /// Take the hero out of headbutt mode
    pub fn headbutt_off(&mut self, hero: EntityId) {
        if let Some(data) = self.entities.get_mut(hero).and_then(|e| e.hero_mut()) {
            data.headbutt = false;
        }
        if let Some(body) = self.entities.get(hero).and_then(|e| e.body) {
            let pos = self.physics.translation(body).unwrap_or_default();
            self.physics.set_pose(body, pos, 0.0);
        }
    }

    /// Hero touch controls: jump, go, or shoot, with rapid-touch swallow
    pub(crate) fn hero_touched(&mut self, hero: EntityId) {
        let now = self.clock;
        let Some(data) = self.entities.get_mut(hero).and_then(|e| e.hero_mut()) else {
            return;
        };
        if now < data.last_touch + TOUCH_COOLDOWN {
            return;
        }
        data.last_touch = now;
        let jump = data.touch_jump;
        let shoot = data.touch_shoot;
        let go = if data.touch_and_go {
            // one-shot: a second touch must not re-launch
            data.touch_and_go = false;
            Some(data.velocity)
        } else {
            None
        };
        if jump {
            self.jump(hero);
        }
        if let Some(velocity) = go {
            if let Some(body) = self.entities.get(hero).and_then(|e| e.body) {
                let current = self.physics.linvel(body);
                self.physics.set_linvel(body, current + velocity);
            }
        }
        if shoot {
            if let Some(pos) = self.position(hero) {
                self.shoot(pos);
            }
        }
    }

    /// Kill a hero; loses the level when it was the last one standing
    pub(crate) fn kill_hero(&mut self, hero: EntityId, message: &str) {
        self.hide_entity(hero);
        self.score.heroes_destroyed += 1;
        if self.score.heroes_destroyed == self.score.heroes_created {
            self.lose(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::game::level::{LevelConfig, LevelOutcome};

    fn level() -> Level {
        let mut config = LevelConfig::new(900.0, 320.0);
        config.gravity = Vec2::ZERO;
        Level::new(config)
    }

    fn hero(level: &mut Level) -> EntityId {
        level.add_hero(0.0, 200.0, HERO_WIDTH, HERO_HEIGHT, "hero.png", BodyConfig::circle())
    }

    #[test]
    fn test_add_hero_counts_and_targets() {
        let mut level = level();
        let id = hero(&mut level);
        assert_eq!(level.score().heroes_created, 1);
        assert_eq!(level.last_hero, Some(id));
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut level = level();
        let id = hero(&mut level);
        level.set_jump_impulses(0.0, -90.0);
        level.jump(id);
        let body = level.entities.get(id).unwrap().body.unwrap();
        assert_eq!(level.physics.linvel(body), Vec2::new(0.0, -90.0));
        // Airborne now: a second jump must not add more impulse
        level.jump(id);
        assert_eq!(level.physics.linvel(body), Vec2::new(0.0, -90.0));
    }

    #[test]
    fn test_headbutt_rotates_hero() {
        let mut level = level();
        let id = hero(&mut level);
        level.headbutt_on(id);
        assert!(level.entities.get(id).unwrap().hero().unwrap().headbutt);
        let body = level.entities.get(id).unwrap().body.unwrap();
        assert_relative_eq!(
            level.physics.angle(body),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-4
        );
        level.headbutt_off(id);
        assert!(!level.entities.get(id).unwrap().hero().unwrap().headbutt);
    }

    #[test]
    fn test_touch_and_go_is_one_shot() {
        let mut level = level();
        let id = hero(&mut level);
        {
            let data = level.entities.get_mut(id).unwrap().hero_mut().unwrap();
            data.touch_and_go = true;
            data.velocity = Vec2::new(160.0, 0.0);
        }
        level.hero_touched(id);
        let body = level.entities.get(id).unwrap().body.unwrap();
        assert_eq!(level.physics.linvel(body).x, 160.0);
        // Cooldown passes, but touch-and-go was consumed
        level.clock += 1.0;
        level.hero_touched(id);
        assert_eq!(level.physics.linvel(body).x, 160.0);
    }

    #[test]
    fn test_last_hero_death_loses_level() {
        let mut level = level();
        let id = hero(&mut level);
        level.kill_hero(id, "Try again");
        assert_eq!(level.outcome(), LevelOutcome::Lost);
        assert!(!level.entities.get(id).unwrap().visible);
    }

    #[test]
    fn test_surviving_hero_defers_loss() {
        let mut level = level();
        let first = hero(&mut level);
        let _second = hero(&mut level);
        level.kill_hero(first, "Try again");
        assert_eq!(level.outcome(), LevelOutcome::Playing);
    }
}
