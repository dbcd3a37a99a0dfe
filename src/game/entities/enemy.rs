// Enemies are things to be avoided or killed by the hero. Every enemy can
// be killed by bullets, by an invincible hero, or by a hero strong enough
// to absorb its damage. A reproducing enemy spawns copies of itself on an
// interval, with each child inheriting only the budget the parent has
// left, so the total population is always finite.

use rand::Rng;

use crate::engine::physics::{BodyConfig, BodyKind, ShapeKind};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::level::{Level, TimerKind};

/// Dimensions of the standard boss enemy used by the hazards
pub const ENEMY_WIDTH: f32 = 30.0;
pub const ENEMY_HEIGHT: f32 = 70.0;

/// Per-enemy state
pub struct EnemyData {
    /// Damage dealt to a hero on contact. Default 2 against the default
    /// hero strength of 1, so the enemy kills but survives.
    pub damage: i32,

    /// Can a headbutting hero kill this enemy?
    pub kill_by_headbutt: bool,

    /// Message shown when this enemy kills the last hero
    pub kill_text: String,

    /// Remaining reproduction cycles
    pub reproductions: u32,

    /// Seconds between reproductions
    pub reproduce_interval: f32,

    /// Enemies spawned per cycle
    pub reproduce_spawn: u32,

    /// Does this enemy hold its position?
    pub stationary: bool,

    /// Does this enemy react to tilt?
    pub tilts: bool,

    /// Body template, kept so children can be spawned alike
    pub shape: ShapeKind,
    pub density: f32,
    pub elasticity: f32,
    pub friction: f32,
}

impl EnemyData {
    pub fn new() -> Self {
        Self {
            damage: 2,
            kill_by_headbutt: false,
            kill_text: "Try again".to_string(),
            reproductions: 0,
            reproduce_interval: 0.0,
            reproduce_spawn: 0,
            stationary: true,
            tilts: false,
            shape: ShapeKind::Circle,
            density: 1.0,
            elasticity: 0.0,
            friction: 1.0,
        }
    }
}

impl Default for EnemyData {
    fn default() -> Self {
        Self::new()
    }
}

impl Level {
    /// Draw an enemy from its top-left corner
    pub fn add_enemy(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: &str,
        shape: ShapeKind,
        density: f32,
        elasticity: f32,
        friction: f32,
        stationary: bool,
    ) -> EntityId {
        let cfg = BodyConfig::new(shape)
            .kind(if stationary {
                BodyKind::Static
            } else {
                BodyKind::Dynamic
            })
            .density(density)
            .elasticity(elasticity)
            .friction(friction);
        let mut data = EnemyData::new();
        data.stationary = stationary;
        data.shape = shape;
        data.density = density;
        data.elasticity = elasticity;
        data.friction = friction;
        let id = self.spawn(EntityKind::Enemy(data), x, y, w, h, Some(image), Some(cfg));
        self.score.enemies_created += 1;
        id
    }

    /// Stationary circle enemy with the default material
    pub fn add_stationary_enemy(&mut self, x: f32, y: f32, w: f32, h: f32, image: &str) -> EntityId {
        self.add_enemy(x, y, w, h, image, ShapeKind::Circle, 1.0, 0.0, 1.0, true)
    }

    /// Make an enemy react to tilt (movable enemies only)
    pub fn set_enemy_tilts(&mut self, enemy: EntityId) {
        let movable = self
            .entities
            .get_mut(enemy)
            .and_then(|e| e.enemy_mut())
            .map(|d| {
                if !d.stationary && !d.tilts {
                    d.tilts = true;
                    true
                } else {
                    false
                }
            })
            .unwrap_or(false);
        if movable {
            self.register_tilt(enemy);
        }
    }

    /// Headbutt-killable enemies become sensors so the killing blow
    /// doesn't ricochet the hero
    pub fn set_kill_by_headbutt(&mut self, enemy: EntityId) {
        if let Some(data) = self.entities.get_mut(enemy).and_then(|e| e.enemy_mut()) {
            data.kill_by_headbutt = true;
        }
        if let Some(body) = self.entities.get(enemy).and_then(|e| e.body) {
            self.physics.set_sensor(body, true);
        }
    }

    /// Arm reproduction: `count` cycles of `per_cycle` children every
    /// `interval` seconds
    pub fn set_reproductions(&mut self, enemy: EntityId, count: u32, interval: f32, per_cycle: u32) {
        if let Some(data) = self.entities.get_mut(enemy).and_then(|e| e.enemy_mut()) {
            data.reproductions = count;
            data.reproduce_interval = interval;
            data.reproduce_spawn = per_cycle;
        }
        if count > 0 {
            self.timers.schedule(interval, TimerKind::Reproduce { enemy });
        }
    }

    /// Destroy an enemy, counting toward an enemy-count victory
    pub(crate) fn destroy_enemy(&mut self, enemy: EntityId) {
        self.hide_entity(enemy);
        self.score.enemies_destroyed += 1;
        if self.score.enemies_destroyed == self.score.enemies_created
            && self.victory == crate::game::level::Victory::EnemyCount
        {
            self.win();
        }
    }
}

/// Reproduction timer handler: spawn this cycle's children and re-arm
///
/// Children are placed near the parent (occasionally far away), clamped
/// to the scene, and inherit the parent's post-decrement budget, which
/// bounds the total population for any finite starting budget.
pub(crate) fn reproduce(level: &mut Level, enemy: EntityId) {
    let Some(entity) = level.entities.get(enemy) else {
        return;
    };
    // dead enemies don't reproduce
    if !entity.visible {
        return;
    }
    let Some(data) = entity.enemy() else { return };
    if data.reproductions == 0 {
        return;
    }
    let parent_pos = entity.top_left();
    let size = entity.size;
    let texture = entity.texture;
    let template = (
        data.shape,
        data.density,
        data.elasticity,
        data.friction,
        data.stationary,
        data.tilts,
        data.damage,
        data.kill_by_headbutt,
        data.kill_text.clone(),
        data.reproduce_interval,
        data.reproduce_spawn,
    );

    let Some(data) = level.entities.get_mut(enemy).and_then(|e| e.enemy_mut()) else {
        return;
    };
    data.reproductions -= 1;
    let remaining = data.reproductions;

    let (shape, density, elasticity, friction, stationary, tilts, damage, headbutt, kill_text, interval, spawn) =
        template;

    for _ in 0..spawn {
        let dice = level.rng.gen_range(0..10);
        let (dx, dy) = if dice >= 9 {
            // occasionally place a child far away
            (
                level.rng.gen_range(0..200) as f32 - 50.0,
                level.rng.gen_range(0..100) as f32 - 50.0,
            )
        } else {
            (
                level.rng.gen_range(0..10) as f32 - 5.0,
                level.rng.gen_range(0..10) as f32 - 5.0,
            )
        };
        let x = (parent_pos.x + dx).clamp(0.0, level.config.width);
        let y = (parent_pos.y + dy).clamp(0.0, level.config.height);
        // build the child exactly like its parent, reusing the texture
        let cfg = BodyConfig::new(shape)
            .kind(if stationary {
                BodyKind::Static
            } else {
                BodyKind::Dynamic
            })
            .density(density)
            .elasticity(elasticity)
            .friction(friction);
        let mut data = EnemyData::new();
        data.stationary = stationary;
        data.shape = shape;
        data.density = density;
        data.elasticity = elasticity;
        data.friction = friction;
        data.damage = damage;
        data.kill_text = kill_text.clone();
        let child = level.spawn(EntityKind::Enemy(data), x, y, size.x, size.y, None, Some(cfg));
        level.score.enemies_created += 1;
        if let Some(e) = level.entities.get_mut(child) {
            e.texture = texture;
        }
        if tilts {
            level.set_enemy_tilts(child);
        }
        if headbutt {
            level.set_kill_by_headbutt(child);
        }
        // children inherit only what the parent has left
        if remaining > 0 {
            level.set_reproductions(child, remaining, interval, spawn);
        }
    }

    if remaining > 0 {
        level
            .timers
            .schedule(interval, TimerKind::Reproduce { enemy });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::{LevelConfig, LevelOutcome, Victory};

    fn level() -> Level {
        let mut config = LevelConfig::new(900.0, 320.0);
        config.gravity = glam::Vec2::ZERO;
        Level::new(config)
    }

    fn count_enemies(level: &Level) -> usize {
        level
            .entities
            .iter()
            .filter(|(_, e)| e.enemy().is_some())
            .count()
    }

    #[test]
    fn test_destroying_all_enemies_wins() {
        let mut level = level();
        level.set_victory_enemy_count();
        let a = level.add_stationary_enemy(100.0, 100.0, ENEMY_WIDTH, ENEMY_HEIGHT, "boss.png");
        let b = level.add_stationary_enemy(200.0, 100.0, ENEMY_WIDTH, ENEMY_HEIGHT, "boss.png");
        level.destroy_enemy(a);
        assert_eq!(level.outcome(), LevelOutcome::Playing);
        level.destroy_enemy(b);
        assert_eq!(level.outcome(), LevelOutcome::Won);
        assert_eq!(level.victory, Victory::EnemyCount);
    }

    #[test]
    fn test_reproduction_spawns_children() {
        let mut level = level();
        let parent = level.add_stationary_enemy(100.0, 100.0, 30.0, 30.0, "boss.png");
        level.set_reproductions(parent, 1, 0.5, 3);
        for _ in 0..40 {
            level.tick();
        }
        assert_eq!(count_enemies(&level), 4);
    }

    #[test]
    fn test_children_inherit_reduced_budget() {
        let mut level = level();
        let parent = level.add_stationary_enemy(100.0, 100.0, 30.0, 30.0, "boss.png");
        level.set_reproductions(parent, 2, 0.5, 1);
        for _ in 0..40 {
            level.tick();
        }
        // One cycle has passed: the single child's budget must be <= 1
        for (id, e) in level.entities.iter() {
            if id != parent {
                if let Some(d) = e.enemy() {
                    assert!(d.reproductions <= 1);
                }
            }
        }
    }

    #[test]
    fn test_reproduction_budget_terminates() {
        let mut level = level();
        let parent = level.add_stationary_enemy(100.0, 100.0, 30.0, 30.0, "boss.png");
        level.set_reproductions(parent, 2, 0.1, 2);
        // Run far past every possible reproduction interval
        for _ in 0..600 {
            level.tick();
        }
        let population = count_enemies(&level);
        // R=2, K=2: parent spawns 2+2, first-cycle children spawn 2 each
        assert!(population <= 9, "population {population} should be bounded");
        assert!(level.timers.is_empty(), "all reproduction timers must expire");
    }

    #[test]
    fn test_dead_enemies_do_not_reproduce() {
        let mut level = level();
        let parent = level.add_stationary_enemy(100.0, 100.0, 30.0, 30.0, "boss.png");
        level.set_reproductions(parent, 3, 0.2, 2);
        level.hide_entity(parent);
        for _ in 0..60 {
            level.tick();
        }
        assert_eq!(count_enemies(&level), 1);
    }
}
