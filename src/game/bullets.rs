// The bullet pool
//
// A level that shoots configures a fixed-capacity ring of reusable bullet
// entities up front. Shooting reuses the slot under a rotating cursor; if
// that bullet is still in flight the shot is silently dropped, which
// bounds live bullets to the pool capacity. A bullet only returns to the
// pool by colliding with something that hides it.

use glam::Vec2;
use log::debug;

use crate::engine::physics::BodyConfig;
use crate::engine::services::SoundHandle;
use crate::game::entities::{EntityId, EntityKind};
use crate::game::level::Level;

/// Slight undercompensation of gravity, so long shots still drop a little
const GRAVITY_CANCEL: f32 = 0.9;

/// Fixed-capacity ring of reusable bullet entities
pub struct BulletPool {
    slots: Vec<EntityId>,
    cursor: usize,
    velocity: Vec2,
    offset: Vec2,
    pub(crate) hit_sound: Option<SoundHandle>,
}

impl BulletPool {
    /// The pooled bullet entities, in slot order
    pub fn slots(&self) -> &[EntityId] {
        &self.slots
    }
}

impl Level {
    /// Set up the bullet pool; call once per level before shooting
    ///
    /// All bullets are created immediately, parked off screen, hidden and
    /// inactive. `velocity` is applied to every shot; `offset` displaces
    /// the spawn point from the shooter's position.
    pub fn config_bullets(
        &mut self,
        capacity: usize,
        size: Vec2,
        image: &str,
        velocity: Vec2,
        offset: Vec2,
    ) {
        let cfg = BodyConfig::circle()
            .density(1.0)
            .elasticity(0.0)
            .friction(0.0)
            .bullet(true)
            .sensor(true)
            .fixed_rotation(true);
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            let id = self.spawn(
                EntityKind::Bullet,
                -100.0,
                -100.0,
                size.x,
                size.y,
                Some(image),
                Some(cfg),
            );
            self.hide_entity(id);
            slots.push(id);
        }
        self.bullets = Some(BulletPool {
            slots,
            cursor: 0,
            velocity,
            offset,
            hit_sound: None,
        });
    }

    /// Sound to play when a bullet hits an enemy
    pub fn set_bullet_hit_sound(&mut self, name: &str) {
        let sound = self.media.sound(name);
        if let Some(pool) = &mut self.bullets {
            pool.hit_sound = sound;
        }
    }

    /// Shoot a bullet from the shooter's position
    ///
    /// If the slot under the cursor is still in flight the shot is
    /// dropped: no queuing, no error.
    pub fn shoot(&mut self, origin: Vec2) {
        let Some(pool) = &self.bullets else {
            return;
        };
        let slot = pool.slots[pool.cursor];
        if self.entities.get(slot).map(|e| e.visible).unwrap_or(true) {
            debug!("bullet pool exhausted; shot dropped");
            return;
        }
        let (velocity, offset) = (pool.velocity, pool.offset);
        if let Some(pool) = &mut self.bullets {
            pool.cursor = (pool.cursor + 1) % pool.slots.len();
        }

        let spawn_at = origin + offset;
        self.show_entity(slot);
        self.set_entity_position(slot, spawn_at);
        let Some(body) = self.entities.get(slot).and_then(|e| e.body) else {
            return;
        };
        self.physics.set_linvel(body, velocity);
        // roughly cancel gravity so the shot flies straight-ish; the force
        // persists until the slot is recycled
        let gravity = self.physics.gravity();
        let mass = self.physics.mass(body);
        self.physics.reset_forces(body);
        self.physics.add_force(body, -gravity * mass * GRAVITY_CANCEL);
    }

    /// Bullets currently in flight
    pub fn live_bullets(&self) -> usize {
        self.bullets
            .as_ref()
            .map(|pool| {
                pool.slots
                    .iter()
                    .filter(|id| self.entities.get(**id).map(|e| e.visible).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }
}
