// Entity taxonomy
//
// Every game object is one `Entity` record: a shared visibility/activation
// component, an optional physics body, and a tagged `EntityKind` carrying
// the per-variant data. Collision handling dispatches on the tag; the fixed
// per-variant priority decides which side of a contact reacts.

pub mod destination;
pub mod enemy;
pub mod goodie;
pub mod hero;
pub mod obstacle;

pub use destination::DestinationData;
pub use enemy::EnemyData;
pub use goodie::GoodieData;
pub use hero::HeroData;
pub use obstacle::{ObstacleData, ObstacleRole, SwipeAction, SwipeDir, SwipeEffect, SwipeState, TouchBehavior};

use crate::engine::physics::RigidBodyHandle;
use crate::engine::services::{SoundHandle, TextureHandle};
use glam::Vec2;

/// Stable identifier for an entity in the arena
///
/// Carries a generation so a retired slot reused by the streamer never
/// aliases a stale reference held by a timer or swipe action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Pack into the u64 form used by the physics and scene mappings
    pub fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

/// The per-variant tag and data of an entity
pub enum EntityKind {
    Hero(HeroData),
    Enemy(EnemyData),
    Goodie(GoodieData),
    Bullet,
    Obstacle(ObstacleData),
    /// Static line segment from a vector drawing
    Svg,
    Destination(DestinationData),
    /// Visual-only scenery; no physics body, never collides
    Decoration,
}

impl EntityKind {
    /// Collision-dispatch priority; the lower value handles the contact.
    ///
    /// Only the relative order matters: the hero reacts to everything,
    /// enemies react to bullets, destinations react to nothing.
    pub fn priority(&self) -> u8 {
        match self {
            EntityKind::Hero(_) => 1,
            EntityKind::Enemy(_) => 2,
            EntityKind::Goodie(_) => 3,
            EntityKind::Bullet => 4,
            EntityKind::Obstacle(_) => 5,
            EntityKind::Svg => 6,
            EntityKind::Destination(_) => 7,
            EntityKind::Decoration => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Hero(_) => "hero",
            EntityKind::Enemy(_) => "enemy",
            EntityKind::Goodie(_) => "goodie",
            EntityKind::Bullet => "bullet",
            EntityKind::Obstacle(_) => "obstacle",
            EntityKind::Svg => "svg",
            EntityKind::Destination(_) => "destination",
            EntityKind::Decoration => "decoration",
        }
    }
}

/// A game object: shared component plus tagged per-variant data
pub struct Entity {
    pub kind: EntityKind,

    /// Physics body, absent for decorations
    pub body: Option<RigidBodyHandle>,

    /// Drawn by the renderer?
    pub visible: bool,

    /// Simulated by the physics world? Never true while invisible.
    pub active: bool,

    /// Center position; authoritative for body-less entities, refreshed
    /// from the physics world each tick otherwise
    pub pos: Vec2,

    /// Extents (width, height)
    pub size: Vec2,

    /// Image shown by the renderer, if the lookup hit
    pub texture: Option<TextureHandle>,

    /// Sound played when a hero collides with this entity
    pub hit_sound: Option<SoundHandle>,
}

impl Entity {
    pub fn new(kind: EntityKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            body: None,
            visible: true,
            active: true,
            pos,
            size,
            texture: None,
            hit_sound: None,
        }
    }

    pub fn priority(&self) -> u8 {
        self.kind.priority()
    }

    /// Top-left corner, the reference point for gesture displacement
    pub fn top_left(&self) -> Vec2 {
        self.pos - self.size * 0.5
    }

    pub fn hero(&self) -> Option<&HeroData> {
        match &self.kind {
            EntityKind::Hero(data) => Some(data),
            _ => None,
        }
    }

    pub fn hero_mut(&mut self) -> Option<&mut HeroData> {
        match &mut self.kind {
            EntityKind::Hero(data) => Some(data),
            _ => None,
        }
    }

    pub fn enemy(&self) -> Option<&EnemyData> {
        match &self.kind {
            EntityKind::Enemy(data) => Some(data),
            _ => None,
        }
    }

    pub fn enemy_mut(&mut self) -> Option<&mut EnemyData> {
        match &mut self.kind {
            EntityKind::Enemy(data) => Some(data),
            _ => None,
        }
    }

    pub fn goodie(&self) -> Option<&GoodieData> {
        match &self.kind {
            EntityKind::Goodie(data) => Some(data),
            _ => None,
        }
    }

    pub fn obstacle(&self) -> Option<&ObstacleData> {
        match &self.kind {
            EntityKind::Obstacle(data) => Some(data),
            _ => None,
        }
    }

    pub fn obstacle_mut(&mut self) -> Option<&mut ObstacleData> {
        match &mut self.kind {
            EntityKind::Obstacle(data) => Some(data),
            _ => None,
        }
    }

    pub fn destination_mut(&mut self) -> Option<&mut DestinationData> {
        match &mut self.kind {
            EntityKind::Destination(data) => Some(data),
            _ => None,
        }
    }
}

struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Generational arena holding every entity of the current level
///
/// Retired slots go on a free list so an endless level reuses memory
/// instead of growing; the generation bump invalidates old ids.
#[derive(Default)]
pub struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entity = Some(entity);
            EntityId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entity: Some(entity),
            });
            EntityId {
                index,
                generation: 0,
            }
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Remove an entity, bumping the slot generation so the id goes stale
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || slot.entity.is_none() {
            return None;
        }
        let entity = slot.entity.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        entity
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.entity.as_ref().map(|e| {
                (
                    EntityId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    e,
                )
            })
        })
    }

    /// Snapshot of every live id, for passes that mutate while iterating
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }
}
