// The level session
//
// One `Level` owns everything a playable scene needs: the physics world,
// the entity arena, pools, timers, travel paths, gesture state, score and
// victory tracking, and the collaborator handles. There are no globals:
// tearing a level down is dropping it, which also drops every pending
// timer and handler atomically with the scene.

use glam::Vec2;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::core::math::{clamp, lerp_vec2};
use crate::engine::physics::{BodyConfig, PhysicsWorld};
use crate::engine::services::{
    AudioSink, MediaProvider, MusicHandle, NullAudio, NullMedia, NullScene, SceneGraph, SoundHandle,
};
use crate::engine::timer::TimerQueue;
use crate::game::bullets::BulletPool;
use crate::game::collision;
use crate::game::entities::{Entity, EntityArena, EntityId, EntityKind};
use crate::game::gestures::GestureState;

/// Conversion between the original pixel-art units and physics units
pub const PIXELS_PER_METER: f32 = 32.0;

/// Height of the tiled factory floor
pub const FLOOR_HEIGHT: f32 = 80.0;

/// Top edge of the floor (scene height 320, y grows downward)
pub const FLOOR_TOP: f32 = 320.0 - FLOOR_HEIGHT;

/// Top edge of things parked at the top of the screen (raised boxes, ramps)
pub const TOP_RAIL: f32 = 10.0;

/// How a level is won
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Victory {
    /// This many heroes must reach destinations
    Destination(u32),
    /// This many goodies must be collected
    GoodieCount(u32),
    /// Every enemy must be destroyed
    EnemyCount,
}

/// Whether the level is still in play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    Playing,
    Won,
    Lost,
}

/// Events the level reports outward; the host drains them each frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The victory condition was met. Fires at most once per level.
    Won,
    /// The last hero died. Fires at most once per level.
    Lost { message: String },
    /// A trigger obstacle fired with the current goodie count
    Trigger { goodies: u32, id: u32 },
}

/// Input funneled in from the platform layer
///
/// Hit-testing happens outside the core: touch events arrive with the
/// entity they landed on already resolved, or `None` for bare scene
/// touches. All variants must be delivered from the update thread.
#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    TouchDown { target: Option<EntityId>, at: Vec2 },
    TouchMove { target: Option<EntityId>, at: Vec2 },
    TouchUp { at: Vec2 },
    Tilt { x: f32, y: f32 },
}

/// Per-level score counters
#[derive(Debug, Clone, Copy, Default)]
pub struct Score {
    pub heroes_created: u32,
    pub heroes_destroyed: u32,
    pub enemies_created: u32,
    pub enemies_destroyed: u32,
    pub goodies_created: u32,
    pub goodies_collected: u32,
    pub arrivals: u32,
}

/// Static description of a level
#[derive(Debug, Clone, Copy)]
pub struct LevelConfig {
    /// Scene width; `f32::INFINITY` for streamed endless levels
    pub width: f32,
    pub height: f32,
    /// World gravity in world units per second squared (y grows downward)
    pub gravity: Vec2,
    /// Per-axis clamp applied to incoming tilt vectors; zero disables tilt
    pub tilt_max: Vec2,
    /// Width of the visible window, used by the streamer
    pub camera_width: f32,
    /// Scroll factor handed to the background layer
    pub background_scroll: f32,
}

impl LevelConfig {
    /// A bounded level of the given size with side-scroller gravity
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            gravity: Vec2::new(0.0, 10.0 * PIXELS_PER_METER),
            tilt_max: Vec2::ZERO,
            camera_width: 460.0,
            background_scroll: 1.0,
        }
    }

    /// An endless streamed level
    pub fn infinite() -> Self {
        Self::new(f32::INFINITY, 320.0)
    }
}

/// Cooperative timer payloads, polled once per tick
pub(crate) enum TimerKind {
    Reproduce { enemy: EntityId },
}

/// What happens when a travel path finishes
pub(crate) enum PathOutcome {
    None,
    /// Mark the ramp as fully lowered
    RampLowered(EntityId),
    /// Restore the traveling hero's cruise velocity
    RestoreVelocity(Vec2),
}

/// A scripted polyline move, advanced kinematically each tick
pub(crate) struct TravelPath {
    entity: EntityId,
    points: Vec<Vec2>,
    duration: f32,
    elapsed: f32,
    outcome: PathOutcome,
}

/// Sample a polyline at `t` in [0, 1] by arc length
fn sample_polyline(points: &[Vec2], t: f32) -> Vec2 {
    if points.len() < 2 {
        return points.first().copied().unwrap_or(Vec2::ZERO);
    }
    let total: f32 = points.windows(2).map(|w| (w[1] - w[0]).length()).sum();
    if total <= f32::EPSILON {
        return points[0];
    }
    let mut remaining = t.clamp(0.0, 1.0) * total;
    for w in points.windows(2) {
        let seg = (w[1] - w[0]).length();
        if remaining <= seg {
            return lerp_vec2(w[0], w[1], if seg > 0.0 { remaining / seg } else { 0.0 });
        }
        remaining -= seg;
    }
    *points.last().unwrap()
}

/// A playable level and everything in it
pub struct Level {
    pub(crate) physics: PhysicsWorld,
    pub(crate) entities: EntityArena,
    pub(crate) scene: Box<dyn SceneGraph>,
    pub(crate) media: Box<dyn MediaProvider>,
    pub(crate) audio: Box<dyn AudioSink>,
    pub(crate) config: LevelConfig,
    pub(crate) score: Score,
    pub(crate) victory: Victory,
    outcome: LevelOutcome,
    events: Vec<GameEvent>,
    /// Level clock in seconds, advanced once per tick
    pub(crate) clock: f32,
    pub(crate) timers: TimerQueue<TimerKind>,
    paths: Vec<TravelPath>,
    pub(crate) gestures: GestureState,
    pub(crate) bullets: Option<BulletPool>,
    /// Entities pushed around by tilt input
    pub(crate) tilt_entities: Vec<EntityId>,
    /// Most recent tilt vector, already clamped
    tilt_force: Vec2,
    /// The hero UI controls operate on (single-hero assumption)
    pub(crate) last_hero: Option<EntityId>,
    pub(crate) jump_impulse: Vec2,
    pub(crate) rng: Pcg32,
    win_sound: Option<SoundHandle>,
    lose_sound: Option<SoundHandle>,
    music: Option<MusicHandle>,
}

impl Level {
    /// Create a headless level (null collaborators)
    pub fn new(config: LevelConfig) -> Self {
        Self::with_services(
            config,
            Box::new(NullScene),
            Box::new(NullMedia),
            Box::new(NullAudio),
        )
    }

    /// Create a level wired to real collaborators
    pub fn with_services(
        config: LevelConfig,
        scene: Box<dyn SceneGraph>,
        media: Box<dyn MediaProvider>,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        info!(
            "new level: {}x{} gravity {:?}",
            config.width, config.height, config.gravity
        );
        Self {
            physics: PhysicsWorld::new(config.gravity),
            entities: EntityArena::new(),
            scene,
            media,
            audio,
            config,
            score: Score::default(),
            victory: Victory::Destination(1),
            outcome: LevelOutcome::Playing,
            events: Vec::new(),
            clock: 0.0,
            timers: TimerQueue::new(),
            paths: Vec::new(),
            gestures: GestureState::default(),
            bullets: None,
            tilt_entities: Vec::new(),
            tilt_force: Vec2::ZERO,
            last_hero: None,
            jump_impulse: Vec2::ZERO,
            rng: Pcg32::seed_from_u64(7),
            win_sound: None,
            lose_sound: None,
            music: None,
        }
    }

    // --- spawning -------------------------------------------------------

    /// Create an entity from its top-left corner and extents
    ///
    /// Looks up the image, builds the body (when `body` is given), maps the
    /// body back to the entity id and registers it with the scene graph.
    pub(crate) fn spawn(
        &mut self,
        kind: EntityKind,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: Option<&str>,
        body: Option<BodyConfig>,
    ) -> EntityId {
        let size = Vec2::new(w, h);
        let pos = Vec2::new(x, y) + size * 0.5;
        let mut entity = Entity::new(kind, pos, size);
        if let Some(name) = image {
            entity.texture = self.media.image(name);
            if entity.texture.is_none() {
                warn!("image {name} not found; entity will render blank");
            }
        }
        let texture = entity.texture;
        let id = self.entities.insert(entity);
        if let Some(cfg) = body {
            let handle = self.physics.add_entity_body(
                cfg.build_body(pos),
                cfg.build_collider(size),
                id.to_bits(),
            );
            if let Some(e) = self.entities.get_mut(id) {
                e.body = Some(handle);
            }
        }
        self.scene.attach(id.to_bits(), texture, size);
        id
    }

    /// Draw a picture with no physics; pruned by the streamer like any
    /// other scenery
    pub fn add_decoration(&mut self, x: f32, y: f32, w: f32, h: f32, image: &str) -> EntityId {
        self.spawn(EntityKind::Decoration, x, y, w, h, Some(image), None)
    }

    /// Add one static line segment (the building block for vector terrain)
    pub fn add_svg_segment(&mut self, from: Vec2, to: Vec2) -> EntityId {
        let delta = to - from;
        let length = delta.length().max(1.0);
        let center = (from + to) * 0.5;
        let id = self.spawn(
            EntityKind::Svg,
            center.x - length * 0.5,
            center.y - 1.0,
            length,
            2.0,
            None,
            Some(BodyConfig::box_shape().kind(crate::engine::physics::BodyKind::Static)),
        );
        let angle = delta.y.atan2(delta.x);
        if let Some(body) = self.entities.get(id).and_then(|e| e.body) {
            self.physics.set_pose(body, center, angle);
        }
        id
    }

    /// Add a chain of line segments through the given points
    pub fn add_line_chain(&mut self, points: &[Vec2]) -> Vec<EntityId> {
        points
            .windows(2)
            .map(|w| self.add_svg_segment(w[0], w[1]))
            .collect()
    }

    // --- entity lifecycle -----------------------------------------------

    /// Logical death: hide the entity and stop simulating it.
    ///
    /// Keeps the invariant that an invisible entity is never active.
    pub(crate) fn hide_entity(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        entity.visible = false;
        entity.active = false;
        let body = entity.body;
        if let Some(handle) = body {
            self.physics.set_enabled(handle, false);
        }
        self.scene.set_visible(id.to_bits(), false);
    }

    /// Bring a pooled entity back into play
    pub(crate) fn show_entity(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        entity.visible = true;
        entity.active = true;
        let body = entity.body;
        if let Some(handle) = body {
            self.physics.set_enabled(handle, true);
        }
        self.scene.set_visible(id.to_bits(), true);
    }

    /// Permanent retirement: destroy the body and free the arena slot
    pub(crate) fn retire_entity(&mut self, id: EntityId) {
        let Some(entity) = self.entities.remove(id) else {
            return;
        };
        if let Some(handle) = entity.body {
            self.physics.remove_body(handle);
        }
        self.scene.detach(id.to_bits());
    }

    /// Center position of an entity
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.entities.get(id).map(|e| e.pos)
    }

    /// Teleport an entity, clearing any motion
    pub(crate) fn set_entity_position(&mut self, id: EntityId, pos: Vec2) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        entity.pos = pos;
        let body = entity.body;
        if let Some(handle) = body {
            self.physics.set_translation(handle, pos);
        }
    }

    /// Attach a collision sound to an entity
    pub fn set_hit_sound(&mut self, id: EntityId, name: &str) {
        let sound = self.media.sound(name);
        if sound.is_none() {
            warn!("sound {name} not found; collisions will be silent");
        }
        if let Some(entity) = self.entities.get_mut(id) {
            entity.hit_sound = sound;
        }
    }

    /// Make an entity react to tilt input
    pub fn register_tilt(&mut self, id: EntityId) {
        if !self.tilt_entities.contains(&id) {
            self.tilt_entities.push(id);
        }
    }

    // --- travel paths ---------------------------------------------------

    /// Move an entity along a polyline over `duration` seconds
    pub(crate) fn start_path(
        &mut self,
        entity: EntityId,
        points: Vec<Vec2>,
        duration: f32,
        outcome: PathOutcome,
    ) {
        self.paths.push(TravelPath {
            entity,
            points,
            duration: duration.max(1.0 / 60.0),
            elapsed: 0.0,
            outcome,
        });
    }

    fn update_paths(&mut self, dt: f32) {
        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.paths.len() {
            if !self.entities.contains(self.paths[i].entity) {
                self.paths.swap_remove(i);
                continue;
            }
            let path = &mut self.paths[i];
            path.elapsed += dt;
            let t = (path.elapsed / path.duration).min(1.0);
            let pos = sample_polyline(&path.points, t);
            let entity = path.entity;
            let done = t >= 1.0;
            if done {
                finished.push(self.paths.swap_remove(i));
            } else {
                i += 1;
            }
            self.set_entity_position(entity, pos);
        }
        for path in finished {
            match path.outcome {
                PathOutcome::None => {}
                PathOutcome::RampLowered(ramp) => {
                    if let Some(data) = self.entities.get_mut(ramp).and_then(|e| e.obstacle_mut())
                    {
                        if let crate::game::entities::ObstacleRole::Ramp { lowered } =
                            &mut data.role
                        {
                            *lowered = true;
                        }
                    }
                }
                PathOutcome::RestoreVelocity(v) => {
                    if let Some(body) = self.entities.get(path.entity).and_then(|e| e.body) {
                        self.physics.set_linvel(body, v);
                    }
                }
            }
        }
    }

    /// Is the entity currently following a travel path?
    pub(crate) fn on_path(&self, id: EntityId) -> bool {
        self.paths.iter().any(|p| p.entity == id)
    }

    // --- victory / loss -------------------------------------------------

    pub fn set_victory_destination(&mut self, how_many: u32) {
        self.victory = Victory::Destination(how_many);
    }

    pub fn set_victory_goodies(&mut self, how_many: u32) {
        self.victory = Victory::GoodieCount(how_many);
    }

    pub fn set_victory_enemy_count(&mut self) {
        self.victory = Victory::EnemyCount;
    }

    pub fn set_win_sound(&mut self, name: &str) {
        self.win_sound = self.media.sound(name);
    }

    pub fn set_lose_sound(&mut self, name: &str) {
        self.lose_sound = self.media.sound(name);
    }

    pub fn set_music(&mut self, name: &str) {
        self.music = self.media.music(name);
    }

    pub fn music(&self) -> Option<MusicHandle> {
        self.music
    }

    /// Transition to won; later qualifying collisions are ignored
    pub(crate) fn win(&mut self) {
        if self.outcome != LevelOutcome::Playing {
            return;
        }
        info!("level won after {:.1}s", self.clock);
        self.outcome = LevelOutcome::Won;
        if let Some(sound) = self.win_sound {
            self.audio.play(sound);
        }
        self.events.push(GameEvent::Won);
    }

    /// Transition to lost with the killer's message
    pub(crate) fn lose(&mut self, message: &str) {
        if self.outcome != LevelOutcome::Playing {
            return;
        }
        info!("level lost after {:.1}s: {message}", self.clock);
        self.outcome = LevelOutcome::Lost;
        if let Some(sound) = self.lose_sound {
            self.audio.play(sound);
        }
        self.events.push(GameEvent::Lost {
            message: message.to_string(),
        });
    }

    pub fn outcome(&self) -> LevelOutcome {
        self.outcome
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// The hero touch controls operate on (the last one created)
    pub fn last_hero(&self) -> Option<EntityId> {
        self.last_hero
    }

    pub fn set_jump_impulses(&mut self, x: f32, y: f32) {
        self.jump_impulse = Vec2::new(x, y);
    }

    // --- input ----------------------------------------------------------

    /// Single entry point for platform input, called from the update thread
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::TouchDown { target, at } => self.on_touch_down(target, at),
            InputEvent::TouchMove { target, at } => self.on_touch_move(target, at),
            InputEvent::TouchUp { at } => self.on_touch_up(at),
            InputEvent::Tilt { x, y } => self.on_tilt(x, y),
        }
    }

    /// Clamp a tilt vector and apply it to tilt-reactive entities
    fn on_tilt(&mut self, x: f32, y: f32) {
        let max = self.config.tilt_max;
        self.tilt_force = Vec2::new(clamp(x, -max.x, max.x), clamp(y, -max.y, max.y));
        // Flip the hero's image when it drifts backwards
        if let Some(hero) = self.last_hero {
            let reverse = self
                .entities
                .get(hero)
                .and_then(|e| e.hero())
                .map(|h| h.reverse_face)
                .unwrap_or(false);
            if reverse {
                self.scene.set_flipped(hero.to_bits(), self.tilt_force.x < 0.0);
            }
        }
    }

    fn apply_tilt(&mut self, dt: f32) {
        if self.tilt_force == Vec2::ZERO {
            return;
        }
        let accel = self.tilt_force * PIXELS_PER_METER;
        for &id in &self.tilt_entities {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            if !entity.active {
                continue;
            }
            if let Some(body) = entity.body {
                let impulse = accel * self.physics.mass(body) * dt;
                self.physics.apply_impulse(body, impulse);
            }
        }
    }

    // --- the tick -------------------------------------------------------

    /// Advance the level by one fixed timestep
    ///
    /// This is the single authoritative update point: timers, paths, tilt,
    /// the physics step, scene sync, and finally the deferred collision
    /// dispatch all run here, in that order.
    pub fn tick(&mut self) {
        let dt = self.physics.timestep();
        self.clock += dt;

        for fired in self.timers.poll(dt) {
            match fired {
                TimerKind::Reproduce { enemy } => {
                    crate::game::entities::enemy::reproduce(self, enemy);
                }
            }
        }

        self.update_paths(dt);
        self.apply_tilt(dt);
        self.physics.step();
        self.sync_scene();
        self.drain_contacts();
    }

    /// Refresh cached positions and push transforms to the renderer
    fn sync_scene(&mut self) {
        for id in self.entities.ids() {
            let Some(body) = self.entities.get(id).and_then(|e| e.body) else {
                continue;
            };
            let Some(pos) = self.physics.translation(body) else {
                continue;
            };
            let angle = self.physics.angle(body);
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            entity.pos = pos;
            let visible = entity.visible;
            if visible {
                self.scene.set_transform(id.to_bits(), pos, angle);
            }
        }
    }

    /// Drain the contact queue filled during the physics step and dispatch
    /// each pair to exactly one handler
    fn drain_contacts(&mut self) {
        for (c1, c2) in self.physics.take_contacts() {
            let a = self.physics.entity_of_collider(c1);
            let b = self.physics.entity_of_collider(c2);
            match (a, b) {
                (Some(a), Some(b)) => {
                    collision::dispatch(self, EntityId::from_bits(a), EntityId::from_bits(b));
                }
                _ => debug!("contact between unowned bodies ignored"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::ObstacleData;

    #[test]
    fn test_sample_polyline_endpoints() {
        let pts = vec![Vec2::ZERO, Vec2::new(10.0, 0.0)];
        assert_eq!(sample_polyline(&pts, 0.0), Vec2::ZERO);
        assert_eq!(sample_polyline(&pts, 1.0), Vec2::new(10.0, 0.0));
        assert_eq!(sample_polyline(&pts, 0.5), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_sample_polyline_three_points() {
        let pts = vec![Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        // Halfway along the total length lands on the corner
        assert_eq!(sample_polyline(&pts, 0.5), Vec2::new(10.0, 0.0));
        assert_eq!(sample_polyline(&pts, 0.75), Vec2::new(10.0, 5.0));
    }

    #[test]
    fn test_hide_keeps_invariant() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        let id = level.spawn(
            EntityKind::Obstacle(ObstacleData::plain()),
            0.0,
            0.0,
            70.0,
            70.0,
            None,
            Some(BodyConfig::box_shape()),
        );
        level.hide_entity(id);
        let entity = level.entities.get(id).unwrap();
        assert!(!entity.visible);
        assert!(!entity.active);
        assert!(!level.physics.is_enabled(entity.body.unwrap()));
    }

    #[test]
    fn test_retire_frees_body_and_slot() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        let id = level.spawn(
            EntityKind::Obstacle(ObstacleData::plain()),
            0.0,
            0.0,
            70.0,
            70.0,
            None,
            Some(BodyConfig::box_shape()),
        );
        let bodies_before = level.physics.body_count();
        level.retire_entity(id);
        assert!(!level.entities.contains(id));
        assert_eq!(level.physics.body_count(), bodies_before - 1);
    }

    #[test]
    fn test_win_fires_exactly_once() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        level.win();
        level.win();
        let events = level.take_events();
        assert_eq!(events, vec![GameEvent::Won]);
        assert_eq!(level.outcome(), LevelOutcome::Won);
    }

    #[test]
    fn test_lose_after_win_is_ignored() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        level.win();
        level.lose("too late");
        assert_eq!(level.outcome(), LevelOutcome::Won);
        assert_eq!(level.take_events(), vec![GameEvent::Won]);
    }

    #[test]
    fn test_tilt_is_clamped() {
        let mut config = LevelConfig::new(900.0, 320.0);
        config.tilt_max = Vec2::new(10.0, 0.0);
        let mut level = Level::new(config);
        level.handle_input(InputEvent::Tilt { x: 50.0, y: 3.0 });
        assert_eq!(level.tilt_force, Vec2::new(10.0, 0.0));
        level.handle_input(InputEvent::Tilt { x: -50.0, y: 0.0 });
        assert_eq!(level.tilt_force, Vec2::new(-10.0, 0.0));
    }

    #[test]
    fn test_path_moves_entity_and_finishes() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        let id = level.spawn(
            EntityKind::Obstacle(ObstacleData::plain()),
            0.0,
            0.0,
            70.0,
            70.0,
            None,
            Some(BodyConfig::box_shape().kind(crate::engine::physics::BodyKind::Static)),
        );
        let start = level.position(id).unwrap();
        let target = start + Vec2::new(0.0, 100.0);
        level.start_path(id, vec![start, target], 0.1, PathOutcome::None);
        for _ in 0..12 {
            level.tick();
        }
        let end = level.position(id).unwrap();
        assert!((end - target).length() < 1.0);
        assert!(!level.on_path(id));
    }
}
