use glam::Vec2;
use rapier2d::prelude::*;
use std::collections::HashMap;

use super::collision::{ColliderPair, ContactQueue};

/// Physics world that manages all rigid-body simulation
///
/// World coordinates are screen-aligned: x grows to the right, y grows
/// downward, so a side-scroller's gravity is a positive y vector.
pub struct PhysicsWorld {
    /// Gravity vector, world units per second squared
    gravity: Vector<Real>,

    /// Integration parameters for the physics simulation
    integration_parameters: IntegrationParameters,

    /// Physics pipeline handles collision detection and solving
    physics_pipeline: PhysicsPipeline,

    /// Island manager for sleeping bodies
    island_manager: IslandManager,

    /// Broad phase collision detection
    broad_phase: DefaultBroadPhase,

    /// Narrow phase collision detection
    narrow_phase: NarrowPhase,

    /// Impulse joint set
    impulse_joint_set: ImpulseJointSet,

    /// Multibody joint set
    multibody_joint_set: MultibodyJointSet,

    /// CCD solver for fast-moving objects (bullets)
    ccd_solver: CCDSolver,

    /// Query pipeline for raycasts and shape casts
    query_pipeline: QueryPipeline,

    /// Rigid body set
    rigid_body_set: RigidBodySet,

    /// Collider set
    collider_set: ColliderSet,

    /// Contact-begin events buffered during the step
    contact_queue: ContactQueue,

    /// User data mapping from body handles to game entity ids
    body_to_entity: HashMap<RigidBodyHandle, u64>,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity
    pub fn new(gravity: Vec2) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        // Fixed timestep of 1/60 seconds (60 FPS)
        integration_parameters.dt = 1.0 / 60.0;

        Self {
            gravity: vector![gravity.x, gravity.y],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            contact_queue: ContactQueue::new(),
            body_to_entity: HashMap::new(),
        }
    }

    /// Step the physics simulation forward by one timestep
    pub fn step(&mut self) {
        // Clear the previous frame's contact events
        self.contact_queue.clear();

        let event_handler = &self.contact_queue;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            event_handler,
        );
    }

    /// Take the contact-begin pairs buffered during the last step
    pub fn take_contacts(&mut self) -> Vec<ColliderPair> {
        self.contact_queue.take()
    }

    /// Add a rigid body and its collider, mapped to a game entity id
    pub fn add_entity_body(
        &mut self,
        body: RigidBody,
        collider: Collider,
        entity_id: u64,
    ) -> RigidBodyHandle {
        let handle = self.rigid_body_set.insert(body);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.body_to_entity.insert(handle, entity_id);
        handle
    }

    /// Remove a rigid body and all its attached colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true, // remove attached colliders
        );
        self.body_to_entity.remove(&handle);
    }

    /// Resolve a collider back to the game entity id owning its body
    pub fn entity_of_collider(&self, collider: ColliderHandle) -> Option<u64> {
        let parent = self.collider_set.get(collider)?.parent()?;
        self.body_to_entity.get(&parent).copied()
    }

    /// Get a reference to a rigid body
    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    /// Get a mutable reference to a rigid body
    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    /// Current position of a body (entity center)
    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.body(handle).map(|b| {
            let t = b.translation();
            Vec2::new(t.x, t.y)
        })
    }

    /// Teleport a body, clearing its motion
    pub fn set_translation(&mut self, handle: RigidBodyHandle, pos: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.set_translation(vector![pos.x, pos.y], true);
            body.set_linvel(vector![0.0, 0.0], true);
            body.set_angvel(0.0, true);
        }
    }

    /// Set position and rotation together
    pub fn set_pose(&mut self, handle: RigidBodyHandle, pos: Vec2, angle: f32) {
        if let Some(body) = self.body_mut(handle) {
            body.set_position(Isometry::new(vector![pos.x, pos.y], angle), true);
        }
    }

    /// Rotation angle of a body in radians
    pub fn angle(&self, handle: RigidBodyHandle) -> f32 {
        self.body(handle)
            .map(|b| b.position().rotation.angle())
            .unwrap_or(0.0)
    }

    /// Linear velocity of a body
    pub fn linvel(&self, handle: RigidBodyHandle) -> Vec2 {
        self.body(handle)
            .map(|b| {
                let v = b.linvel();
                Vec2::new(v.x, v.y)
            })
            .unwrap_or(Vec2::ZERO)
    }

    /// Set the linear velocity of a body
    pub fn set_linvel(&mut self, handle: RigidBodyHandle, vel: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.set_linvel(vector![vel.x, vel.y], true);
        }
    }

    /// Apply a one-shot impulse to a body
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.apply_impulse(vector![impulse.x, impulse.y], true);
        }
    }

    /// Apply a persistent force (lasts until `reset_forces`)
    pub fn add_force(&mut self, handle: RigidBodyHandle, force: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.add_force(vector![force.x, force.y], true);
        }
    }

    /// Clear all persistent forces on a body
    pub fn reset_forces(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.body_mut(handle) {
            body.reset_forces(true);
        }
    }

    /// Mass of a body
    pub fn mass(&self, handle: RigidBodyHandle) -> f32 {
        self.body(handle).map(|b| b.mass()).unwrap_or(0.0)
    }

    /// Enable or disable a body's participation in the simulation
    pub fn set_enabled(&mut self, handle: RigidBodyHandle, enabled: bool) {
        if let Some(body) = self.body_mut(handle) {
            body.set_enabled(enabled);
        }
    }

    /// Is the body currently simulated?
    pub fn is_enabled(&self, handle: RigidBodyHandle) -> bool {
        self.body(handle).map(|b| b.is_enabled()).unwrap_or(false)
    }

    /// Set gravity for the physics world
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vector![gravity.x, gravity.y];
    }

    /// Get current gravity
    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    /// Get the fixed timestep the world advances by on each step
    pub fn timestep(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Number of bodies currently in the world
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Turn every collider of a body into a sensor (or back)
    pub fn set_sensor(&mut self, handle: RigidBodyHandle, sensor: bool) {
        let colliders: Vec<ColliderHandle> = self
            .body(handle)
            .map(|b| b.colliders().to_vec())
            .unwrap_or_default();
        for ch in colliders {
            if let Some(collider) = self.collider_set.get_mut(ch) {
                collider.set_sensor(sensor);
            }
        }
    }

    /// Does the body have any sensor collider?
    pub fn is_sensor(&self, handle: RigidBodyHandle) -> bool {
        self.body(handle)
            .map(|b| {
                b.colliders()
                    .iter()
                    .any(|ch| self.collider_set.get(*ch).map(|c| c.is_sensor()).unwrap_or(false))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::physics::body::{BodyConfig, BodyKind};

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec2::new(0.0, 10.0))
    }

    #[test]
    fn test_gravity_roundtrip() {
        let mut w = world();
        assert_eq!(w.gravity(), Vec2::new(0.0, 10.0));
        w.set_gravity(Vec2::new(1.0, -2.0));
        assert_eq!(w.gravity(), Vec2::new(1.0, -2.0));
    }

    #[test]
    fn test_entity_mapping() {
        let mut w = world();
        let cfg = BodyConfig::circle();
        let handle = w.add_entity_body(
            cfg.build_body(Vec2::new(5.0, 5.0)),
            cfg.build_collider(Vec2::new(2.0, 2.0)),
            42,
        );
        assert_eq!(w.body_to_entity.get(&handle).copied(), Some(42));
        w.remove_body(handle);
        assert!(w.body(handle).is_none());
        assert!(w.body_to_entity.get(&handle).is_none());
    }

    #[test]
    fn test_body_falls_under_gravity() {
        let mut w = world();
        let cfg = BodyConfig::circle();
        let handle = w.add_entity_body(
            cfg.build_body(Vec2::ZERO),
            cfg.build_collider(Vec2::new(2.0, 2.0)),
            1,
        );
        for _ in 0..60 {
            w.step();
        }
        // y is down, so one second of +y gravity moves the body downward
        let pos = w.translation(handle).unwrap();
        assert!(pos.y > 1.0);
    }

    #[test]
    fn test_disabled_body_does_not_move() {
        let mut w = world();
        let cfg = BodyConfig::circle();
        let handle = w.add_entity_body(
            cfg.build_body(Vec2::ZERO),
            cfg.build_collider(Vec2::new(2.0, 2.0)),
            1,
        );
        w.set_enabled(handle, false);
        assert!(!w.is_enabled(handle));
        for _ in 0..30 {
            w.step();
        }
        let pos = w.translation(handle).unwrap();
        assert_eq!(pos, Vec2::ZERO);
    }

    #[test]
    fn test_overlapping_bodies_report_contact() {
        let mut w = world();
        let dynamic = BodyConfig::circle();
        let sensor = BodyConfig::box_shape().kind(BodyKind::Static).sensor(true);
        w.add_entity_body(
            dynamic.build_body(Vec2::ZERO),
            dynamic.build_collider(Vec2::new(2.0, 2.0)),
            1,
        );
        w.add_entity_body(
            sensor.build_body(Vec2::ZERO),
            sensor.build_collider(Vec2::new(4.0, 4.0)),
            2,
        );
        w.step();
        let contacts = w.take_contacts();
        assert_eq!(contacts.len(), 1);
        let (a, b) = contacts[0];
        let ids = [w.entity_of_collider(a), w.entity_of_collider(b)];
        assert!(ids.contains(&Some(1)) && ids.contains(&Some(2)));
    }
}
