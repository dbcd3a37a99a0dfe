use rapier2d::prelude::*;

pub use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};

/// Shape of an entity's physics fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Circle sized to half the entity width
    Circle,
    /// Axis-aligned box matching the entity extents
    Box,
}

/// How the body participates in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Immovable (floors, parked obstacles)
    Static,
    /// Fully simulated (heroes, bullets, movable enemies)
    Dynamic,
    /// Moved by the game, pushes others but ignores forces
    Kinematic,
}

impl BodyKind {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyKind::Static => RigidBodyType::Fixed,
            BodyKind::Dynamic => RigidBodyType::Dynamic,
            BodyKind::Kinematic => RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Builder describing the single body + collider pair owned by one entity
///
/// Mirrors the knobs the game layer actually uses: shape, body kind,
/// material (density/elasticity/friction), the bullet flag (continuous
/// collision detection for fast projectiles) and the sensor flag (overlap
/// detection without a contact response).
#[derive(Debug, Clone, Copy)]
pub struct BodyConfig {
    shape: ShapeKind,
    kind: BodyKind,
    density: f32,
    elasticity: f32,
    friction: f32,
    bullet: bool,
    sensor: bool,
    fixed_rotation: bool,
    can_sleep: bool,
}

impl BodyConfig {
    /// Start describing a body with the given shape
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            kind: BodyKind::Dynamic,
            density: 1.0,
            elasticity: 0.0,
            friction: 1.0,
            bullet: false,
            sensor: false,
            fixed_rotation: false,
            can_sleep: true,
        }
    }

    /// Circle-shaped body
    pub fn circle() -> Self {
        Self::new(ShapeKind::Circle)
    }

    /// Box-shaped body
    pub fn box_shape() -> Self {
        Self::new(ShapeKind::Box)
    }

    /// Set how the body participates in the simulation
    pub fn kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the material density (mass is derived from shape volume)
    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Set restitution (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    /// Set the friction coefficient
    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Enable continuous collision detection for fast movers
    pub fn bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }

    /// Detect overlaps without producing a contact response
    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    /// Prevent collision torque from rotating the body
    pub fn fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    /// Allow the body to sleep when idle (disable for heroes)
    pub fn can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Is this a sensor configuration?
    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    /// Build the rigid body at `pos` (entity center, world units)
    pub fn build_body(&self, pos: glam::Vec2) -> RigidBody {
        let locked = if self.fixed_rotation {
            LockedAxes::ROTATION_LOCKED
        } else {
            LockedAxes::empty()
        };
        RigidBodyBuilder::new(self.kind.to_rapier())
            .position(Isometry::translation(pos.x, pos.y))
            .locked_axes(locked)
            .ccd_enabled(self.bullet)
            .can_sleep(self.can_sleep)
            .build()
    }

    /// Build the collider for an entity of the given size
    pub fn build_collider(&self, size: glam::Vec2) -> Collider {
        let shape = match self.shape {
            ShapeKind::Circle => SharedShape::ball(size.x * 0.5),
            ShapeKind::Box => SharedShape::cuboid(size.x * 0.5, size.y * 0.5),
        };
        ColliderBuilder::new(shape)
            .sensor(self.sensor)
            .friction(self.friction)
            .restitution(self.elasticity)
            .density(self.density)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build()
    }
}
