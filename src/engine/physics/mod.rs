// Physics layer: rapier2d world wrapper, body/collider builders and the
// deferred contact queue

pub mod body;
pub mod collision;
pub mod world;

pub use body::{BodyConfig, BodyKind, RigidBodyHandle, ShapeKind};
pub use collision::ColliderPair;
pub use world::PhysicsWorld;
