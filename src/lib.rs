// Factory Dash: a 2D side-scrolling factory-escape platformer core
//
// The crate implements the simulation side of the game on top of
// rapier2d: entities and their collision policies, the bullet pool,
// swipe-driven hazards, the infinite level streamer and the level
// session.
// Rendering, audio mixing, input hardware and persistence live behind
// the traits in `engine::services`.

pub mod core;
pub mod engine;
pub mod game;
