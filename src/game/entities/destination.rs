// Destinations are the places heroes must reach to complete a level.
// Each has a capacity and can demand a minimum goodie count before it
// accepts anyone.

use crate::engine::physics::{BodyConfig, BodyKind};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::level::Level;

/// Per-destination state
pub struct DestinationData {
    /// How many heroes fit here
    pub capacity: u32,

    /// How many heroes have arrived here; never exceeds capacity
    pub holding: u32,

    /// Goodies that must be collected before this destination opens
    pub activation_score: u32,
}

impl DestinationData {
    pub fn new(capacity: u32, activation_score: u32) -> Self {
        Self {
            capacity,
            holding: 0,
            activation_score,
        }
    }
}

impl Level {
    /// Draw a destination from its top-left corner
    pub fn add_destination(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: &str,
        capacity: u32,
        activation_score: u32,
    ) -> EntityId {
        let cfg = BodyConfig::circle()
            .kind(BodyKind::Static)
            .density(1.0)
            .elasticity(0.3)
            .friction(0.6)
            .sensor(true);
        self.spawn(
            EntityKind::Destination(DestinationData::new(capacity, activation_score)),
            x,
            y,
            w,
            h,
            Some(image),
            Some(cfg),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::LevelConfig;

    #[test]
    fn test_destination_starts_empty() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        let id = level.add_destination(850.0, 200.0, 20.0, 40.0, "invis.png", 2, 3);
        let entity = level.entities.get(id).unwrap();
        match &entity.kind {
            EntityKind::Destination(d) => {
                assert_eq!(d.capacity, 2);
                assert_eq!(d.holding, 0);
                assert_eq!(d.activation_score, 3);
            }
            _ => panic!("expected a destination"),
        }
    }
}
