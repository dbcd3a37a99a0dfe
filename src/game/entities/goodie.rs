// Goodies serve two purposes: something to collect in order to activate
// other parts of the game (victory, destinations, trigger obstacles), and
// a way to power the hero up with strength or invincibility.

use crate::engine::physics::{BodyConfig, BodyKind};
use crate::game::entities::{EntityId, EntityKind};
use crate::game::level::Level;

/// Per-goodie state
pub struct GoodieData {
    /// Strength granted to the collecting hero
    pub strength_boost: i32,

    /// Seconds of invincibility granted; extends, never shortens
    pub invincibility_duration: f32,
}

impl GoodieData {
    pub fn new() -> Self {
        Self {
            strength_boost: 0,
            invincibility_duration: 0.0,
        }
    }
}

impl Default for GoodieData {
    fn default() -> Self {
        Self::new()
    }
}

impl Level {
    /// Draw a goodie from its top-left corner
    ///
    /// Goodies are sensors: heroes collect them by overlap, without a
    /// collision response.
    pub fn add_goodie(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        image: &str,
        stationary: bool,
    ) -> EntityId {
        let cfg = BodyConfig::circle()
            .kind(if stationary {
                BodyKind::Static
            } else {
                BodyKind::Dynamic
            })
            .density(1.0)
            .elasticity(0.3)
            .friction(0.6)
            .sensor(true);
        let id = self.spawn(EntityKind::Goodie(GoodieData::new()), x, y, w, h, Some(image), Some(cfg));
        self.score.goodies_created += 1;
        id
    }

    /// Grant invincibility on collection
    pub fn set_invincibility_duration(&mut self, goodie: EntityId, duration: f32) {
        if let Some(e) = self.entities.get_mut(goodie) {
            if let EntityKind::Goodie(data) = &mut e.kind {
                data.invincibility_duration = duration;
            }
        }
    }

    /// Grant strength on collection
    pub fn set_strength_boost(&mut self, goodie: EntityId, boost: i32) {
        if let Some(e) = self.entities.get_mut(goodie) {
            if let EntityKind::Goodie(data) = &mut e.kind {
                data.strength_boost = boost;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::LevelConfig;

    #[test]
    fn test_goodie_is_sensor() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        let id = level.add_goodie(10.0, 10.0, 10.0, 10.0, "blueball.png", true);
        assert_eq!(level.score().goodies_created, 1);
        let entity = level.entities.get(id).unwrap();
        assert!(entity.goodie().is_some());
    }

    #[test]
    fn test_goodie_setters() {
        let mut level = Level::new(LevelConfig::new(900.0, 320.0));
        let id = level.add_goodie(10.0, 10.0, 10.0, 10.0, "blueball.png", true);
        level.set_invincibility_duration(id, 8.0);
        level.set_strength_boost(id, 2);
        let data = level.entities.get(id).unwrap().goodie().unwrap();
        assert_eq!(data.invincibility_duration, 8.0);
        assert_eq!(data.strength_boost, 2);
    }
}
