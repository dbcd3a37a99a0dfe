// Collision dispatch
//
// Contact pairs drained from the physics step are ordered by entity
// priority and exactly one handler runs, on the lower-priority side.
// That makes collision handling asymmetric and type-specific: the hero
// reacts to essentially everything, enemies react to bullets, bullets
// hide themselves, and everything else is inert.

use glam::Vec2;
use log::debug;

use crate::game::entities::{EntityId, EntityKind, ObstacleRole};
use crate::game::level::{GameEvent, Level, PathOutcome, Victory};

/// Snapshot of the higher-priority side, copied out so handlers can
/// mutate the level freely
enum Other {
    Enemy {
        damage: i32,
        headbutt_kill: bool,
        kill_text: String,
    },
    Goodie {
        boost: i32,
        duration: f32,
    },
    Destination {
        activation: u32,
        capacity: u32,
        holding: u32,
    },
    Obstacle {
        role: ObstacleRole,
        damp: Option<f32>,
        top_left: Vec2,
        size: Vec2,
    },
    Bullet,
    Svg,
    Inert,
}

fn snapshot(level: &Level, id: EntityId) -> Other {
    let Some(entity) = level.entities.get(id) else {
        return Other::Inert;
    };
    match &entity.kind {
        EntityKind::Enemy(d) => Other::Enemy {
            damage: d.damage,
            headbutt_kill: d.kill_by_headbutt,
            kill_text: d.kill_text.clone(),
        },
        EntityKind::Goodie(d) => Other::Goodie {
            boost: d.strength_boost,
            duration: d.invincibility_duration,
        },
        EntityKind::Destination(d) => Other::Destination {
            activation: d.activation_score,
            capacity: d.capacity,
            holding: d.holding,
        },
        EntityKind::Obstacle(d) => Other::Obstacle {
            role: d.role,
            damp: d.damp,
            top_left: entity.top_left(),
            size: entity.size,
        },
        EntityKind::Bullet => Other::Bullet,
        EntityKind::Svg => Other::Svg,
        _ => Other::Inert,
    }
}

/// Resolve one contact pair: order by priority, invoke one handler
///
/// Pairs involving hidden entities or entities with no defined relation
/// are ignored; malformed contacts are never fatal.
pub(crate) fn dispatch(level: &mut Level, a: EntityId, b: EntityId) {
    let ordered = {
        let (Some(ea), Some(eb)) = (level.entities.get(a), level.entities.get(b)) else {
            debug!("collision with retired entity ignored");
            return;
        };
        if !ea.visible || !eb.visible {
            return;
        }
        debug!("collision: {} hit {}", ea.kind.name(), eb.kind.name());
        // ties go to the first body, matching the reporting order
        if ea.priority() > eb.priority() {
            (b, a)
        } else {
            (a, b)
        }
    };
    let (low, high) = ordered;
    let Some(lower) = level.entities.get(low) else {
        return;
    };
    let handler: fn(&mut Level, EntityId, EntityId) = match &lower.kind {
        EntityKind::Hero(_) => hero_collide,
        EntityKind::Enemy(_) => enemy_collide,
        EntityKind::Bullet => bullet_collide,
        // goodies, obstacles, svg lines and destinations never react
        _ => return,
    };
    handler(level, low, high);
}

/// The hero's collision policy; almost all game logic lives here
fn hero_collide(level: &mut Level, hero: EntityId, other: EntityId) {
    // play a sound when we hit this thing?
    if let Some(sound) = level.entities.get(other).and_then(|e| e.hit_sound) {
        level.audio.play(sound);
    }

    match snapshot(level, other) {
        Other::Enemy {
            damage,
            headbutt_kill,
            kill_text,
        } => {
            let (invincible, headbutt, strength) = {
                let Some(h) = level.entities.get(hero).and_then(|e| e.hero()) else {
                    return;
                };
                (h.is_invincible(level.clock), h.headbutt, h.strength)
            };
            if invincible {
                level.destroy_enemy(other);
            } else if headbutt && headbutt_kill {
                level.destroy_enemy(other);
            } else if damage >= strength {
                level.kill_hero(hero, &kill_text);
            } else {
                if let Some(h) = level.entities.get_mut(hero).and_then(|e| e.hero_mut()) {
                    h.strength -= damage;
                }
                level.destroy_enemy(other);
            }
        }

        Other::Goodie { boost, duration } => {
            level.hide_entity(other);
            level.score.goodies_collected += 1;
            let now = level.clock;
            if let Some(h) = level.entities.get_mut(hero).and_then(|e| e.hero_mut()) {
                h.strength += boost;
                if duration > 0.0 {
                    // extensions never shorten a running window
                    let expire = now + duration;
                    if expire > h.invincible_until {
                        h.invincible_until = expire;
                    }
                }
            }
            if let Victory::GoodieCount(needed) = level.victory {
                if level.score.goodies_collected >= needed {
                    level.win();
                }
            }
        }

        Other::Destination {
            activation,
            capacity,
            holding,
        } => {
            // only accept the hero if it carries enough goodies and
            // there's room left
            if level.score.goodies_collected >= activation && holding < capacity {
                if let Some(d) = level.entities.get_mut(other).and_then(|e| e.destination_mut()) {
                    d.holding += 1;
                }
                level.score.arrivals += 1;
                level.hide_entity(hero);
                if let Victory::Destination(needed) = level.victory {
                    if level.score.arrivals >= needed {
                        level.win();
                    }
                }
            }
        }

        Other::Obstacle {
            role,
            damp,
            top_left,
            size,
        } => {
            if let ObstacleRole::StreamTrigger { speed } = role {
                let hero_x = level.position(hero).map(|p| p.x).unwrap_or(0.0);
                level.extend_world(speed, hero_x);
                return;
            }

            let mut killer = false;
            match role {
                // a lowered ramp lifts the hero over what follows; a
                // raised one is a wall of death
                ObstacleRole::Ramp { lowered } => {
                    if lowered {
                        ramp_assist(level, hero, top_left, size);
                    } else {
                        killer = true;
                    }
                }
                ObstacleRole::PitCover { armed } => {
                    if armed {
                        killer = true;
                    }
                }
                ObstacleRole::Killer => killer = true,
                _ => {}
            }
            if killer {
                level.kill_hero(hero, "Try again");
                return;
            }

            if let ObstacleRole::Trigger { activation, id } = role {
                if level.score.goodies_collected >= activation {
                    level.hide_entity(other);
                    let goodies = level.score.goodies_collected;
                    level.push_event(GameEvent::Trigger { goodies, id });
                }
            } else if let Some(factor) = damp {
                if let Some(body) = level.entities.get(hero).and_then(|e| e.body) {
                    let v = level.physics.linvel(body);
                    level.physics.set_linvel(body, v * factor);
                }
            } else if let Some(h) = level.entities.get_mut(hero).and_then(|e| e.hero_mut()) {
                // probably a wall: allow jumping again
                h.in_air = false;
            }
        }

        Other::Bullet => {
            debug!("hero collided with bullet");
        }

        Other::Svg => {
            // svg lines act like walls: reenable jumps
            if let Some(h) = level.entities.get_mut(hero).and_then(|e| e.hero_mut()) {
                h.in_air = false;
            }
        }

        Other::Inert => {}
    }
}

/// Redirect the hero up and over a lowered ramp, then restore its cruise
/// velocity
fn ramp_assist(level: &mut Level, hero: EntityId, ramp_top_left: Vec2, ramp_size: Vec2) {
    if level.on_path(hero) {
        return;
    }
    let Some(entity) = level.entities.get(hero) else {
        return;
    };
    let hero_pos = entity.pos;
    let hero_size = entity.size;
    let Some(cruise) = entity.hero().map(|h| h.velocity) else {
        return;
    };
    let target_top_left = Vec2::new(
        ramp_top_left.x + ramp_size.x,
        (hero_pos.y - hero_size.y * 0.5) - ramp_size.y - 15.0,
    );
    let target = target_top_left + hero_size * 0.5;
    let vx = cruise.x.abs();
    let duration = if vx > f32::EPSILON {
        (target.x - hero_pos.x).abs() / vx
    } else {
        0.5
    };
    level.start_path(
        hero,
        vec![hero_pos, target],
        duration,
        PathOutcome::RestoreVelocity(cruise),
    );
}

/// Enemies only care about bullets: the bullet dies and so do they
fn enemy_collide(level: &mut Level, enemy: EntityId, other: EntityId) {
    let is_bullet = matches!(
        level.entities.get(other).map(|e| &e.kind),
        Some(EntityKind::Bullet)
    );
    if !is_bullet {
        return;
    }
    if let Some(sound) = level.bullets.as_ref().and_then(|p| p.hit_sound) {
        level.audio.play(sound);
    }
    level.destroy_enemy(enemy);
    level.hide_entity(other);
}

/// Bullets hide themselves on any collision they end up handling
fn bullet_collide(level: &mut Level, bullet: EntityId, _other: EntityId) {
    level.hide_entity(bullet);
}
