// Collaborator interfaces consumed by the game core
//
// Rendering, media decoding, audio mixing and persistence live outside this
// crate. The core only ever calls through these traits; the do-nothing
// implementations below let it run headless, and the recording scene backs
// the tests. Entities are referred to by their id bits, matching the
// body-to-entity mapping in the physics layer.

use glam::Vec2;
use std::collections::HashMap;

/// Opaque handle to a texture owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque handle to a loaded sound effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u32);

/// Opaque handle to a music track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicHandle(pub u32);

/// Persistence failures; callers log and fall back to defaults
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("score store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scene graph the core pushes entity presentation into
///
/// The core never reads rendering state back; layout math uses the sizes it
/// already owns.
pub trait SceneGraph {
    /// Register an entity with the renderer
    fn attach(&mut self, entity: u64, texture: Option<TextureHandle>, size: Vec2);

    /// Permanently remove an entity from the renderer
    fn detach(&mut self, entity: u64);

    /// Show or hide an entity
    fn set_visible(&mut self, entity: u64, visible: bool);

    /// Move an entity (center position, rotation in radians)
    fn set_transform(&mut self, entity: u64, pos: Vec2, angle: f32);

    /// Mirror an entity's image horizontally
    fn set_flipped(&mut self, entity: u64, flipped: bool);

    /// Install a scrolling background layer
    fn set_background(&mut self, texture: Option<TextureHandle>, scroll_factor: f32);
}

/// String-keyed media lookups; a missing key is `None`, never an error
pub trait MediaProvider {
    fn image(&self, name: &str) -> Option<TextureHandle>;
    fn sound(&self, name: &str) -> Option<SoundHandle>;
    fn music(&self, name: &str) -> Option<MusicHandle>;
}

/// Fire-and-forget sound playback
pub trait AudioSink {
    fn play(&mut self, sound: SoundHandle);
}

/// Two-integer persistence (unlocked levels, high score)
pub trait ScoreStore {
    /// Read a persisted integer; `None` means "use the default"
    fn read_int(&self, key: &str) -> Option<i64>;

    /// Persist an integer; failures are reported but never fatal
    fn write_int(&mut self, key: &str, value: i64) -> Result<(), StoreError>;
}

/// Scene graph that discards everything (headless runs)
#[derive(Default)]
pub struct NullScene;

impl SceneGraph for NullScene {
    fn attach(&mut self, _entity: u64, _texture: Option<TextureHandle>, _size: Vec2) {}
    fn detach(&mut self, _entity: u64) {}
    fn set_visible(&mut self, _entity: u64, _visible: bool) {}
    fn set_transform(&mut self, _entity: u64, _pos: Vec2, _angle: f32) {}
    fn set_flipped(&mut self, _entity: u64, _flipped: bool) {}
    fn set_background(&mut self, _texture: Option<TextureHandle>, _scroll_factor: f32) {}
}

/// Media provider with no assets; every lookup misses
#[derive(Default)]
pub struct NullMedia;

impl MediaProvider for NullMedia {
    fn image(&self, _name: &str) -> Option<TextureHandle> {
        None
    }
    fn sound(&self, _name: &str) -> Option<SoundHandle> {
        None
    }
    fn music(&self, _name: &str) -> Option<MusicHandle> {
        None
    }
}

/// Audio sink that swallows playback requests
#[derive(Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _sound: SoundHandle) {}
}

/// In-memory score store
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, i64>,
}

impl ScoreStore for MemoryStore {
    fn read_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn write_int(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Scene graph that records every call, for asserting presentation effects
#[derive(Default)]
pub struct RecordingScene {
    pub attached: Vec<u64>,
    pub detached: Vec<u64>,
    pub visibility: HashMap<u64, bool>,
    pub transforms: HashMap<u64, (Vec2, f32)>,
    pub background: Option<f32>,
}

impl SceneGraph for RecordingScene {
    fn attach(&mut self, entity: u64, _texture: Option<TextureHandle>, _size: Vec2) {
        self.attached.push(entity);
        self.visibility.insert(entity, true);
    }

    fn detach(&mut self, entity: u64) {
        self.detached.push(entity);
    }

    fn set_visible(&mut self, entity: u64, visible: bool) {
        self.visibility.insert(entity, visible);
    }

    fn set_transform(&mut self, entity: u64, pos: Vec2, angle: f32) {
        self.transforms.insert(entity, (pos, angle));
    }

    fn set_flipped(&mut self, _entity: u64, _flipped: bool) {}

    fn set_background(&mut self, _texture: Option<TextureHandle>, scroll_factor: f32) {
        self.background = Some(scroll_factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_media_misses() {
        let media = NullMedia;
        assert!(media.image("hero.png").is_none());
        assert!(media.sound("badsound.ogg").is_none());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::default();
        assert_eq!(store.read_int("unlocked"), None);
        store.write_int("unlocked", 3).unwrap();
        assert_eq!(store.read_int("unlocked"), Some(3));
    }

    #[test]
    fn test_recording_scene_tracks_visibility() {
        let mut scene = RecordingScene::default();
        scene.attach(7, None, Vec2::ONE);
        scene.set_visible(7, false);
        assert_eq!(scene.visibility.get(&7), Some(&false));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("no disk".to_string());
        assert_eq!(err.to_string(), "score store unavailable: no disk");
    }
}
