//! Named boolean story flags owned by the scene.

use ahash::AHashMap;

/// Flag that allows enemies to open fire.
pub const FLAG_CAN_ENEMY_SHOOT: &str = "canEnemyShoot";

/// Flag raised when the player dies.
pub const FLAG_PLAYER_DEAD: &str = "player_dead";

/// Set of named boolean flags. Missing flags read as `false`.
#[derive(Debug, Clone, Default)]
pub struct GameFlags {
    flags: AHashMap<String, bool>,
}

impl GameFlags {
    /// Creates an empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a flag set holding the scene-start defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut flags = Self::new();
        flags.apply_defaults();
        flags
    }

    /// Sets a flag. Empty names are ignored.
    pub fn set(&mut self, name: &str, value: bool) {
        if name.is_empty() {
            return;
        }
        self.flags.insert(name.to_owned(), value);
    }

    /// Reads a flag, `false` if unset.
    #[must_use]
    pub fn get(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Inverts a flag and returns the new value.
    pub fn toggle(&mut self, name: &str) -> bool {
        let value = !self.get(name);
        self.set(name, value);
        value
    }

    /// Removes every flag.
    pub fn clear(&mut self) {
        self.flags.clear();
    }

    /// Number of flags explicitly set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns whether no flags are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Seeds the flags every scene starts with.
    pub fn apply_defaults(&mut self) {
        self.set(FLAG_CAN_ENEMY_SHOOT, true);
        self.set(FLAG_PLAYER_DEAD, false);
    }
}
