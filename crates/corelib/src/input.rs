//! Keyboard and mouse snapshot filled by the platform layer.

use crate::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Space,
    LeftShift,
    Escape,
}

impl Key {
    pub const COUNT: usize = 9;

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, Default)]
pub struct InputState {
    keys: [bool; Key::COUNT],
    mouse_position: Vec2,
    mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_down(&self, key: Key) -> bool {
        self.keys[key.index()]
    }

    #[inline]
    pub fn set_key(&mut self, key: Key, down: bool) {
        self.keys[key.index()] = down;
    }

    #[inline]
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn set_mouse_position(&mut self, position: Vec2) {
        self.mouse_position = position;
    }

    /// Accumulates relative motion until the next [`InputState::take_mouse_delta`].
    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    /// Returns the motion gathered since the last call and resets it.
    pub fn take_mouse_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.mouse_delta)
    }
}
