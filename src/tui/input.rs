// Key repeat and debounce policy
//
// Some terminals report a held key as a stream of presses without releases.
// Navigation keys are allowed to auto-repeat after a delay; action keys
// (toggle, page change, open overlay) trigger once per press so a held
// space bar doesn't flip the same row back and forth, and a held `l`
// doesn't fire page requests faster than they can complete.

use crossterm::event::KeyCode;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Re-trigger window for action keys on terminals without release events
const ACTION_DEBOUNCE: Duration = Duration::from_millis(150);

/// How a key behaves while held
#[derive(Debug, Clone, Copy)]
pub enum KeyBehavior {
    /// Trigger once per press
    Once,
    /// Trigger on press, then repeat after `initial_delay` every `interval`
    Repeat {
        initial_delay: Duration,
        interval: Duration,
    },
}

impl KeyBehavior {
    /// Cursor movement
    pub fn cursor() -> Self {
        Self::Repeat {
            initial_delay: Duration::from_millis(400),
            interval: Duration::from_millis(40),
        }
    }
}

#[derive(Debug, Default)]
struct KeyState {
    pressed_at: Option<Instant>,
    last_fired: Option<Instant>,
}

/// Decides whether a key press should fire its action
pub struct InputHandler {
    states: HashMap<KeyCode, KeyState>,
    behaviors: HashMap<KeyCode, KeyBehavior>,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            behaviors: HashMap::new(),
        }
    }

    pub fn configure(&mut self, keys: &[KeyCode], behavior: KeyBehavior) {
        for key in keys {
            self.behaviors.insert(*key, behavior);
        }
    }

    /// Returns true if the action bound to `key` should run
    pub fn press(&mut self, key: KeyCode) -> bool {
        let now = Instant::now();
        let behavior = self
            .behaviors
            .get(&key)
            .copied()
            .unwrap_or(KeyBehavior::Once);
        let state = self.states.entry(key).or_default();

        let (Some(pressed_at), Some(last_fired)) = (state.pressed_at, state.last_fired) else {
            state.pressed_at = Some(now);
            state.last_fired = Some(now);
            return true;
        };

        let fire = match behavior {
            KeyBehavior::Once => now.duration_since(last_fired) >= ACTION_DEBOUNCE,
            KeyBehavior::Repeat {
                initial_delay,
                interval,
            } => {
                now.duration_since(pressed_at) >= initial_delay
                    && now.duration_since(last_fired) >= interval
            }
        };
        if fire {
            state.last_fired = Some(now);
        }
        fire
    }

    pub fn release(&mut self, key: KeyCode) {
        self.states.remove(&key);
    }

    pub fn with_default_config() -> Self {
        let mut handler = Self::new();
        handler.configure(
            &[
                KeyCode::Up,
                KeyCode::Down,
                KeyCode::Char('j'),
                KeyCode::Char('k'),
            ],
            KeyBehavior::cursor(),
        );
        handler
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::with_default_config()
    }
}
