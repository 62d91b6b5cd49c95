//! Display-list capability used by timeline actions
//!
//! The interpreter does not own a display list. Timeline actions are
//! forwarded to a [`Stage`] supplied by the embedder; every method has a
//! no-op default so embedders implement only what they render.

use tracing::info;

use crate::object::ObjectRef;
use crate::value::Value;

/// Timeline and display-list operations
#[allow(unused_variables)]
pub trait Stage: Send + Sync {
    /// `ActionNextFrame`
    fn next_frame(&self) {}

    /// `ActionPreviousFrame`
    fn previous_frame(&self) {}

    /// `ActionPlay`
    fn play(&self) {}

    /// `ActionStop`
    fn stop(&self) {}

    /// `ActionGotoFrame`/`ActionGotoFrame2` with a frame number (0-based)
    fn goto_frame(&self, frame: u32, play: bool) {}

    /// `ActionGoToLabel`/`ActionGotoFrame2` with a label
    fn goto_label(&self, label: &str, play: bool) {}

    /// `ActionToggleQuality`
    fn toggle_quality(&self) {}

    /// `ActionStopSounds`
    fn stop_sounds(&self) {}

    /// `ActionGetUrl`/`ActionGetUrl2`
    fn get_url(&self, url: &str, target: &str, flags: u8) {}

    /// `ActionGetProperty`
    fn get_property(&self, target: &str, index: u32) -> Value {
        Value::Undefined
    }

    /// `ActionSetProperty`
    fn set_property(&self, target: &str, index: u32, value: Value) {}

    /// `ActionCloneSprite`
    fn clone_sprite(&self, source: &str, target: &str, depth: i32) {}

    /// `ActionRemoveSprite`
    fn remove_sprite(&self, target: &str) {}

    /// `ActionCall`: run a frame's actions
    fn call_frame(&self, frame: &Value) {}

    /// `ActionTrace` output
    fn trace(&self, message: &str) {
        info!(target: "lark::trace", "{message}");
    }

    /// Root timeline object
    fn root(&self) -> Option<ObjectRef> {
        None
    }

    /// Parent clip of `this`
    fn parent_of(&self, this: &Value) -> Option<ObjectRef> {
        None
    }
}

/// Stage without a display list
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStage;

impl Stage for NullStage {}
