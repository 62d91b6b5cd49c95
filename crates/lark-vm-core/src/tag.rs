//! Executable tags
//!
//! Decoded container tags paired with their execution behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lark_vm_bytecode::{
    ActionBlock, ButtonCondAction, DoAction, DoInitAction, decode_button_cond_actions,
};
use tracing::debug;

use crate::error::VmResult;
use crate::interpreter::Interpreter;
use crate::value::Value;
use crate::worker::Worker;

/// A tag whose actions run on a worker
pub trait ExecutableTag {
    /// Run the tag's actions as top-level code
    fn execute(&self, worker: &Worker) -> VmResult<Value>;
}

fn run_top_level(worker: &Worker, actions: &ActionBlock) -> VmResult<Value> {
    let mut ctx = worker.top_level_context();
    Interpreter::new(worker).run(&mut ctx, actions)
}

/// Frame actions
#[derive(Debug, Clone)]
pub struct DoActionTag {
    actions: Arc<ActionBlock>,
}

impl DoActionTag {
    /// Decode from a tag body
    pub fn decode(body: &[u8]) -> VmResult<Self> {
        Ok(DoAction::decode(body)?.into())
    }

    /// Decoded records
    pub fn actions(&self) -> &ActionBlock {
        &self.actions
    }
}

impl From<DoAction> for DoActionTag {
    fn from(tag: DoAction) -> Self {
        Self {
            actions: Arc::new(tag.actions),
        }
    }
}

impl ExecutableTag for DoActionTag {
    fn execute(&self, worker: &Worker) -> VmResult<Value> {
        run_top_level(worker, &self.actions)
    }
}

/// Sprite initialization actions, run at most once per instantiation
#[derive(Debug)]
pub struct DoInitActionTag {
    sprite_id: u16,
    actions: Arc<ActionBlock>,
    done: AtomicBool,
}

impl DoInitActionTag {
    /// Decode from a tag body
    pub fn decode(body: &[u8]) -> VmResult<Self> {
        Ok(DoInitAction::decode(body)?.into())
    }

    /// Sprite the actions belong to
    pub fn sprite_id(&self) -> u16 {
        self.sprite_id
    }

    /// Decoded records
    pub fn actions(&self) -> &ActionBlock {
        &self.actions
    }

    /// True once the actions have run
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Allow the actions to run again for a new instantiation
    pub fn reset(&self) {
        self.done.store(false, Ordering::SeqCst);
    }
}

impl From<DoInitAction> for DoInitActionTag {
    fn from(tag: DoInitAction) -> Self {
        Self {
            sprite_id: tag.sprite_id,
            actions: Arc::new(tag.actions),
            done: AtomicBool::new(false),
        }
    }
}

impl ExecutableTag for DoInitActionTag {
    fn execute(&self, worker: &Worker) -> VmResult<Value> {
        if self.done.swap(true, Ordering::SeqCst) {
            debug!(sprite = self.sprite_id, "init actions already ran");
            return Ok(Value::Undefined);
        }
        run_top_level(worker, &self.actions)
    }
}

/// A button's condition/action list
#[derive(Debug, Clone)]
pub struct ButtonActions {
    entries: Vec<ButtonCondAction>,
}

impl ButtonActions {
    /// Decode a condition/action list
    pub fn decode(data: &[u8]) -> VmResult<Self> {
        Ok(Self {
            entries: decode_button_cond_actions(data)?,
        })
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[ButtonCondAction] {
        &self.entries
    }

    /// Run every entry matching a transition in `mask`; returns how many ran
    pub fn handle_transition(&self, worker: &Worker, mask: u16) -> VmResult<usize> {
        self.run_matching(worker, |entry| entry.conditions.matches(mask))
    }

    /// Run every entry bound to `key`; returns how many ran
    pub fn handle_key(&self, worker: &Worker, key: u8) -> VmResult<usize> {
        self.run_matching(worker, |entry| key != 0 && entry.conditions.key_press() == key)
    }

    fn run_matching(
        &self,
        worker: &Worker,
        matches: impl Fn(&ButtonCondAction) -> bool,
    ) -> VmResult<usize> {
        let mut ran = 0;
        for entry in self.entries.iter().filter(|e| matches(e)) {
            run_top_level(worker, &entry.actions)?;
            ran += 1;
        }
        Ok(ran)
    }
}

impl ExecutableTag for ButtonActions {
    /// Runs every entry, as if all conditions fired
    fn execute(&self, worker: &Worker) -> VmResult<Value> {
        self.run_matching(worker, |_| true)?;
        Ok(Value::Undefined)
    }
}
