//! # Lark VM Bytecode
//!
//! Decoder and record model for AVM1 action streams, the tag-delimited
//! bytecode embedded in `DoAction`, `DoInitAction` and button tags.
//!
//! ## Design Principles
//!
//! - **Byte-synchronized**: every record consumes exactly its declared length
//! - **Immutable records**: decoding produces plain data, execution lives elsewhere
//! - **Fail per tag**: a truncated record fails its own tag, never its siblings
//! - **Serializable**: records derive serde for disassembly output

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod action;
pub mod builder;
pub mod decoder;
pub mod error;
pub mod opcode;
pub mod reader;
pub mod tag;

pub use action::{
    Action, ActionBlock, ActionRecord, FunctionDef, FunctionDef2, JumpTarget, PreloadFlags,
    PushValue, RegisterParam,
};
pub use builder::ActionStreamBuilder;
pub use decoder::{MAX_NESTING, decode_actions, decode_block, decode_record};
pub use error::BytecodeError;
pub use opcode::ActionCode;
pub use reader::ByteReader;
pub use tag::{
    ButtonCondAction, ButtonConditions, DoAction, DoInitAction, ExportAssets,
    decode_button_cond_actions,
};

/// Render a block as indented text, one record per line
pub fn disassemble(block: &ActionBlock) -> String {
    let mut out = String::new();
    write_block(&mut out, block, 0);
    out
}

fn write_block(out: &mut String, block: &ActionBlock, depth: usize) {
    use std::fmt::Write;
    for record in block.records() {
        let indent = "  ".repeat(depth);
        let _ = match &record.action {
            Action::Push(values) => writeln!(out, "{indent}{:04X} Push {values:?}", record.offset),
            Action::Jump(o) | Action::If(o) => writeln!(
                out,
                "{indent}{:04X} {} {o:+} -> {:04X}",
                record.offset,
                record.action.name(),
                record.end() as i64 + *o as i64
            ),
            Action::ConstantPool(pool) => {
                writeln!(out, "{indent}{:04X} ConstantPool {pool:?}", record.offset)
            }
            Action::StoreRegister(r) => {
                writeln!(out, "{indent}{:04X} StoreRegister r{r}", record.offset)
            }
            action => writeln!(out, "{indent}{:04X} {}", record.offset, action.name()),
        };
        match &record.action {
            Action::DefineFunction(def) => write_block(out, &def.body, depth + 1),
            Action::DefineFunction2(def) => write_block(out, &def.body, depth + 1),
            Action::With(body) => write_block(out, body, depth + 1),
            _ => {}
        }
    }
}
