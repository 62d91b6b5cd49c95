//! Disasm command - print the records of an action stream.

use anyhow::{Context, Result};
use clap::Args;
use lark_vm_bytecode::{DoInitAction, decode_actions, disassemble};
use std::path::PathBuf;

#[derive(Args)]
pub struct DisasmCommand {
    /// Raw tag body to decode
    pub file: PathBuf,

    /// Treat the file as a DoInitAction body (sprite id prefix)
    #[arg(long)]
    pub init: bool,

    /// Emit the records as JSON
    #[arg(long)]
    pub json: bool,
}

impl DisasmCommand {
    pub fn run(&self) -> Result<()> {
        let bytes = std::fs::read(&self.file)
            .with_context(|| format!("reading {}", self.file.display()))?;

        let block = if self.init {
            let tag = DoInitAction::decode(&bytes)?;
            if !self.json {
                println!("; sprite {}", tag.sprite_id);
            }
            tag.actions
        } else {
            decode_actions(&bytes)?
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&block)?);
        } else {
            print!("{}", disassemble(&block));
        }
        Ok(())
    }
}
