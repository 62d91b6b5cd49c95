//! CLI command implementations.

pub mod disasm;
pub mod run;
