//! Run command - execute an action stream.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use lark_vm_core::{
    DoActionTag, DoInitActionTag, EngineConfig, ExecutableTag, Stage, Value, Worker,
};
use lark_vm_host::{Capabilities, CapabilitiesBuilder, Host, HostConfig, install};
use std::path::PathBuf;
use std::sync::Arc;

/// Stage that prints trace output and ignores the timeline
struct ConsoleStage;

impl Stage for ConsoleStage {
    fn trace(&self, message: &str) {
        println!("{message}");
    }
}

#[derive(Args)]
pub struct RunCommand {
    /// Raw tag body to execute
    pub file: PathBuf,

    /// Arguments reported by System.argv
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Treat the file as a DoInitAction body (sprite id prefix)
    #[arg(long)]
    pub init: bool,

    /// Allow file system read access (use without value for all paths)
    #[arg(long = "allow-read", value_name = "PATH", num_args = 0..)]
    pub allow_read: Option<Vec<String>>,

    /// Allow file system write access (use without value for all paths)
    #[arg(long = "allow-write", value_name = "PATH", num_args = 0..)]
    pub allow_write: Option<Vec<String>>,

    /// Allow all permissions
    #[arg(long = "allow-all", short = 'A')]
    pub allow_all: bool,

    /// SWF version of the content
    #[arg(long = "swf-version", default_value_t = 10)]
    pub swf_version: u8,

    /// Maximum nested call depth
    #[arg(long = "max-call-depth", default_value_t = 256)]
    pub max_call_depth: usize,

    /// Report "jit" from System.getRunmode
    #[arg(long)]
    pub jit: bool,
}

impl RunCommand {
    pub fn run(&self, config: &HostConfig) -> Result<()> {
        let caps = self.build_capabilities(config);
        let bytes = std::fs::read(&self.file)
            .with_context(|| format!("reading {}", self.file.display()))?;

        let mut host_config = config.clone();
        if !self.args.is_empty() {
            host_config.argv = self.args.clone();
        }

        let worker = Worker::builder()
            .config(
                EngineConfig::default()
                    .with_swf_version(self.swf_version)
                    .with_max_call_depth(self.max_call_depth)
                    .with_jit(self.jit),
            )
            .stage(Arc::new(ConsoleStage))
            .build();
        install(&worker, &Host::with_capabilities(caps).config(host_config));

        let result = if self.init {
            let tag = DoInitActionTag::decode(&bytes)?;
            tracing::debug!(sprite = tag.sprite_id(), "running init actions");
            tag.execute(&worker)
        } else {
            DoActionTag::decode(&bytes)?.execute(&worker)
        };

        match result {
            Ok(Value::Undefined) => Ok(()),
            Ok(value) => {
                println!("{value}");
                Ok(())
            }
            Err(err) => match err.error_id() {
                Some(id) => Err(anyhow!("Error #{id}: {err}")),
                None => Err(anyhow!("{err}")),
            },
        }
    }

    fn build_capabilities(&self, config: &HostConfig) -> Capabilities {
        if self.allow_all {
            return Capabilities::all();
        }

        // CLI flags replace the config file grants
        let from_config = config.capabilities();
        let mut builder = CapabilitiesBuilder::new();

        match &self.allow_read {
            Some(paths) if paths.is_empty() => builder = builder.allow_read_all(),
            Some(paths) => builder = builder.allow_read(paths.iter().map(PathBuf::from)),
            None => {
                if let Some(paths) = from_config.fs_read {
                    builder = builder.allow_read(paths);
                }
            }
        }

        match &self.allow_write {
            Some(paths) if paths.is_empty() => builder = builder.allow_write_all(),
            Some(paths) => builder = builder.allow_write(paths.iter().map(PathBuf::from)),
            None => {
                if let Some(paths) = from_config.fs_write {
                    builder = builder.allow_write(paths);
                }
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunCommand,
    }

    fn parse(args: &[&str]) -> RunCommand {
        Harness::parse_from(std::iter::once("lark").chain(args.iter().copied())).run
    }

    #[test]
    fn test_no_flags_no_config_denies() {
        let cmd = parse(&["frame.bin"]);
        let caps = cmd.build_capabilities(&HostConfig::default());
        assert_eq!(caps, Capabilities::none());
    }

    #[test]
    fn test_bare_allow_read_grants_all_reads() {
        let cmd = parse(&["--allow-read", "--", "frame.bin"]);
        let caps = cmd.build_capabilities(&HostConfig::default());
        assert_eq!(caps.fs_read, Some(vec![]));
        assert!(caps.fs_write.is_none());
    }

    #[test]
    fn test_config_grants_used_without_flags() {
        let config = HostConfig::from_toml_str(
            r#"
            [permissions]
            allow_write = ["/tmp/out"]
            "#,
        )
        .unwrap();
        let cmd = parse(&["frame.bin"]);
        let caps = cmd.build_capabilities(&config);
        assert!(caps.fs_read.is_none());
        assert_eq!(caps.fs_write.map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_allow_all_wins() {
        let cmd = parse(&["-A", "frame.bin"]);
        assert_eq!(cmd.build_capabilities(&HostConfig::default()), Capabilities::all());
    }
}
