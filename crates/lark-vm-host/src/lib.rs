//! # Lark VM Host
//!
//! The `avmplus` surface a script uses to reach the host: files, system
//! information, and application domains with dynamic code loading.
//!
//! ## Design Principles
//!
//! - **Injected I/O**: every file access goes through [`HostIo`]
//! - **Deny by default**: [`FsHostIo`] only touches paths granted by
//!   [`Capabilities`]
//! - **Script-visible errors**: failures surface as `VmError`s carrying
//!   player error numbers

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod capabilities;
pub mod config;
pub mod domain;
pub mod error;
pub mod file;
pub mod install;
pub mod io;
pub mod native;
pub mod system;

pub use capabilities::{Capabilities, CapabilitiesBuilder, PermissionDenied};
pub use config::{HostConfig, PermissionsConfig};
pub use error::{HostError, HostResult};
pub use file::File;
pub use install::{Host, install};
pub use io::{FsHostIo, HostIo, MemoryHostIo};
pub use native::Args;
pub use system::canonicalize_number;
