//! Engine configuration

/// Configuration for a [`Worker`](crate::Worker)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SWF version of the content being executed
    pub swf_version: u8,
    /// Maximum nested function call depth
    pub max_call_depth: usize,
    /// Reported by `System.getRunmode`
    pub use_jit: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            swf_version: 10,
            max_call_depth: 256,
            use_jit: false,
        }
    }
}

impl EngineConfig {
    /// Set the SWF version
    pub fn with_swf_version(mut self, version: u8) -> Self {
        self.swf_version = version;
        self
    }

    /// Set the call depth limit
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Set the JIT flag
    pub fn with_jit(mut self, enabled: bool) -> Self {
        self.use_jit = enabled;
        self
    }

    /// Name of the run mode
    pub fn run_mode(&self) -> &'static str {
        if self.use_jit { "jit" } else { "interpreted" }
    }
}
