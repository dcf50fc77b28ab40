//! Execution limits and feature toggles for a single `ExecutionContext` run.

/// Tunables a host sets once per run. Defaults favor correctness over
/// sandboxing — a host embedding this in a request-serving process should
/// tighten `max_instructions`/`max_call_depth` itself.
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Hard cap on instructions dispatched in one run; `0` means unlimited.
    /// Guards against runaway loops in hosted/untrusted-script settings.
    pub max_instructions: u64,
    pub max_call_depth: u32,
    /// Whether `debug-hooks` observers are actually invoked even when the
    /// feature is compiled in — lets a host compile them in once and flip
    /// them on only for a profiling run.
    pub enable_observer: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_instructions: 0,
            max_call_depth: 256,
            enable_observer: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_instruction_cap() {
        assert_eq!(VmConfig::default().max_instructions, 0);
    }
}
