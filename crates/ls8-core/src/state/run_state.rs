/// Execution state of the dispatch loop.
///
/// The machine boots `Running` and transitions to `Halted` exactly once,
/// when `HLT` retires. `Halted` is the designed termination path, not an
/// error; faults propagate separately as [`crate::Fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next cycle.
    #[default]
    Running,
    /// `HLT` retired; no further cycles will execute.
    Halted,
}

impl RunState {
    /// Returns `true` once `HLT` has retired.
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::Halted)
    }
}
