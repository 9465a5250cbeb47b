//! Profiling and diagnostics tooling.
//!
//! - cpu.rs: CPU usage profile written to a file while the daemon runs
//! - diagnostics.rs: optional HTTP listener with metrics and runtime dumps

pub mod cpu;
pub mod diagnostics;

pub use cpu::CpuProfiler;
