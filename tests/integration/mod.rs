//! Integration Tests Module
//!
//! End-to-end coverage of the orchestration core: the four-phase agent
//! lifecycle (bounded approval waits, sequential execution, cooperative
//! stop), the insight ledger fed from real runs, and the debounced fan-in
//! synthesis across agents.

mod common;

// Four-phase agent lifecycle tests
mod lifecycle_test;

// Cross-agent fan-in and synthesis tests
mod orchestrator_test;
