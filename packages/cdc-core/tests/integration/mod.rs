//! Integration test suite for the change event loop.
//!
//! 1. Dispatch of decoded envelopes through the loop
//! 2. Failure recovery (decode, read, sink)
//! 3. Cancellation and transport release
//! 4. File replay end to end

pub mod helpers;
pub mod recovery_tests;
