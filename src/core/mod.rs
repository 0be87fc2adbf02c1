// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod units;
pub mod word_boundaries;

#[cfg(test)]
pub mod test_fixtures;

// Re-export.
pub use units::*;
pub use word_boundaries::*;
