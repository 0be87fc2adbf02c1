// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod candidate;
pub mod engine;
pub mod matchers;
pub mod menu;

// Re-export.
pub use candidate::*;
pub use engine::*;
pub use matchers::*;
pub use menu::*;
