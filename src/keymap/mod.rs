// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod decoder;
pub mod defaults;
pub mod keymap;
pub mod keys;

// Re-export.
pub use decoder::*;
pub use defaults::*;
pub use keymap::*;
pub use keys::*;
