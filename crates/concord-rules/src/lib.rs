//! Compiles schema constraint trees into validation rule maps.
//!
//! The target rule language is Laravel-style: one pipe-joined rule string
//! per field path, dot notation for nesting, a literal `*` segment for
//! "each array element" (e.g. `items.*.name`). Code generation that turns
//! rule maps into source text lives downstream; this crate stops at the
//! `field path -> rule string` map.

pub mod compiler;

pub use compiler::{
    first_token_for, CompilerOptions, PatternWarning, Rule, RuleCompiler,
};
