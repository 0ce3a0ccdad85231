//! Regression tests for the `concord` command-line interface.

#[cfg(test)]
pub mod cli;
