//! minish: a small fork/exec shell engine.
//!
//! One input line is split on whitespace ([`parser`]), assigned exactly one
//! execution mode ([`classify`]) and run by the matching executor in
//! [`eval`]: a plain command, a single `a | b` pipeline, a `>`, `>>` or `<`
//! redirection, or a `&` background launch. `cd` is a builtin.
//!
//! - **[`types`]**: token sequences, command and redirection specs, modes.
//! - **[`redirect`]**: descriptor plans applied in a child before exec.
//! - **[`job`]**: forking, waiting, background launch bookkeeping.
//! - **[`config`]**: embedded defaults plus user overlay.
//! - **[`logging`]**: `simplelog` setup.

pub mod builtin;
pub mod classify;
pub mod config;
pub mod eval;
pub mod global;
pub mod job;
pub mod logging;
pub mod parser;
pub mod redirect;
pub mod types;

pub use eval::{eval_line, Outcome, ShellError};
pub use global::State;
