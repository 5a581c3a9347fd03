//! Songforge CLI library: command implementations behind the `songforge`
//! binary.

pub mod commands;
