//! casemap: reshape investigation record bags into mind-map trees.
//!
//! Layers, innermost first:
//! - [`domain`]: records, display formatting, tree model and the builder
//! - [`application`]: document loading, rendering and batch conversion
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
