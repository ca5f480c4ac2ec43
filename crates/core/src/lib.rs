#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Core library for stencil - project-template scanning, linting, and rendering.
//!
//! A template is a directory tree whose directory names, file names, and file
//! contents may embed `{{ name }}` placeholders, declared in a sidecar
//! `.stencil(.json|.jsonc)` file. This crate discovers placeholder references,
//! cross-checks them against the declaration, repairs the declaration, and
//! substitutes concrete values into the tree - either as a pure preview diff
//! or as a committed in-place transformation.
//!
//! The engine is synchronous and single-threaded; tree walks are fully
//! deterministic so consecutive invocations observe the same ordering.

pub mod config;
pub mod lint;
pub mod placeholder;
pub mod render;
pub mod scan;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
