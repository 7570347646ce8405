//! External-process adapters for the release pipeline.
//!
//! This crate provides:
//! - [`adapter`]: the [`Toolchain`] and [`ReleasePublisher`] seams
//! - [`SystemToolchain`]: Python scripts, Ghostscript, or built-in `lopdf` operations
//! - [`GhPublisher`] / [`DryRunPublisher`]: GitHub CLI publishing
//! - [`process`]: running and locating programs

pub mod adapter;
pub mod gh;
pub mod ghostscript;
pub mod process;
pub mod system;

pub use adapter::{ReleasePublisher, ReleaseRequest, Requirement, Toolchain};
pub use gh::{DryRunPublisher, GhPublisher};
pub use process::{ProcessOutput, locate};
pub use system::SystemToolchain;
