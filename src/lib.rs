//! Terminal viewer for git change sets with hunk-level staging.
//!
//! The engine ([`patch`], [`window`], [`navigator`], [`apply`] and
//! [`controller`]) is UI-agnostic. [`app`] and [`ui`] put it on a terminal.

pub mod app;
pub mod apply;
pub mod controller;
pub mod git;
pub mod highlight;
pub mod navigator;
pub mod patch;
pub mod types;
pub mod ui;
pub mod window;
