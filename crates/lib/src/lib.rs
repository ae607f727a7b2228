//! unideps-lib: fetch, patch and build the native dependencies of UniRender.
//!
//! The crate is organised around a few types:
//! - [`BuildConfig`](config::BuildConfig): the explicit configuration every step receives
//! - [`Recipe`](recipe::Recipe): the actions for one dependency, with an optional revision gate
//! - [`Runner`](execute::Runner): executes one [`Action`](action::Action) at a time
//! - [`Driver`](driver::Driver): runs recipes in order and collects a [`Registry`](artifacts::Registry)

pub mod action;
pub mod artifacts;
pub mod checks;
pub mod config;
pub mod consts;
pub mod driver;
pub mod execute;
pub mod marker;
pub mod platform;
pub mod recipe;
pub mod util;
