//! Integration tests for unideps-lib's public API.

mod common;
mod driver_tests;
mod executor_tests;
