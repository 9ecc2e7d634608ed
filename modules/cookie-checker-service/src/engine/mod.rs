//! The check engine: a small interpreter over declarative service workflows.
//!
//! A service config is an ordered list of blocks (REQUEST / PARSE / FUNCTION /
//! KEYCHECK). The executor walks them in order, threading a per-check
//! environment of cookies, captures, and saved responses, and produces a
//! terminal [`CheckResult`](executor::CheckResult).

pub mod config;
pub mod cookies;
pub mod executor;
pub mod functions;
pub mod keycheck;
pub mod parse;
pub mod substitute;
