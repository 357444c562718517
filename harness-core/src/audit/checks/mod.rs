//! Standard audit sections
//!
//! `structure`, `config`, `protection` and `hooks` are static inspections of
//! the project tree. `enforcement` executes the hook scripts with synthetic
//! payloads, and `tooling` probes the PATH, so their results also depend on
//! the machine running the audit.

pub mod config;
pub mod enforcement;
pub mod hooks;
pub mod protection;
pub mod structure;
pub mod tooling;
