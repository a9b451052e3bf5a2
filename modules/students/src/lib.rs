// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === MODULE DEFINITION ===
// Explicit wiring: the server builds this once at startup.
pub mod module;
pub use module::Students;

// === INTERNAL MODULES ===
// Exposed for integration tests; other crates should stick to `contract` and `module`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
