// lib.rs — the headless setup client. The binary (main.rs) and the
// integration tests in tests/ both use it as `astrana_setup::module::Type`.

pub mod config;
pub mod error;
pub mod gateway;
pub mod services;
pub mod session;
pub mod setup;
pub mod strings;
pub mod wizard;
