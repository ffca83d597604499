//! # State Module
//!
//! Process-wide state handed to every command.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  run()                                                                  │
//! │   ├── AppConfig::load(--config)     env > config.toml > defaults        │
//! │   └── DbState::open(&config)        SQLite pool + migrations            │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  commands::*(&DbState, &AppConfig, ...)                                 │
//! │                                                                         │
//! │  • DbState: Database has an internal connection pool (thread-safe)     │
//! │  • AppConfig: read-only after startup                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;

pub use config::{default_config_path, default_database_path, AppConfig, ConfigError};
pub use db::DbState;
