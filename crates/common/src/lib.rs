//! Common utilities and shared types for the classroom backend.
//!
//! This crate provides foundational components used across all classroom crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: 24-hex document identifiers via [`IdGenerator`]
//! - **ID Parsing**: Identifier validation via [`parse_id`]
//!
//! # Example
//!
//! ```no_run
//! use classroom_common::{AppResult, Config, IdGenerator, parse_id};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = parse_id(&id_gen.generate())?;
//!     println!("Generated ID: {id} on port {}", config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::Config;
pub use error::{AppError, AppResult, FieldErrors};
pub use id::{IdGenerator, is_valid_id, parse_id};
