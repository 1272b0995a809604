#![deny(missing_docs)]

//! Rust bindings for the SCWS Chinese word segmentation C API.
//!
//! This crate wraps the engine's narrow C contract — create, configure,
//! feed text, drain a linked result list, free — behind an owning handle
//! with a typed configuration surface.
//!
//! ## Quick Start
//! ```no_run
//! use scws_rs::Scws;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scws = Scws::new()?;
//!     for word in scws.segment("我是中国人")? {
//!         println!("{}/{}", word.word, word.attr);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Initialization Paths
//! 1. Automatic via [`Scws::new`]
//!    - Loads the dynamic library from `SCWS_LIBRARY_PATH` or common
//!      platform locations, and discovers default dictionary/rule files.
//! 2. Explicit via [`Scws::from_config`] / [`ScwsLibrary::load`]
//!    - For controlled deployments with fixed library/dictionary paths.
//!
//! ```no_run
//! use scws_rs::{Charset, MultiMode, Scws, ScwsConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScwsConfig::default()
//!         .with_library_path("/usr/local/scws/lib/libscws.so")
//!         .with_charset(Charset::Utf8)
//!         .with_dict_spec("./dicts/base.xdb:./dicts/extra.txt")
//!         .with_apply_stop_word(true)
//!         .with_multi(MultiMode::Short);
//!     let scws = Scws::from_config(config)?;
//!     let _words = scws.segment("分词测试")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Offset And Unit Rules
//! - [`Word::offset`] / [`Word::length`] are BYTE positions in the exact
//!   byte sequence fed to the engine for that call.
//! - GBK input goes through [`Scws::segment_bytes`]; the returned offsets
//!   index the caller's buffer.
//!
//! ## Concurrency
//! An [`Scws`] instance is neither `Send` nor `Sync`; segmentation mutates
//! engine-internal state with no synchronization. Use one instance per
//! worker — independent instances run fully in parallel.
//!
//! ## Logging
//! Diagnostics are emitted through [`tracing`]. Warnings (fallbacks,
//! dictionary load failures) are always emitted; per-step configuration and
//! per-call statistics are `debug`-level events gated by
//! [`ScwsConfig::debug`]. The crate installs no subscriber.
//!
//! ## Environment Variables
//! - `SCWS_LIBRARY_PATH`: explicit dynamic library path.
//! - `SCWS_DICT_PATH`: explicit default dictionary path.
//! - `SCWS_RULE_PATH`: explicit default rule file path.

mod config;
mod constants;
mod discovery;
mod error;
mod model;
mod native;
mod runtime;
mod types;

pub use constants::*;
pub use error::{Result, ScwsError};
pub use model::Word;
pub use runtime::{Scws, ScwsLibrary};
pub use types::{Charset, DictMode, DictSource, MultiMode, RuleSpec, ScwsConfig};

#[cfg(test)]
mod test_support;
