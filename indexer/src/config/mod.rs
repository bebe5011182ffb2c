//! Configuration loading and validation for the indexer.
//!
//! Configuration is a single required JSON file (spec §6); there is no
//! environment-variable layering and no defaults.
//!
//! ```ignore
//! use indexer::config::Settings;
//!
//! let settings = Settings::from_file("./config.json")?;
//! settings.validate().map_err(|errs| /* fatal */)?;
//! ```

mod settings;

pub use settings::Settings;
