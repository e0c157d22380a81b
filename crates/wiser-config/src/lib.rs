// SPDX-FileCopyrightText: 2026 Wiser Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Wiser offline sync core.
//!
//! `[client]`, `[storage]`, `[sync]` and `[remote]` sections are read from
//! layered `wiser.toml` files and `WISER_*` variables, rejected on unknown
//! keys, and checked for values the sync core cannot run with. Every problem
//! is reported at once as a miette diagnostic.
//!
//! ```no_run
//! let config = match wiser_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         wiser_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("queue database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError, ConfigSources};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::WiserConfig;

/// Loads the layered configuration and validates it.
pub fn load_and_validate() -> Result<WiserConfig, Vec<ConfigError>> {
    let sources = ConfigSources::read(&loader::config_paths());
    validated(loader::load_config(), &sources)
}

/// Loads configuration from a TOML string alone and validates it.
pub fn load_and_validate_str(toml_content: &str) -> Result<WiserConfig, Vec<ConfigError>> {
    validated(
        loader::load_config_from_str(toml_content),
        &ConfigSources::inline(toml_content),
    )
}

fn validated(
    loaded: Result<WiserConfig, figment::Error>,
    sources: &ConfigSources,
) -> Result<WiserConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, sources))?;
    validation::validate_config(&config).map_err(|errors| {
        errors
            .into_iter()
            .map(|error| error.located(sources))
            .collect::<Vec<_>>()
    })?;
    Ok(config)
}
