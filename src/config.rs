//! Database group configuration.
//!
//! Groups are read from the environment, after loading a `.env` file when one
//! is present:
//!
//! * `DATABASE_URL` configures the `default` group;
//! * `DATABASE_URL_<GROUP>` configures the group `<group>` (lower-cased).
//!
//! A group configured twice (`DATABASE_URL` and `DATABASE_URL_DEFAULT`, or two
//! spellings of one group name) is a configuration error.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::env;
use tracing::{debug, warn};

use crate::{TransactionError, TransactionResult};

/// Name of the group configured by `DATABASE_URL`.
pub const DEFAULT_GROUP: &str = "default";

const URL_VAR: &str = "DATABASE_URL";
const GROUP_URL_PREFIX: &str = "DATABASE_URL_";

/// Connection URLs of the named database groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    groups: BTreeMap<String, String>,
}

impl DatabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load groups from the process environment.
    ///
    /// Variables whose name is not valid UTF-8 are skipped. A group variable
    /// whose value is not valid UTF-8 is a configuration error.
    pub fn from_env() -> TransactionResult<Self> {
        if dotenv::dotenv().is_err() {
            debug!("no .env file found, using process environment only");
        }

        let mut vars = Vec::new();
        for (name, value) in env::vars_os() {
            let Some(name) = name.to_str() else {
                continue;
            };
            if name != URL_VAR && !name.starts_with(GROUP_URL_PREFIX) {
                continue;
            }
            let value = value.into_string().map_err(|_| {
                TransactionError::Configuration(format!("`{name}` is not valid UTF-8"))
            })?;
            vars.push((name.to_string(), value));
        }
        Self::from_vars(vars)
    }

    /// Load groups from `(name, value)` pairs shaped like environment variables.
    /// Variables that do not configure a group are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> TransactionResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::new();
        for (name, value) in vars {
            let name = name.as_ref();
            let group = if name == URL_VAR {
                DEFAULT_GROUP.to_string()
            } else if let Some(suffix) = name.strip_prefix(GROUP_URL_PREFIX) {
                if suffix.is_empty() {
                    return Err(TransactionError::Configuration(format!(
                        "`{name}` does not name a database group"
                    )));
                }
                suffix.to_lowercase()
            } else {
                continue;
            };

            let url = value.into();
            if url.trim().is_empty() {
                warn!(group = %group, "ignoring database group with an empty url");
                continue;
            }
            match config.groups.entry(group) {
                Entry::Occupied(entry) => {
                    return Err(TransactionError::Configuration(format!(
                        "`{name}` configures database group `{}` more than once",
                        entry.key()
                    )));
                }
                Entry::Vacant(entry) => {
                    entry.insert(url);
                }
            }
        }
        Ok(config)
    }

    /// Add or replace a group.
    pub fn with_group(mut self, group: impl Into<String>, url: impl Into<String>) -> Self {
        self.groups.insert(group.into(), url.into());
        self
    }

    pub fn url(&self, group: &str) -> Option<&str> {
        self.groups.get(group).map(String::as_str)
    }

    /// Configured groups, ordered by name.
    pub fn groups(&self) -> impl Iterator<Item = (&String, &String)> {
        self.groups.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
