//! Ambient configuration (§10). The tree itself only ever needs a bare
//! `fanout: usize` at construction; this type is scaffolding for embedders
//! who want to load that (and future tunables) from their environment the
//! way the donor storage engine's `figment_config` feature does.

use serde::{Deserialize, Serialize};

/// Tunables for building a [`crate::tree::PopeTree`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The fan-out / leaf cap `L` (§3). Reference deployments use values in
    /// the tens to low hundreds.
    pub fanout: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config { fanout: 64 }
    }
}

#[cfg(feature = "figment_config")]
impl Config {
    /// Loads overrides from `POPE_`-prefixed environment variables (e.g.
    /// `POPE_FANOUT=128`), falling back to [`Config::default`] for anything
    /// unset.
    pub fn from_env() -> Result<Self, figment::Error> {
        use figment::{
            providers::{Env, Serialized},
            Figment,
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("POPE_"))
            .extract()
    }
}
