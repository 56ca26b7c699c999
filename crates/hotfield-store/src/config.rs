//! Layered configuration loading for hotfield, using `figment`.
//!
//! Sources (in priority order, matching the teacher's `zen-config`
//! layering):
//! 1. Environment variables (`HOTFIELD_*`, double-underscore nested)
//! 2. `./hotfield.toml` (project-level)
//! 3. Built-in defaults (§5 resource bounds)

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

const fn default_slot_pool_size() -> usize {
    20
}

const fn default_promotion_threshold() -> u64 {
    100
}

const fn default_backfill_page_size() -> i64 {
    1000
}

fn default_db_path() -> String {
    "hotfield.db".to_string()
}

/// Process-wide configuration for a `DocumentStore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotfieldConfig {
    /// Path to the libSQL database file, or `:memory:` for an ephemeral
    /// store.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Size of the per-collection indexed slot pool (§3, §5). Canonical
    /// default is 20.
    #[serde(default = "default_slot_pool_size")]
    pub slot_pool_size: usize,

    /// Query count at which a field becomes eligible for promotion
    /// (§4.E).
    #[serde(default = "default_promotion_threshold")]
    pub promotion_threshold: u64,

    /// Rows per backfill page during promotion (§4.F, §5).
    #[serde(default = "default_backfill_page_size")]
    pub backfill_page_size: i64,
}

impl Default for HotfieldConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            slot_pool_size: default_slot_pool_size(),
            promotion_threshold: default_promotion_threshold(),
            backfill_page_size: default_backfill_page_size(),
        }
    }
}

impl HotfieldConfig {
    /// Load configuration from `./hotfield.toml` (if present) layered
    /// under environment variables prefixed `HOTFIELD_`.
    ///
    /// # Errors
    ///
    /// Returns a `figment::Error` if the TOML file is malformed or a
    /// typed field fails to extract.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("hotfield.toml"))
            .merge(Env::prefixed("HOTFIELD_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_resource_bounds() {
        let config = HotfieldConfig::default();
        assert_eq!(config.slot_pool_size, 20);
        assert_eq!(config.promotion_threshold, 100);
        assert_eq!(config.backfill_page_size, 1000);
    }

    #[test]
    fn env_var_overrides_default() {
        Jail::expect_with(|jail| {
            jail.set_env("HOTFIELD_SLOT_POOL_SIZE", "40");
            let config: HotfieldConfig = Figment::from(Serialized::defaults(HotfieldConfig::default()))
                .merge(Env::prefixed("HOTFIELD_").split("__"))
                .extract()?;
            assert_eq!(config.slot_pool_size, 40);
            Ok(())
        });
    }

    #[test]
    fn toml_overrides_default() {
        Jail::expect_with(|jail| {
            jail.create_file("hotfield.toml", "db_path = \"custom.db\"\npromotion_threshold = 250\n")?;
            let config: HotfieldConfig = Figment::from(Serialized::defaults(HotfieldConfig::default()))
                .merge(Toml::file("hotfield.toml"))
                .extract()?;
            assert_eq!(config.db_path, "custom.db");
            assert_eq!(config.promotion_threshold, 250);
            Ok(())
        });
    }

    #[test]
    fn env_beats_toml() {
        Jail::expect_with(|jail| {
            jail.create_file("hotfield.toml", "promotion_threshold = 250\n")?;
            jail.set_env("HOTFIELD_PROMOTION_THRESHOLD", "10");
            let config: HotfieldConfig = Figment::from(Serialized::defaults(HotfieldConfig::default()))
                .merge(Toml::file("hotfield.toml"))
                .merge(Env::prefixed("HOTFIELD_").split("__"))
                .extract()?;
            assert_eq!(config.promotion_threshold, 10);
            Ok(())
        });
    }
}
