//! Session configuration from environment variables.
//!
//! | variable               | default                     |
//! |------------------------|-----------------------------|
//! | `DISPATCH_SEED`        | 0 (or baked in at build)    |
//! | `GRAFT_WEIGHT_MIN`     | 5                           |
//! | `GRAFT_WEIGHT_MAX`     | 25                          |
//! | `ETA_BASE_MINUTES`     | 0                           |
//! | `ETA_MINUTES_PER_UNIT` | 1                           |
//! | `TOPOLOGY_FILE`        | built-in default topology   |
//! | `RESOURCE_POOLS_FILE`  | built-in default pools      |

use crate::{
    datastr::{
        graph::Weight,
        network::{Network, TopologySource},
    },
    dispatch::{pools::PoolsSummary, ResourcePools},
};
use serde::Serialize;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
    #[error("empty graft weight range {min}..={max}")]
    EmptyWeightRange { min: Weight, max: Weight },
    #[error("could not read resource pools from {}: {source}", .path.display())]
    Pools {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Estimated arrival time as a linear function of the routed distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EtaModel {
    pub base_minutes: u32,
    pub minutes_per_unit: u32,
}

impl Default for EtaModel {
    fn default() -> Self {
        EtaModel {
            base_minutes: 0,
            minutes_per_unit: 1,
        }
    }
}

impl EtaModel {
    pub fn eta_minutes(&self, distance: Weight) -> u32 {
        self.base_minutes.saturating_add(distance.saturating_mul(self.minutes_per_unit))
    }
}

fn build_default_seed() -> u64 {
    option_env!("EMERGENCY_NET_DEFAULT_SEED").and_then(|seed| seed.parse().ok()).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    /// root seed of all synthetic randomness
    pub seed: u64,
    pub graft_weight_min: Weight,
    pub graft_weight_max: Weight,
    pub eta: EtaModel,
    pub topology_file: Option<PathBuf>,
    pub resource_pools_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            seed: build_default_seed(),
            graft_weight_min: 5,
            graft_weight_max: 25,
            eta: EtaModel::default(),
            topology_file: None,
            resource_pools_file: None,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from a variable lookup, unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = SessionConfig {
            seed: parse_var(&lookup, "DISPATCH_SEED", defaults.seed)?,
            graft_weight_min: parse_var(&lookup, "GRAFT_WEIGHT_MIN", defaults.graft_weight_min)?,
            graft_weight_max: parse_var(&lookup, "GRAFT_WEIGHT_MAX", defaults.graft_weight_max)?,
            eta: EtaModel {
                base_minutes: parse_var(&lookup, "ETA_BASE_MINUTES", defaults.eta.base_minutes)?,
                minutes_per_unit: parse_var(&lookup, "ETA_MINUTES_PER_UNIT", defaults.eta.minutes_per_unit)?,
            },
            topology_file: lookup("TOPOLOGY_FILE").map(PathBuf::from),
            resource_pools_file: lookup("RESOURCE_POOLS_FILE").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.graft_weight_min > self.graft_weight_max || self.graft_weight_max >= crate::datastr::graph::INFINITY {
            return Err(ConfigError::EmptyWeightRange {
                min: self.graft_weight_min,
                max: self.graft_weight_max,
            });
        }
        Ok(())
    }

    /// Topology from `topology_file`, the default topology if it is unset or unreadable.
    pub fn load_network(&self) -> (Network, TopologySource) {
        match &self.topology_file {
            Some(path) => Network::load_topology_or_default(path),
            None => (Network::default_topology(), TopologySource::Default),
        }
    }

    /// Pools from `resource_pools_file`, the default pools if it is unset.
    /// A configured file that can't be read is an error.
    pub fn load_pools(&self) -> Result<ResourcePools, ConfigError> {
        match &self.resource_pools_file {
            Some(path) => {
                let (pools, summary) = read_pools(path)?;
                report!("resource_pools", { "source": path.display().to_string(), "records": summary.records, "skipped_records": summary.skipped });
                Ok(pools)
            }
            None => Ok(ResourcePools::default_pools()),
        }
    }
}

fn read_pools(path: &Path) -> Result<(ResourcePools, PoolsSummary), ConfigError> {
    let pools_error = |source| ConfigError::Pools {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(pools_error)?;
    ResourcePools::parse(BufReader::new(file)).map_err(pools_error)
}
