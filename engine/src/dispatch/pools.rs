//! Which stations keep which resource kinds.
//!
//! Pool files list one kind per line followed by its stations: `<kind> <station> [<station>...]`.
//! Kinds are given by name or code. Lines for the same kind extend its pool.

use super::ResourceKind;
use serde::Serialize;
use std::{collections::BTreeMap, io::BufRead};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolsSummary {
    pub records: usize,
    /// lines with an unknown kind or without stations
    pub skipped: usize,
}

/// Candidate stations per resource kind, in preference order for ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourcePools {
    pools: BTreeMap<ResourceKind, Vec<String>>,
}

impl ResourcePools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_pools() -> Self {
        use ResourceKind::*;
        let mut pools = Self::new();
        pools.extend(FireCrew, ["Station1", "Station3"]);
        pools.extend(Ambulance, ["Station2", "Station5"]);
        pools.extend(Police, ["Station4", "Station6"]);
        pools.extend(Rescue, ["Station1", "Station4"]);
        pools.extend(Health, ["Station5"]);
        pools.extend(Environmental, ["Station3"]);
        pools
    }

    /// Add stations to the pool of `kind`. Stations already in the pool are not added twice.
    pub fn extend<I, S>(&mut self, kind: ResourceKind, stations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pool = self.pools.entry(kind).or_default();
        for station in stations {
            let station = station.into();
            if !pool.contains(&station) {
                pool.push(station);
            }
        }
    }

    pub fn candidates(&self, kind: ResourceKind) -> &[String] {
        self.pools.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parse<R: BufRead>(reader: R) -> std::io::Result<(Self, PoolsSummary)> {
        let mut pools = Self::new();
        let mut summary = PoolsSummary::default();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let kind = fields.next().and_then(ResourceKind::parse);
            let stations: Vec<&str> = fields.collect();
            match kind {
                Some(kind) if !stations.is_empty() => {
                    pools.extend(kind, stations);
                    summary.records += 1;
                }
                _ => summary.skipped += 1,
            }
        }

        Ok((pools, summary))
    }
}
