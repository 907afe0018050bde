//! World whitelist/blacklist filter, shared by the global gate and by
//! per-quest restrictions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorldFilter {
    /// Worlds allowed; empty means every world is allowed.
    #[serde(default)]
    pub whitelist: HashSet<String>,
    /// Worlds always refused, even if whitelisted.
    #[serde(default)]
    pub blacklist: HashSet<String>,
}

impl WorldFilter {
    pub fn new<W, B>(whitelist: W, blacklist: B) -> Self
    where
        W: IntoIterator,
        W::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            whitelist: whitelist.into_iter().map(Into::into).collect(),
            blacklist: blacklist.into_iter().map(Into::into).collect(),
        }
    }

    /// A filter that admits every world.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn allows(&self, world: &str) -> bool {
        if !self.whitelist.is_empty() && !self.whitelist.contains(world) {
            return false;
        }
        !self.blacklist.contains(world)
    }

    pub fn is_open(&self) -> bool {
        self.whitelist.is_empty() && self.blacklist.is_empty()
    }
}
