// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Cache configuration

use serde::{Deserialize, Serialize};

/// Behaviour switches for an object cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Compare names case-sensitively. Should be fixed before the first
    /// load; changing it later re-keys the cached objects.
    pub case_sensitive: bool,

    /// Order loaded objects by name instead of server order
    pub sort_by_name: bool,

    /// Let `get_object` on an unloaded cache run a single-object lookup
    /// query instead of loading the whole container
    pub lookup_single_objects: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            sort_by_name: false,
            lookup_single_objects: false,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set case sensitivity
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Builder method: sort by name
    pub fn with_sort_by_name(mut self, sort: bool) -> Self {
        self.sort_by_name = sort;
        self
    }

    /// Builder method: enable single-object lookups
    pub fn with_lookup(mut self, lookup: bool) -> Self {
        self.lookup_single_objects = lookup;
        self
    }
}
