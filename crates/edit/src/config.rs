// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Edit configuration

use serde::{Deserialize, Serialize};

/// Behaviour switches for command contexts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Undo the in-memory change of a command whose statements failed and
    /// drop it from the pending list. Earlier persisted commands are never
    /// reverted.
    pub revert_on_failure: bool,

    /// Leave comment actions out of previewed scripts
    pub skip_comment_actions: bool,
}

impl EditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: revert the failing command's model change
    pub fn with_revert_on_failure(mut self, revert: bool) -> Self {
        self.revert_on_failure = revert;
        self
    }

    /// Builder method: omit comment actions from previews
    pub fn with_skip_comment_actions(mut self, skip: bool) -> Self {
        self.skip_comment_actions = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: EditConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditConfig::default());
        assert!(!config.revert_on_failure);
    }
}
