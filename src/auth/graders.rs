// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Grader allow-list.

use std::collections::HashSet;

/// Set of hub user names allowed to grade.
///
/// Loaded once from configuration and never mutated afterwards. Membership
/// is exact and case-sensitive, matching how the hub reports user names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraderAllowList {
    graders: HashSet<String>,
}

impl GraderAllowList {
    /// Build an allow-list from any iterator of user names.
    pub fn new<I, S>(graders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            graders: graders.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list, ignoring blanks around and between names.
    pub fn parse(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    /// Check whether `user` is a registered grader.
    pub fn contains(&self, user: &str) -> bool {
        self.graders.contains(user)
    }

    pub fn len(&self) -> usize {
        self.graders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graders.is_empty()
    }

    /// Grader names in sorted order (stable for logs).
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.graders.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Display for GraderAllowList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sorted().join(","))
    }
}
