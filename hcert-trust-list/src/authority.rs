// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// Which upstream trust list a request is for.
///
/// Production and test lists never share cache entries or endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authority {
    Production,
    Test,
}

impl Authority {
    pub const ALL: [Authority; 2] = [Authority::Production, Authority::Test];

    /// Path segment under `/trust-list/`.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Production => "prod",
            Self::Test => "test",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.path_segment() == segment)
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}
