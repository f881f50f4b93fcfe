use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three independent evaluation axes
///
/// Declaration order is the tie-break priority used when picking a bottleneck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Retrieval,
    Factuality,
    Reasoning,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Retrieval, Axis::Factuality, Axis::Reasoning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieval => "retrieval",
            Self::Factuality => "factuality",
            Self::Reasoning => "reasoning",
        }
    }

    /// Human label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Retrieval => "Retrieval (recall)",
            Self::Factuality => "Factuality (keywords)",
            Self::Reasoning => "Reasoning (judge)",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
