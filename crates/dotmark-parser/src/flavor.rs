use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The syntax a document is written in. The base flavor is plain markdown; the extended flavor
/// adds function calls, math, page breaks, decorative headings and element metadata.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    Base,
    #[default]
    Extended,
}

impl Flavor {
    pub fn has_function_calls(&self) -> bool {
        *self == Flavor::Extended
    }
}

impl Display for Flavor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Flavor::Base => write!(f, "base"),
            Flavor::Extended => write!(f, "extended"),
        }
    }
}
