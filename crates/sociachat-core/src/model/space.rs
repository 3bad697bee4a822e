use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The distance function a collection is searched with.
///
/// Lower distances always mean more similar, whichever space is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSpace {
    /// Squared Euclidean distance.
    #[default]
    L2,
    /// One minus cosine similarity.
    Cosine,
    /// One minus the inner product.
    Ip,
}

impl DistanceSpace {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::Cosine => "cosine",
            Self::Ip => "ip",
        }
    }
}

impl fmt::Display for DistanceSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceSpace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l2" => Ok(Self::L2),
            "cosine" => Ok(Self::Cosine),
            "ip" => Ok(Self::Ip),
            other => Err(Error::InvalidData(format!("unknown distance space: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_l2() {
        assert_eq!(DistanceSpace::default(), DistanceSpace::L2);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("Cosine".parse::<DistanceSpace>().unwrap(), DistanceSpace::Cosine);
        assert_eq!("IP".parse::<DistanceSpace>().unwrap(), DistanceSpace::Ip);
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "manhattan".parse::<DistanceSpace>().unwrap_err();
        assert!(err.to_string().contains("manhattan"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&DistanceSpace::Cosine).unwrap();
        assert_eq!(json, "\"cosine\"");
    }
}
