//! Release pipeline phases.

use serde::{Deserialize, Serialize};

/// Position of a task in the release pipeline.
///
/// ```text
/// build → promote → push → ship
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingPhase {
    /// On-push builds
    Build,
    /// Candidates, signing, l10n repacks
    Promote,
    /// Push to CDNs
    Push,
    /// Release to users
    Ship,
}

impl ShippingPhase {
    /// Parse the attribute spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "build" => Some(Self::Build),
            "promote" => Some(Self::Promote),
            "push" => Some(Self::Push),
            "ship" => Some(Self::Ship),
            _ => None,
        }
    }

    /// Attribute spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Promote => "promote",
            Self::Push => "push",
            Self::Ship => "ship",
        }
    }

    /// Whether a run for `self` carries tasks of phase `other`.
    pub fn includes(&self, other: ShippingPhase) -> bool {
        other <= *self
    }

    /// The phase preceding this one, if any.
    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::Build => None,
            Self::Promote => Some(Self::Build),
            Self::Push => Some(Self::Promote),
            Self::Ship => Some(Self::Push),
        }
    }
}

impl std::fmt::Display for ShippingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progression() {
        assert!(ShippingPhase::Ship.includes(ShippingPhase::Promote));
        assert!(ShippingPhase::Push.includes(ShippingPhase::Push));
        assert!(!ShippingPhase::Promote.includes(ShippingPhase::Push));
        assert_eq!(ShippingPhase::Ship.previous(), Some(ShippingPhase::Push));
        assert_eq!(ShippingPhase::Build.previous(), None);
    }

    #[test]
    fn test_parse_round_trip() {
        for phase in [ShippingPhase::Build, ShippingPhase::Promote, ShippingPhase::Push, ShippingPhase::Ship] {
            assert_eq!(ShippingPhase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(ShippingPhase::parse("nightly"), None);
    }
}
