//! Network and storage variant selectors
//!
//! Raw selector strings coming from flags, environment or prompts are
//! normalized here into the two enums the rest of the installer works with.

use crate::error::ValidationError;
use std::fmt;
use std::str::FromStr;

/// Target chain environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Uat,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Uat];

    /// Directory namespace used under `data/` and `app/`
    pub fn label(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Uat => "testnet",
        }
    }

    /// Value of the `network_id` line in the node configuration
    pub fn network_id(&self) -> &'static str {
        match self {
            Network::Mainnet => "ae_mainnet",
            Network::Uat => "ae_uat",
        }
    }
}

impl FromStr for Network {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "uat" | "testnet" => Ok(Network::Uat),
            _ => Err(ValidationError::InvalidNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Uat => write!(f, "uat"),
        }
    }
}

/// Storage completeness mode of the node snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Full,
    Light,
}

impl Variant {
    /// Whether the node keeps the indices the indexing service needs
    pub fn indexing_enabled(&self) -> bool {
        matches!(self, Variant::Full)
    }
}

impl FromStr for Variant {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Variant::Full),
            "light" => Ok(Variant::Light),
            _ => Err(ValidationError::InvalidVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Full => write!(f, "full"),
            Variant::Light => write!(f, "light"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_accepts_synonyms_case_insensitively() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("MainNet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("uat".parse::<Network>().unwrap(), Network::Uat);
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Uat);
        assert_eq!(" testnet ".parse::<Network>().unwrap(), Network::Uat);
    }

    #[test]
    fn network_rejects_unknown_values() {
        for raw in ["", "main", "devnet", "mainnet2", "uat-net"] {
            let err = raw.parse::<Network>().unwrap_err();
            assert!(matches!(err, ValidationError::InvalidNetwork(ref v) if v == raw));
        }
    }

    #[test]
    fn variant_accepts_only_full_and_light() {
        assert_eq!("Full".parse::<Variant>().unwrap(), Variant::Full);
        assert_eq!("light".parse::<Variant>().unwrap(), Variant::Light);
        assert!("lite".parse::<Variant>().is_err());
        assert!("".parse::<Variant>().is_err());
    }

    #[test]
    fn labels_and_tokens() {
        assert_eq!(Network::Mainnet.label(), "mainnet");
        assert_eq!(Network::Uat.label(), "testnet");
        assert_eq!(Network::Mainnet.network_id(), "ae_mainnet");
        assert_eq!(Network::Uat.network_id(), "ae_uat");
        assert!(Variant::Full.indexing_enabled());
        assert!(!Variant::Light.indexing_enabled());
    }
}
