//! Asset registry: maps user-typed aliases to canonical CoinGecko ids.

use serde::Serialize;
use std::collections::HashMap;

use crate::types::{AssetId, BotError, Result};

/// Builtin alias table (alias -> CoinGecko id)
pub static BUILTIN_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "btc" => "bitcoin",
    "bitcoin" => "bitcoin",
    "eth" => "ethereum",
    "ethereum" => "ethereum",
    "sol" => "solana",
    "solana" => "solana",
    "ada" => "cardano",
    "cardano" => "cardano",
    "xrp" => "xrp",
    "doge" => "dogecoin",
    "dogecoin" => "dogecoin",
    "dot" => "polkadot",
    "polkadot" => "polkadot",
    "bnb" => "binancecoin",
    "binancecoin" => "binancecoin",
    "manta" => "manta-network",
    "manta-network" => "manta-network",
};

/// Builtin assets in display order: (id, display name, short alias)
const BUILTIN_ASSETS: &[(&str, &str, &str)] = &[
    ("bitcoin", "Bitcoin (BTC)", "btc"),
    ("ethereum", "Ethereum (ETH)", "eth"),
    ("solana", "Solana (SOL)", "sol"),
    ("cardano", "Cardano (ADA)", "ada"),
    ("xrp", "Ripple (XRP)", "xrp"),
    ("dogecoin", "Dogecoin (DOGE)", "doge"),
    ("polkadot", "Polkadot (DOT)", "dot"),
    ("binancecoin", "Binance Coin (BNB)", "bnb"),
    ("manta-network", "Manta Network (MANTA)", "manta"),
];

/// A supported asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Short alias, shown in help and error listings
    pub symbol: String,
    /// Every alias that resolves to this asset, `symbol` first
    pub aliases: Vec<String>,
}

impl Asset {
    pub fn new(id: &str, name: &str, symbol: &str, aliases: &[&str]) -> Self {
        let symbol = symbol.to_lowercase();
        let mut all = vec![symbol.clone()];
        for alias in aliases {
            let alias = alias.to_lowercase();
            if !all.contains(&alias) {
                all.push(alias);
            }
        }

        Self {
            id: id.to_string(),
            name: name.to_string(),
            symbol,
            aliases: all,
        }
    }
}

/// Immutable alias -> asset lookup table
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
    by_alias: HashMap<String, usize>,
    by_id: HashMap<AssetId, usize>,
}

impl AssetRegistry {
    /// Build a registry; an alias claimed by two different assets is rejected
    pub fn new(assets: Vec<Asset>) -> Result<Self> {
        let mut by_alias = HashMap::new();
        let mut by_id = HashMap::new();

        for (idx, asset) in assets.iter().enumerate() {
            if by_id.insert(asset.id.clone(), idx).is_some() {
                return Err(BotError::Config(format!("duplicate asset id: {}", asset.id)));
            }
            for alias in &asset.aliases {
                if let Some(prev) = by_alias.insert(alias.to_lowercase(), idx) {
                    if prev != idx {
                        return Err(BotError::Config(format!(
                            "alias '{}' maps to both {} and {}",
                            alias, assets[prev].id, asset.id
                        )));
                    }
                }
            }
        }

        Ok(Self { assets, by_alias, by_id })
    }

    /// The nine default assets, checked like any other asset list
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_assets())
    }

    /// Case-insensitive exact-match lookup
    pub fn resolve(&self, token: &str) -> Option<&Asset> {
        let key = token.to_lowercase();
        self.by_alias.get(&key).map(|&idx| &self.assets[idx])
    }

    /// Like [`resolve`](Self::resolve) but yields the canonical id or `AssetNotFound`
    pub fn resolve_id(&self, token: &str) -> Result<AssetId> {
        self.resolve(token)
            .map(|a| a.id.clone())
            .ok_or_else(|| BotError::AssetNotFound(token.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.by_id.get(id).map(|&idx| &self.assets[idx])
    }

    /// Display name for an id, falling back to the id itself
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|a| a.name.as_str()).unwrap_or(id)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn ids(&self) -> Vec<AssetId> {
        self.assets.iter().map(|a| a.id.clone()).collect()
    }

    pub fn short_aliases(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.symbol.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn builtin_assets() -> Vec<Asset> {
    BUILTIN_ASSETS
        .iter()
        .map(|(id, name, symbol)| {
            let mut aliases: Vec<&str> = BUILTIN_ALIASES
                .entries()
                .filter(|(_, target)| *target == id)
                .map(|(alias, _)| *alias)
                .collect();
            aliases.sort_unstable();
            Asset::new(id, name, symbol, &aliases)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_alias_resolves() {
        let registry = AssetRegistry::builtin().unwrap();
        for (alias, id) in BUILTIN_ALIASES.entries() {
            assert_eq!(registry.resolve_id(alias).unwrap(), *id, "alias {}", alias);
        }
        assert_eq!(registry.len(), 9);
        assert_eq!(BUILTIN_ALIASES.len(), 17);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = AssetRegistry::builtin().unwrap();
        assert_eq!(registry.resolve("BTC"), registry.resolve("btc"));
        assert_eq!(registry.resolve_id("Ethereum").unwrap(), "ethereum");
    }

    #[test]
    fn test_many_aliases_one_asset() {
        let registry = AssetRegistry::builtin().unwrap();
        assert_eq!(
            registry.resolve_id("manta-network").unwrap(),
            registry.resolve_id("manta").unwrap()
        );
        assert_eq!(registry.resolve_id("manta").unwrap(), "manta-network");
        assert_eq!(registry.resolve_id("xrp").unwrap(), "xrp");
    }

    #[test]
    fn test_unknown_alias_is_not_found() {
        let registry = AssetRegistry::builtin().unwrap();
        assert!(registry.resolve("bit").is_none());
        assert!(registry.resolve("bitcoins").is_none());
        assert!(registry.resolve("").is_none());
        match registry.resolve_id("shib") {
            Err(BotError::AssetNotFound(t)) => assert_eq!(t, "shib"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_short_aliases_in_display_order() {
        let registry = AssetRegistry::builtin().unwrap();
        assert_eq!(
            registry.short_aliases(),
            vec!["btc", "eth", "sol", "ada", "xrp", "doge", "dot", "bnb", "manta"]
        );
        assert_eq!(registry.get("bitcoin").unwrap().aliases, vec!["btc", "bitcoin"]);
        assert_eq!(registry.display_name("polkadot"), "Polkadot (DOT)");
        assert_eq!(registry.display_name("unknown-coin"), "unknown-coin");
    }

    #[test]
    fn test_custom_registry_and_conflicts() {
        let registry = AssetRegistry::new(vec![
            Asset::new("litecoin", "Litecoin (LTC)", "ltc", &["litecoin", "LITE"]),
            Asset::new("tron", "TRON (TRX)", "trx", &["tron"]),
        ])
        .unwrap();
        assert_eq!(registry.resolve_id("lite").unwrap(), "litecoin");
        assert!(registry.resolve("btc").is_none());

        let conflict = AssetRegistry::new(vec![
            Asset::new("a", "A", "x", &[]),
            Asset::new("b", "B", "y", &["x"]),
        ]);
        assert!(matches!(conflict, Err(BotError::Config(_))));
    }

    #[test]
    fn test_builtin_table_goes_through_conflict_check() {
        assert!(AssetRegistry::builtin().is_ok());

        // A builtin alias claimed by another asset is rejected like any other clash
        let mut assets = builtin_assets();
        assets.push(Asset::new("bitcoin-cash", "Bitcoin Cash (BCH)", "bch", &["btc"]));
        match AssetRegistry::new(assets) {
            Err(BotError::Config(msg)) => assert!(msg.contains("btc"), "{}", msg),
            other => panic!("unexpected: {:?}", other.map(|r| r.len())),
        }

        let mut assets = builtin_assets();
        assets.push(Asset::new("bitcoin", "Bitcoin again", "xbt", &[]));
        assert!(matches!(AssetRegistry::new(assets), Err(BotError::Config(_))));
    }

    #[test]
    fn test_resolve_does_not_trim() {
        let registry = AssetRegistry::builtin().unwrap();
        assert!(registry.resolve(" btc ").is_none());
        assert!(registry.resolve("btc\n").is_none());
        assert!(registry.resolve_id(" eth").is_err());
        assert_eq!(registry.resolve_id("ETH").unwrap(), "ethereum");
    }
}
