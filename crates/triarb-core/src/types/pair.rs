//! Trading pairs and the triangular route.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TriarbError;

/// A tradable instrument expressed as base/quote, e.g. `XRP/USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    base: String,
    quote: String,
}

impl Pair {
    /// Create a pair from its two assets. Asset codes are upper-cased.
    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> Self {
        Self {
            base: base.as_ref().trim().to_uppercase(),
            quote: quote.as_ref().trim().to_uppercase(),
        }
    }

    /// The asset being priced.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The asset the price is expressed in.
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Concatenated symbol used by the exchange REST API (`XRPUSDT`).
    pub fn exchange_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = TriarbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((base, quote)) if !base.trim().is_empty() && !quote.trim().is_empty() => {
                Ok(Pair::new(base, quote))
            }
            _ => Err(TriarbError::Validation(format!(
                "Invalid pair '{}': expected BASE/QUOTE",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Pair {
    type Error = TriarbError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.to_string()
    }
}

/// The three pairs of a triangular conversion Q -> X -> Y -> Q.
///
/// `cheap` is X/Q (the leg expected to trade below its average), `rich` is
/// Y/Q (expected above its average) and `cross` is X/Y.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RouteSpec")]
pub struct Route {
    cheap: Pair,
    rich: Pair,
    cross: Pair,
}

#[derive(Deserialize)]
struct RouteSpec {
    cheap: Pair,
    rich: Pair,
    cross: Pair,
}

impl TryFrom<RouteSpec> for Route {
    type Error = TriarbError;

    fn try_from(spec: RouteSpec) -> Result<Self, Self::Error> {
        Route::new(spec.cheap, spec.rich, spec.cross)
    }
}

impl Route {
    /// Build a route, checking that the pairs close the triangle.
    pub fn new(cheap: Pair, rich: Pair, cross: Pair) -> Result<Self, TriarbError> {
        if cheap.quote() != rich.quote() {
            return Err(TriarbError::Validation(format!(
                "{} and {} must share a quote asset",
                cheap, rich
            )));
        }
        if cheap.base() == rich.base() || cheap.base() == cheap.quote() {
            return Err(TriarbError::Validation(format!(
                "{} and {} must price distinct assets",
                cheap, rich
            )));
        }
        if cross.base() != cheap.base() || cross.quote() != rich.base() {
            return Err(TriarbError::Validation(format!(
                "Cross pair must be {}/{}, got {}",
                cheap.base(),
                rich.base(),
                cross
            )));
        }
        Ok(Self { cheap, rich, cross })
    }

    /// X/Q, bought in the first leg.
    pub fn cheap(&self) -> &Pair {
        &self.cheap
    }

    /// Y/Q, sold in the last leg.
    pub fn rich(&self) -> &Pair {
        &self.rich
    }

    /// X/Y, the intermediate conversion.
    pub fn cross(&self) -> &Pair {
        &self.cross
    }

    /// Quote currency Q.
    pub fn quote_asset(&self) -> &str {
        self.cheap.quote()
    }

    /// Asset X, acquired in leg 1.
    pub fn first_asset(&self) -> &str {
        self.cheap.base()
    }

    /// Asset Y, acquired in leg 2.
    pub fn second_asset(&self) -> &str {
        self.rich.base()
    }

    /// All pairs in leg order.
    pub fn pairs(&self) -> [&Pair; 3] {
        [&self.cheap, &self.cross, &self.rich]
    }

    /// The pairs whose moving averages drive detection.
    pub fn baseline_pairs(&self) -> [&Pair; 2] {
        [&self.cheap, &self.rich]
    }
}

impl Default for Route {
    fn default() -> Self {
        Self {
            cheap: Pair::new("XRP", "USDT"),
            rich: Pair::new("BTC", "USDT"),
            cross: Pair::new("XRP", "BTC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_parse_and_display() {
        let pair: Pair = "xrp/usdt".parse().unwrap();
        assert_eq!(pair.base(), "XRP");
        assert_eq!(pair.quote(), "USDT");
        assert_eq!(pair.to_string(), "XRP/USDT");
        assert_eq!(pair.exchange_symbol(), "XRPUSDT");

        assert!("XRPUSDT".parse::<Pair>().is_err());
        assert!("/USDT".parse::<Pair>().is_err());
    }

    #[test]
    fn test_pair_serde_as_string() {
        let pair = Pair::new("BTC", "USDT");
        assert_eq!(serde_json::to_string(&pair).unwrap(), "\"BTC/USDT\"");
        let back: Pair = serde_json::from_str("\"BTC/USDT\"").unwrap();
        assert_eq!(back, pair);
    }

    #[test]
    fn test_route_assets() {
        let route = Route::default();
        assert_eq!(route.quote_asset(), "USDT");
        assert_eq!(route.first_asset(), "XRP");
        assert_eq!(route.second_asset(), "BTC");
        assert_eq!(route.pairs()[1], &Pair::new("XRP", "BTC"));
    }

    #[test]
    fn test_route_rejects_open_triangle() {
        let err = Route::new(
            Pair::new("XRP", "USDT"),
            Pair::new("BTC", "USDT"),
            Pair::new("ETH", "BTC"),
        );
        assert!(err.is_err());

        let err = Route::new(
            Pair::new("XRP", "USDT"),
            Pair::new("BTC", "EUR"),
            Pair::new("XRP", "BTC"),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_route_deserialize_validates() {
        let ok: Result<Route, _> = serde_json::from_str(
            r#"{"cheap":"ADA/USDT","rich":"ETH/USDT","cross":"ADA/ETH"}"#,
        );
        assert!(ok.is_ok());

        let bad: Result<Route, _> = serde_json::from_str(
            r#"{"cheap":"ADA/USDT","rich":"ETH/USDT","cross":"ETH/ADA"}"#,
        );
        assert!(bad.is_err());
    }
}
