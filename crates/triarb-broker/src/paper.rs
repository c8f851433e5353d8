//! Paper trader for simulation of the three-leg conversion.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::time::Duration;
use tracing::{info, warn};
use triarb_core::error::TradeError;
use triarb_core::traits::MarketData;
use triarb_core::types::{MarketSnapshot, Pair, Portfolio, Route};
use triarb_core::Shutdown;

/// Simulator configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Quote currency spent in leg 1
    pub notional: Decimal,
    /// Proportional fee applied to the proceeds of every leg
    pub fee_rate: Decimal,
    /// Settlement pause between legs
    pub leg_delay: Duration,
    /// Fetch a fresh price right before each leg instead of trusting the cycle's snapshot
    pub revalidate_prices: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            notional: dec!(100),
            fee_rate: dec!(0.001),
            leg_delay: Duration::from_secs(10),
            revalidate_prices: true,
        }
    }
}

/// Result of one simulated trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOutcome {
    /// Human-readable narrative, one entry per leg plus a closing line
    pub log: Vec<String>,
    /// Number of legs applied to the portfolio
    pub completed_legs: u8,
    /// Ending minus starting quote balance, for completed trades
    pub pnl: Option<Decimal>,
    /// Why the remaining legs were abandoned
    pub error: Option<TradeError>,
}

impl TradeOutcome {
    /// Whether all three legs were applied.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.completed_legs == 3
    }
}

enum Conversion {
    /// Pay quote, receive base: amount / price
    Buy,
    /// Pay base, receive quote: amount * price
    Sell,
}

/// Paper trader for the triangular route.
///
/// Legs run strictly in order against the caller's portfolio. A leg only
/// touches the portfolio once its price is known and its arithmetic has
/// succeeded, so an abort leaves the portfolio as of the last completed leg.
pub struct PaperTrader {
    config: SimulatorConfig,
}

impl PaperTrader {
    /// Create a new paper trader.
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Run Q -> X -> Y -> Q.
    pub async fn execute(
        &self,
        route: &Route,
        portfolio: &mut Portfolio,
        prices: &MarketSnapshot,
        market: &dyn MarketData,
        shutdown: &mut Shutdown,
    ) -> TradeOutcome {
        let quote = route.quote_asset();
        let start_quote = portfolio.balance(quote);
        let mut log = Vec::with_capacity(4);
        let mut completed_legs = 0u8;

        let result = self
            .run_legs(
                route,
                portfolio,
                prices,
                market,
                shutdown,
                &mut log,
                &mut completed_legs,
            )
            .await;

        match result {
            Ok(()) => {
                let pnl = portfolio.balance(quote) - start_quote;
                log.push(format!("Trade cycle complete. P&L: {} {}", fixed(pnl, 4), quote));
                info!(pnl = %fixed(pnl, 4), quote = quote, "simulated trade complete");
                TradeOutcome {
                    log,
                    completed_legs,
                    pnl: Some(pnl),
                    error: None,
                }
            }
            Err(error) => {
                let failed_leg = completed_legs + 1;
                log.push(format!(
                    "Leg {} aborted: {}. Portfolio: {}",
                    failed_leg,
                    error,
                    describe(portfolio, route)
                ));
                warn!(leg = failed_leg, error = %error, "simulated trade aborted");
                TradeOutcome {
                    log,
                    completed_legs,
                    pnl: None,
                    error: Some(error),
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_legs(
        &self,
        route: &Route,
        portfolio: &mut Portfolio,
        prices: &MarketSnapshot,
        market: &dyn MarketData,
        shutdown: &mut Shutdown,
        log: &mut Vec<String>,
        completed_legs: &mut u8,
    ) -> Result<(), TradeError> {
        let quote = route.quote_asset();
        let first = route.first_asset();
        let second = route.second_asset();

        // Leg 1: quote -> X
        let price = self.leg_price(route.cheap(), prices, market).await?;
        let spend = self.config.notional;
        let received = self.convert(spend, price, Conversion::Buy, route.cheap())?;
        portfolio.debit(quote, spend)?;
        portfolio.credit(first, received)?;
        *completed_legs = 1;
        log.push(format!(
            "Leg 1: Bought {} {} with {} {} at {}",
            fixed(received, 6),
            first,
            fixed(spend, 4),
            quote,
            price
        ));
        info!(pair = %route.cheap(), price = %price, received = %received, "leg 1 filled");

        self.pause(shutdown).await?;

        // Leg 2: X -> Y
        let price = self.leg_price(route.cross(), prices, market).await?;
        let spend = portfolio.balance(first);
        let received = self.convert(spend, price, Conversion::Sell, route.cross())?;
        portfolio.take_all(first);
        portfolio.credit(second, received)?;
        *completed_legs = 2;
        log.push(format!(
            "Leg 2: Sold {} {} for {} {} at {}",
            fixed(spend, 6),
            first,
            fixed(received, 8),
            second,
            price
        ));
        info!(pair = %route.cross(), price = %price, received = %received, "leg 2 filled");

        self.pause(shutdown).await?;

        // Leg 3: Y -> quote
        let price = self.leg_price(route.rich(), prices, market).await?;
        let spend = portfolio.balance(second);
        let received = self.convert(spend, price, Conversion::Sell, route.rich())?;
        portfolio.take_all(second);
        portfolio.credit(quote, received)?;
        *completed_legs = 3;
        log.push(format!(
            "Leg 3: Sold {} {} for {} {} at {}",
            fixed(spend, 8),
            second,
            fixed(received, 4),
            quote,
            price
        ));
        info!(pair = %route.rich(), price = %price, received = %received, "leg 3 filled");

        Ok(())
    }

    /// Price for a leg: fresh from the port when revalidating (or when the
    /// snapshot has none), falling back to the cycle's snapshot.
    async fn leg_price(
        &self,
        pair: &Pair,
        prices: &MarketSnapshot,
        market: &dyn MarketData,
    ) -> Result<Decimal, TradeError> {
        let cached = prices.get(pair).filter(|p| is_usable(*p));

        let price = if self.config.revalidate_prices || cached.is_none() {
            match market.last_price(pair).await {
                Ok(p) if is_usable(p) => Some(p),
                Ok(p) => {
                    warn!(pair = %pair, price = p, "refetched price rejected");
                    cached
                }
                Err(e) => {
                    warn!(pair = %pair, error = %e, "price refetch failed");
                    cached
                }
            }
        } else {
            cached
        };

        let price = price.ok_or_else(|| TradeError::PriceUnavailable(pair.to_string()))?;
        match Decimal::try_from(price) {
            Ok(d) if d > Decimal::ZERO => Ok(d),
            _ => Err(TradeError::InvalidPrice {
                pair: pair.to_string(),
                price,
            }),
        }
    }

    fn convert(
        &self,
        amount: Decimal,
        price: Decimal,
        conversion: Conversion,
        pair: &Pair,
    ) -> Result<Decimal, TradeError> {
        let gross = match conversion {
            Conversion::Buy => amount.checked_div(price),
            Conversion::Sell => amount.checked_mul(price),
        };
        gross
            .and_then(|g| g.checked_mul(Decimal::ONE - self.config.fee_rate))
            .ok_or_else(|| TradeError::Overflow(pair.to_string()))
    }

    async fn pause(&self, shutdown: &mut Shutdown) -> Result<(), TradeError> {
        if shutdown.is_triggered() {
            return Err(TradeError::Interrupted);
        }
        if self.config.leg_delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(self.config.leg_delay) => Ok(()),
            _ = shutdown.wait() => Err(TradeError::Interrupted),
        }
    }
}

fn is_usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Round half away from zero, then pad to exactly `dp` places.
fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

fn describe(portfolio: &Portfolio, route: &Route) -> String {
    format!(
        "{}={}, {}={}, {}={}",
        route.quote_asset(),
        fixed(portfolio.balance(route.quote_asset()), 4),
        route.first_asset(),
        fixed(portfolio.balance(route.first_asset()), 6),
        route.second_asset(),
        fixed(portfolio.balance(route.second_asset()), 8),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use triarb_core::error::DataError;
    use triarb_core::types::{Bar, Timeframe};

    /// Serves fixed prices; pairs without a price fail.
    struct ScriptedMarket {
        prices: HashMap<String, f64>,
        calls: AtomicUsize,
    }

    impl ScriptedMarket {
        fn new(prices: &[(&str, f64)]) -> Self {
            Self {
                prices: prices.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketData for ScriptedMarket {
        async fn last_price(&self, pair: &Pair) -> Result<f64, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prices
                .get(&pair.to_string())
                .copied()
                .ok_or_else(|| DataError::Connection("unreachable".into()))
        }

        async fn recent_candles(
            &self,
            pair: &Pair,
            _timeframe: Timeframe,
            _count: usize,
        ) -> Result<Vec<Bar>, DataError> {
            Err(DataError::NoDataAvailable(pair.to_string()))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn instant_config() -> SimulatorConfig {
        SimulatorConfig {
            leg_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn seeded() -> Portfolio {
        Portfolio::new([("USDT", dec!(1000)), ("XRP", dec!(0)), ("BTC", dec!(0))])
    }

    const FULL: [(&str, f64); 3] = [
        ("XRP/USDT", 0.5),
        ("XRP/BTC", 0.00002),
        ("BTC/USDT", 60000.0),
    ];

    #[tokio::test]
    async fn test_three_legs_pnl_matches_hand_computation() {
        let route = Route::default();
        let market = ScriptedMarket::new(&FULL);
        let snapshot = MarketSnapshot::tracking(route.pairs());
        let mut portfolio = seeded();

        let trader = PaperTrader::new(instant_config());
        let outcome = trader
            .execute(&route, &mut portfolio, &snapshot, &market, &mut Shutdown::never())
            .await;

        // 100 / 0.5 * 0.999 = 199.8 XRP
        // 199.8 * 0.00002 * 0.999 = 0.003992004 BTC
        // 0.003992004 * 60000 * 0.999 = 239.28071976 USDT
        assert!(outcome.is_complete());
        assert_eq!(outcome.log.len(), 4);
        assert_eq!(outcome.log[0], "Leg 1: Bought 199.800000 XRP with 100.0000 USDT at 0.5");
        assert_eq!(
            outcome.log[1],
            "Leg 2: Sold 199.800000 XRP for 0.00399200 BTC at 0.00002"
        );
        assert_eq!(
            outcome.log[2],
            "Leg 3: Sold 0.00399200 BTC for 239.2807 USDT at 60000"
        );
        assert_eq!(outcome.log[3], "Trade cycle complete. P&L: 139.2807 USDT");

        let pnl = outcome.pnl.unwrap();
        assert!((pnl - dec!(139.28071976)).abs() < dec!(0.00000001));
        assert!((portfolio.balance("USDT") - dec!(1139.28071976)).abs() < dec!(0.00000001));
        assert_eq!(portfolio.balance("XRP"), Decimal::ZERO);
        assert_eq!(portfolio.balance("BTC"), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_logged_amounts_are_rounded_not_truncated() {
        let route = Route::default();
        let market = ScriptedMarket::new(&[
            ("XRP/USDT", 0.5),
            ("XRP/BTC", 0.00002),
            ("BTC/USDT", 60000.02),
        ]);
        let snapshot = MarketSnapshot::tracking(route.pairs());
        let mut portfolio = seeded();

        let trader = PaperTrader::new(instant_config());
        let outcome = trader
            .execute(&route, &mut portfolio, &snapshot, &market, &mut Shutdown::never())
            .await;

        // 0.003992004 * 60000.02 * 0.999 = 239.28079952... USDT
        assert!(outcome.is_complete());
        assert!(outcome.log[2].contains("for 239.2808 USDT"), "{}", outcome.log[2]);
        assert_eq!(outcome.log[3], "Trade cycle complete. P&L: 139.2808 USDT");
    }

    #[test]
    fn test_fixed_rounds_half_away_from_zero() {
        assert_eq!(fixed(dec!(1.23456), 4), "1.2346");
        assert_eq!(fixed(dec!(1.23455), 4), "1.2346");
        assert_eq!(fixed(dec!(-1.23455), 4), "-1.2346");
        assert_eq!(fixed(dec!(199.8), 6), "199.800000");
        assert_eq!(fixed(dec!(0.003992004), 8), "0.00399200");
    }

    #[tokio::test]
    async fn test_missing_cross_price_aborts_after_leg_one() {
        let route = Route::default();
        let market = ScriptedMarket::new(&[("XRP/USDT", 0.5), ("BTC/USDT", 60000.0)]);
        let snapshot = MarketSnapshot::tracking(route.pairs());
        let mut portfolio = seeded();

        let trader = PaperTrader::new(instant_config());
        let outcome = trader
            .execute(&route, &mut portfolio, &snapshot, &market, &mut Shutdown::never())
            .await;

        assert!(!outcome.is_complete());
        assert_eq!(outcome.completed_legs, 1);
        assert_eq!(outcome.pnl, None);
        assert_eq!(
            outcome.error,
            Some(TradeError::PriceUnavailable("XRP/BTC".into()))
        );
        assert_eq!(outcome.log.len(), 2);
        assert!(outcome.log[1].starts_with("Leg 2 aborted"));

        // Portfolio stays at the leg-1 state
        assert_eq!(portfolio.balance("USDT"), dec!(900));
        assert_eq!(portfolio.balance("XRP"), dec!(199.8));
        assert_eq!(portfolio.balance("BTC"), Decimal::ZERO);

        // Implied quote value only lost the leg-1 fee
        let implied = portfolio.balance("USDT") + portfolio.balance("XRP") * dec!(0.5);
        assert!(implied >= dec!(1000) - dec!(0.1));
    }

    #[tokio::test]
    async fn test_missing_first_price_leaves_portfolio_untouched() {
        let route = Route::default();
        let market = ScriptedMarket::new(&[]);
        let snapshot = MarketSnapshot::tracking(route.pairs());
        let mut portfolio = seeded();
        let before = portfolio.clone();

        let trader = PaperTrader::new(instant_config());
        let outcome = trader
            .execute(&route, &mut portfolio, &snapshot, &market, &mut Shutdown::never())
            .await;

        assert_eq!(outcome.completed_legs, 0);
        assert_eq!(outcome.log.len(), 1);
        assert_eq!(portfolio, before);
    }

    #[tokio::test]
    async fn test_snapshot_price_used_when_refetch_fails() {
        let route = Route::default();
        let market = ScriptedMarket::new(&[("XRP/USDT", 0.5), ("BTC/USDT", 60000.0)]);
        let mut snapshot = MarketSnapshot::tracking(route.pairs());
        snapshot.set(route.cross(), 0.00002);
        let mut portfolio = seeded();

        let trader = PaperTrader::new(instant_config());
        let outcome = trader
            .execute(&route, &mut portfolio, &snapshot, &market, &mut Shutdown::never())
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.log[3], "Trade cycle complete. P&L: 139.2807 USDT");
    }

    #[tokio::test]
    async fn test_revalidation_prefers_fresh_price() {
        let route = Route::default();
        let market = ScriptedMarket::new(&FULL);
        let mut snapshot = MarketSnapshot::tracking(route.pairs());
        snapshot.set(route.cheap(), 0.4);
        let mut portfolio = seeded();

        let trader = PaperTrader::new(instant_config());
        let outcome = trader
            .execute(&route, &mut portfolio, &snapshot, &market, &mut Shutdown::never())
            .await;

        assert!(outcome.log[0].starts_with("Leg 1: Bought 199.800000 XRP"));
        assert_eq!(market.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_snapshot_prices_without_revalidation() {
        let route = Route::default();
        let market = ScriptedMarket::new(&[]);
        let mut snapshot = MarketSnapshot::tracking(route.pairs());
        for (pair, price) in FULL {
            snapshot.set(&pair.parse::<Pair>().unwrap(), price);
        }
        let mut portfolio = seeded();

        let trader = PaperTrader::new(SimulatorConfig {
            revalidate_prices: false,
            ..instant_config()
        });
        let outcome = trader
            .execute(&route, &mut portfolio, &snapshot, &market, &mut Shutdown::never())
            .await;

        assert!(outcome.is_complete());
        assert_eq!(market.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_insufficient_quote_balance() {
        let route = Route::default();
        let market = ScriptedMarket::new(&FULL);
        let snapshot = MarketSnapshot::tracking(route.pairs());
        let mut portfolio = Portfolio::new([("USDT", dec!(50))]);

        let trader = PaperTrader::new(instant_config());
        let outcome = trader
            .execute(&route, &mut portfolio, &snapshot, &market, &mut Shutdown::never())
            .await;

        assert!(matches!(
            outcome.error,
            Some(TradeError::InsufficientBalance { .. })
        ));
        assert_eq!(outcome.completed_legs, 0);
        assert_eq!(portfolio.balance("USDT"), dec!(50));
        assert_eq!(portfolio.balance("XRP"), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_pacing_delay() {
        let route = Route::default();
        let market = ScriptedMarket::new(&FULL);
        let snapshot = MarketSnapshot::tracking(route.pairs());
        let mut portfolio = seeded();
        let (trigger, mut shutdown) = Shutdown::channel();

        let trader = PaperTrader::new(SimulatorConfig {
            leg_delay: Duration::from_secs(60),
            ..Default::default()
        });

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            trader.execute(&route, &mut portfolio, &snapshot, &market, &mut shutdown),
        )
        .await
        .unwrap();

        assert_eq!(outcome.error, Some(TradeError::Interrupted));
        assert_eq!(outcome.completed_legs, 1);
        assert_eq!(portfolio.balance("XRP"), dec!(199.8));
    }
}
