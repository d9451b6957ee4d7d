// ============================================================================
// Structure : StockSnapshot
// ============================================================================
// Instantané d'un ticker : prix courant, variation et série de chandelles
//
// INVARIANTS :
// - bars n'est jamais vide et est trié du plus récent au plus ancien
// - price == bars[0].close
// - change == bars[0].close - bars[0].open
// - previous_close == bars[1].close, ou bars[0].open s'il n'y a qu'une chandelle
// ============================================================================

use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::models::{QuoteBar, TimeRange};

/// Instantané d'un ticker
#[derive(Debug, Clone, PartialEq)]
pub struct StockSnapshot {
    /// Symbole du ticker (ex: "AAPL")
    pub symbol: String,

    /// Prix actuel (close de la chandelle la plus récente)
    pub price: f64,

    /// Variation absolue de la dernière chandelle
    pub change: f64,

    /// Variation en pourcentage de la dernière chandelle
    pub change_percent: f64,

    pub high: f64,
    pub low: f64,
    pub open: f64,

    /// Clôture précédente
    pub previous_close: f64,

    /// Pas de source pour le volume dans l'endpoint intraday : toujours 0
    pub volume: u64,

    /// Chandelles, la plus récente en premier
    pub bars: Vec<QuoteBar>,
}

impl StockSnapshot {
    /// Construit un instantané à partir des chandelles
    ///
    /// Les chandelles sont triées (la plus récente en premier) avant de dériver
    /// les champs. Retourne None si la liste est vide.
    pub fn from_bars(symbol: impl Into<String>, mut bars: Vec<QuoteBar>) -> Option<Self> {
        // CONCEPT RUST : sort_by avec comparaison inversée
        // - b.cmp(a) au lieu de a.cmp(b) : ordre décroissant
        bars.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let latest = bars.first()?;
        let previous_close = bars.get(1).map(|b| b.close).unwrap_or(latest.open);

        Some(Self {
            symbol: symbol.into(),
            price: latest.close,
            change: latest.change(),
            change_percent: latest.change_percent(),
            high: latest.high,
            low: latest.low,
            open: latest.open,
            previous_close,
            volume: 0,
            bars,
        })
    }

    /// Retourne les chandelles visibles pour une fenêtre donnée
    pub fn bars_in(&self, range: TimeRange, now: DateTime<Utc>) -> Cow<'_, [QuoteBar]> {
        range.filter(&self.bars, now)
    }

    /// Retourne true si le ticker est en hausse
    pub fn is_positive(&self) -> bool {
        self.change >= 0.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 16, 0, 0).unwrap()
    }

    #[test]
    fn test_single_bar_previous_close_is_open() {
        let bar = QuoteBar::new(t0(), 100.0, 110.0, 95.0, 105.0);
        let snapshot = StockSnapshot::from_bars("AAPL", vec![bar]).unwrap();

        assert_eq!(snapshot.price, 105.0);
        assert_eq!(snapshot.change, 5.0);
        assert_eq!(snapshot.change_percent, 5.0);
        assert_eq!(snapshot.previous_close, 100.0);
        assert_eq!(snapshot.volume, 0);
    }

    #[test]
    fn test_two_bars_previous_close() {
        let older = QuoteBar::new(t0() - Duration::minutes(5), 98.0, 101.0, 97.0, 99.5);
        let newer = QuoteBar::new(t0(), 100.0, 102.0, 99.0, 101.0);

        // Ordre croissant en entrée : normalisé en latest-first
        let snapshot = StockSnapshot::from_bars("MSFT", vec![older.clone(), newer.clone()]).unwrap();

        assert_eq!(snapshot.bars, vec![newer, older]);
        assert_eq!(snapshot.price, 101.0);
        assert_eq!(snapshot.previous_close, 99.5);
        assert_eq!(snapshot.high, 102.0);
        assert_eq!(snapshot.low, 99.0);
        assert_eq!(snapshot.open, 100.0);
        assert!(snapshot.is_positive());
    }

    #[test]
    fn test_empty_bars() {
        assert!(StockSnapshot::from_bars("IBM", Vec::new()).is_none());
    }

    #[test]
    fn test_negative_change() {
        let bar = QuoteBar::new(t0(), 200.0, 201.0, 180.0, 190.0);
        let snapshot = StockSnapshot::from_bars("TSLA", vec![bar]).unwrap();

        assert_eq!(snapshot.change, -10.0);
        assert_eq!(snapshot.change_percent, -5.0);
        assert!(!snapshot.is_positive());
    }

    #[test]
    fn test_bars_in_window() {
        let bars = vec![
            QuoteBar::new(t0(), 1.0, 1.0, 1.0, 1.0),
            QuoteBar::new(t0() - Duration::days(3), 1.0, 1.0, 1.0, 1.0),
        ];
        let snapshot = StockSnapshot::from_bars("IBM", bars).unwrap();

        assert_eq!(snapshot.bars_in(TimeRange::OneDay, t0()).len(), 1);
        assert_eq!(snapshot.bars_in(TimeRange::All, t0()).len(), 2);
    }
}
