// ============================================================================
// Structure : QuoteBar (Open, High, Low, Close)
// ============================================================================
// Représente une chandelle japonaise (candlestick) de la série intraday
// et la fenêtre de temps (TimeRange) choisie par l'utilisateur
//
// CONCEPTS RUST :
// 1. DateTime<Utc> : type de chrono pour dates avec timezone UTC
// 2. f64 : floating point 64 bits pour les prix (précision suffisante)
// 3. Cow<'a, [T]> : emprunte quand rien ne change, possède quand on filtre
// ============================================================================

use std::borrow::Cow;

use chrono::{DateTime, Days, Months, Utc};

/// Fenêtre de temps relative pour l'affichage du graphique
///
/// CONCEPT : Arithmétique calendaire
/// - 1D / 1W : on recule en jours (1 et 7)
/// - 1M / 3M / 6M / 1Y : on recule en mois (la fin de mois est respectée)
/// - ALL : aucune limite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// 1 jour
    OneDay,
    /// 1 semaine
    OneWeek,
    /// 1 mois
    OneMonth,
    /// 3 mois
    ThreeMonths,
    /// 6 mois
    SixMonths,
    /// 1 an
    OneYear,
    /// Toute la série
    All,
}

/// Durée calendaire d'une fenêtre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalendarSpan {
    Days(u64),
    Months(u32),
}

impl TimeRange {
    /// Retourne le label pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::SixMonths => "6M",
            TimeRange::OneYear => "1Y",
            TimeRange::All => "ALL",
        }
    }

    /// Retourne toutes les fenêtres, dans l'ordre des boutons
    pub fn all() -> [TimeRange; 7] {
        [
            TimeRange::OneDay,
            TimeRange::OneWeek,
            TimeRange::OneMonth,
            TimeRange::ThreeMonths,
            TimeRange::SixMonths,
            TimeRange::OneYear,
            TimeRange::All,
        ]
    }

    /// Retourne la fenêtre suivante (cycle)
    pub fn next(&self) -> TimeRange {
        match self {
            TimeRange::OneDay => TimeRange::OneWeek,
            TimeRange::OneWeek => TimeRange::OneMonth,
            TimeRange::OneMonth => TimeRange::ThreeMonths,
            TimeRange::ThreeMonths => TimeRange::SixMonths,
            TimeRange::SixMonths => TimeRange::OneYear,
            TimeRange::OneYear => TimeRange::All,
            TimeRange::All => TimeRange::OneDay, // Boucle
        }
    }

    /// Retourne la fenêtre précédente (cycle)
    pub fn previous(&self) -> TimeRange {
        match self {
            TimeRange::OneDay => TimeRange::All, // Boucle
            TimeRange::OneWeek => TimeRange::OneDay,
            TimeRange::OneMonth => TimeRange::OneWeek,
            TimeRange::ThreeMonths => TimeRange::OneMonth,
            TimeRange::SixMonths => TimeRange::ThreeMonths,
            TimeRange::OneYear => TimeRange::SixMonths,
            TimeRange::All => TimeRange::OneYear,
        }
    }

    fn span(&self) -> Option<CalendarSpan> {
        match self {
            TimeRange::OneDay => Some(CalendarSpan::Days(1)),
            TimeRange::OneWeek => Some(CalendarSpan::Days(7)),
            TimeRange::OneMonth => Some(CalendarSpan::Months(1)),
            TimeRange::ThreeMonths => Some(CalendarSpan::Months(3)),
            TimeRange::SixMonths => Some(CalendarSpan::Months(6)),
            TimeRange::OneYear => Some(CalendarSpan::Months(12)),
            TimeRange::All => None,
        }
    }

    /// Calcule l'instant limite de la fenêtre (None pour ALL)
    ///
    /// Convention : une soustraction de mois qui tombe sur un jour inexistant
    /// est ramenée au dernier jour du mois cible (31 mars - 1M = 28/29 février).
    /// Si le calcul sort de la plage représentable, la limite est l'instant minimum.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let cutoff = match self.span()? {
            CalendarSpan::Days(days) => now.checked_sub_days(Days::new(days)),
            CalendarSpan::Months(months) => now.checked_sub_months(Months::new(months)),
        };
        Some(cutoff.unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    /// Restreint les chandelles à la fenêtre (ordre conservé, source intacte)
    ///
    /// CONCEPT RUST : Cow (Clone on Write)
    /// - ALL : Cow::Borrowed, la slice d'origine sans copie
    /// - autres : Cow::Owned, les chandelles avec timestamp >= cutoff
    pub fn filter<'a>(&self, bars: &'a [QuoteBar], now: DateTime<Utc>) -> Cow<'a, [QuoteBar]> {
        match self.cutoff(now) {
            None => Cow::Borrowed(bars),
            Some(cutoff) => Cow::Owned(
                bars.iter()
                    .filter(|bar| bar.timestamp >= cutoff)
                    .cloned()
                    .collect(),
            ),
        }
    }
}

impl Default for TimeRange {
    /// Fenêtre par défaut : 1 mois
    fn default() -> Self {
        TimeRange::OneMonth
    }
}

/// Une chandelle japonaise (candlestick)
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteBar {
    /// Timestamp de la chandelle (UTC)
    pub timestamp: DateTime<Utc>,

    /// Prix d'ouverture (Open)
    pub open: f64,

    /// Prix le plus haut (High)
    pub high: f64,

    /// Prix le plus bas (Low)
    pub low: f64,

    /// Prix de clôture (Close)
    pub close: f64,
}

impl QuoteBar {
    /// Constructeur : crée une nouvelle chandelle
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Variation depuis l'ouverture
    pub fn change(&self) -> f64 {
        self.close - self.open
    }

    /// Variation en pourcentage depuis l'ouverture
    pub fn change_percent(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            (self.change() / self.open) * 100.0
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn bar(timestamp: DateTime<Utc>, close: f64) -> QuoteBar {
        QuoteBar::new(timestamp, close - 1.0, close + 1.0, close - 2.0, close)
    }

    /// Série latest-first, une chandelle tous les 10 jours sur ~2 ans
    fn series(now: DateTime<Utc>) -> Vec<QuoteBar> {
        (0..75)
            .map(|i| bar(now - Duration::days(i * 10), 100.0 + i as f64))
            .collect()
    }

    #[test]
    fn test_bar_change() {
        let b = QuoteBar::new(Utc::now(), 100.0, 110.0, 95.0, 105.0);
        assert_eq!(b.change(), 5.0);
        assert_eq!(b.change_percent(), 5.0);

        let flat = QuoteBar::new(Utc::now(), 0.0, 0.0, 0.0, 0.0);
        assert_eq!(flat.change_percent(), 0.0);
    }

    #[test]
    fn test_labels_and_cycle() {
        let labels: Vec<&str> = TimeRange::all().iter().map(|r| r.label()).collect();
        assert_eq!(labels, ["1D", "1W", "1M", "3M", "6M", "1Y", "ALL"]);

        assert_eq!(TimeRange::All.next(), TimeRange::OneDay);
        assert_eq!(TimeRange::OneDay.previous(), TimeRange::All);
        for range in TimeRange::all() {
            assert_eq!(range.next().previous(), range);
        }
        assert_eq!(TimeRange::default(), TimeRange::OneMonth);
    }

    #[test]
    fn test_cutoff_values() {
        let now = at(2024, 6, 15, 14);
        assert_eq!(TimeRange::OneDay.cutoff(now), Some(at(2024, 6, 14, 14)));
        assert_eq!(TimeRange::OneWeek.cutoff(now), Some(at(2024, 6, 8, 14)));
        assert_eq!(TimeRange::OneMonth.cutoff(now), Some(at(2024, 5, 15, 14)));
        assert_eq!(TimeRange::ThreeMonths.cutoff(now), Some(at(2024, 3, 15, 14)));
        assert_eq!(TimeRange::SixMonths.cutoff(now), Some(at(2023, 12, 15, 14)));
        assert_eq!(TimeRange::OneYear.cutoff(now), Some(at(2023, 6, 15, 14)));
        assert_eq!(TimeRange::All.cutoff(now), None);
    }

    #[test]
    fn test_cutoff_clamps_to_month_end() {
        // 31 mars 2024 - 1 mois = 29 février (année bissextile)
        assert_eq!(TimeRange::OneMonth.cutoff(at(2024, 3, 31, 9)), Some(at(2024, 2, 29, 9)));
        // 31 mars 2023 - 1 mois = 28 février
        assert_eq!(TimeRange::OneMonth.cutoff(at(2023, 3, 31, 9)), Some(at(2023, 2, 28, 9)));
        // 29 février 2024 - 1 an = 28 février 2023
        assert_eq!(TimeRange::OneYear.cutoff(at(2024, 2, 29, 9)), Some(at(2023, 2, 28, 9)));
        // 31 août - 6 mois = 29 février
        assert_eq!(TimeRange::SixMonths.cutoff(at(2024, 8, 31, 9)), Some(at(2024, 2, 29, 9)));
    }

    #[test]
    fn test_cutoffs_are_monotonic() {
        let dates = [
            at(2024, 3, 31, 0),
            at(2024, 2, 29, 23),
            at(2023, 12, 31, 12),
            at(2025, 1, 1, 0),
        ];
        let ordered = [
            TimeRange::OneDay,
            TimeRange::OneWeek,
            TimeRange::OneMonth,
            TimeRange::ThreeMonths,
            TimeRange::SixMonths,
            TimeRange::OneYear,
        ];

        for now in dates {
            let cutoffs: Vec<DateTime<Utc>> =
                ordered.iter().map(|r| r.cutoff(now).unwrap()).collect();
            for pair in cutoffs.windows(2) {
                assert!(pair[0] >= pair[1], "cutoffs not monotonic at {now}");
            }
        }
    }

    #[test]
    fn test_filter_is_subsequence_within_window() {
        let now = at(2024, 6, 15, 14);
        let bars = series(now);

        for range in TimeRange::all() {
            let filtered = range.filter(&bars, now);
            let cutoff = range.cutoff(now);

            // Chaque chandelle retenue est dans la fenêtre
            if let Some(cutoff) = cutoff {
                assert!(filtered.iter().all(|b| b.timestamp >= cutoff));
                // Et aucune chandelle de la fenêtre n'est perdue
                let expected = bars.iter().filter(|b| b.timestamp >= cutoff).count();
                assert_eq!(filtered.len(), expected);
            }

            // Sous-séquence : même ordre relatif que la source
            let mut source = bars.iter();
            for kept in filtered.iter() {
                assert!(source.any(|b| b == kept), "{} is not a subsequence", range.label());
            }
        }

        // La source n'est pas modifiée
        assert_eq!(bars, series(now));
    }

    #[test]
    fn test_filter_counts() {
        let now = at(2024, 6, 15, 14);
        let bars = series(now);

        // Chandelles à now, now-10j, now-20j, ...
        assert_eq!(TimeRange::OneDay.filter(&bars, now).len(), 1);
        assert_eq!(TimeRange::OneWeek.filter(&bars, now).len(), 1);
        assert_eq!(TimeRange::OneMonth.filter(&bars, now).len(), 4); // 0,10,20,30 (31 jours en mai)
        assert_eq!(TimeRange::All.filter(&bars, now).len(), 75);
    }

    #[test]
    fn test_filter_all_borrows_input() {
        let now = at(2024, 6, 15, 14);
        let bars = series(now);

        let all = TimeRange::All.filter(&bars, now);
        assert!(matches!(all, Cow::Borrowed(_)));
        assert_eq!(all.as_ptr(), bars.as_ptr());
        assert_eq!(&*all, bars.as_slice());
    }

    #[test]
    fn test_filter_empty_result_is_valid() {
        let now = at(2024, 6, 15, 14);
        let old = vec![bar(at(2020, 1, 1, 0), 10.0)];
        assert!(TimeRange::OneYear.filter(&old, now).is_empty());
        assert!(TimeRange::OneDay.filter(&[], now).is_empty());
    }

    #[test]
    fn test_filter_keeps_bar_exactly_at_cutoff() {
        let now = at(2024, 6, 15, 14);
        let bars = vec![bar(at(2024, 6, 14, 14), 10.0), bar(at(2024, 6, 14, 13), 9.0)];
        let filtered = TimeRange::OneDay.filter(&bars, now);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].close, 10.0);
    }
}
