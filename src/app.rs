// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global du tableau de bord TUI : widget bourse, widget météo,
// saisie utilisateur et suggestions de symboles
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Jetons de requête : seul le dernier résultat demandé est appliqué
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// ============================================================================

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::alpha_vantage::normalize_symbol;
use crate::error::FetchError;
use crate::models::{LookupResult, QuoteBar, StockSnapshot, SymbolSuggester, TimeRange};

/// Message affiché quand la récupération d'une cotation échoue
pub const STOCK_ERROR_MESSAGE: &str = "Failed to fetch stock data. Please try again.";

// ============================================================================
// Jetons de requête
// ============================================================================
// CONCEPT : Last-issued-wins
// - Chaque requête reçoit un jeton strictement croissant
// - Les requêtes tournent en parallèle et peuvent finir dans le désordre
// - Un résultat n'est appliqué que si son jeton est le dernier émis
// ============================================================================

/// Identifiant d'une requête d'un widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Émet les jetons d'un widget et retient le dernier
#[derive(Debug, Default, Clone)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Émet un nouveau jeton (invalide tous les précédents)
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    /// true seulement pour le dernier jeton émis
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest != 0 && token.0 == self.latest
    }
}

// ============================================================================
// Widget bourse
// ============================================================================

/// État du widget bourse
#[derive(Debug, Default)]
pub struct StockWidget {
    /// Dernier symbole demandé
    pub symbol: Option<String>,

    /// Instantané courant (None si rien chargé ou si la dernière requête a échoué)
    pub snapshot: Option<StockSnapshot>,

    /// Message d'erreur pour l'utilisateur
    pub error: Option<String>,

    /// Fenêtre de temps affichée, conservée entre les requêtes
    pub time_range: TimeRange,

    pub loading: bool,

    tracker: RequestTracker,
}

impl StockWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Démarre une requête pour un symbole et retourne son jeton
    pub fn begin_fetch(&mut self, symbol: &str) -> RequestToken {
        let token = self.tracker.issue();
        self.symbol = Some(normalize_symbol(symbol));
        self.loading = true;
        self.error = None;
        debug!(?token, symbol = ?self.symbol, "Stock fetch started");
        token
    }

    /// Applique le résultat d'une requête
    ///
    /// Retourne false (et ne change rien) si le jeton n'est plus le dernier.
    pub fn apply_fetch(
        &mut self,
        token: RequestToken,
        result: Result<StockSnapshot, FetchError>,
    ) -> bool {
        if !self.tracker.is_current(token) {
            debug!(?token, "Discarding stale stock result");
            return false;
        }

        self.loading = false;
        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(_) => {
                self.snapshot = None;
                self.error = Some(STOCK_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// Chandelles visibles dans la fenêtre courante
    pub fn visible_bars(&self, now: DateTime<Utc>) -> Cow<'_, [QuoteBar]> {
        match &self.snapshot {
            Some(snapshot) => snapshot.bars_in(self.time_range, now),
            None => Cow::Borrowed(&[]),
        }
    }

    pub fn next_range(&mut self) {
        self.time_range = self.time_range.next();
    }

    pub fn previous_range(&mut self) {
        self.time_range = self.time_range.previous();
    }
}

// ============================================================================
// Widget météo
// ============================================================================

/// État du widget météo
#[derive(Debug, Default)]
pub struct WeatherWidget {
    /// Dernier lieu demandé (tel que saisi)
    pub place: Option<String>,

    /// Résultat de la dernière recherche appliquée
    pub result: Option<LookupResult>,

    /// Alerte pour l'utilisateur (None si la recherche a réussi)
    pub alert: Option<String>,

    pub loading: bool,

    tracker: RequestTracker,
}

impl WeatherWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Démarre une recherche et retourne son jeton
    pub fn begin_lookup(&mut self, place: &str) -> RequestToken {
        let token = self.tracker.issue();
        self.place = Some(place.trim().to_string());
        self.loading = true;
        self.alert = None;
        debug!(?token, place = ?self.place, "Weather lookup started");
        token
    }

    /// Applique le résultat d'une recherche
    ///
    /// Retourne false (et ne change rien) si le jeton n'est plus le dernier.
    pub fn apply_lookup(&mut self, token: RequestToken, result: LookupResult) -> bool {
        if !self.tracker.is_current(token) {
            debug!(?token, "Discarding stale weather result");
            return false;
        }

        self.loading = false;
        self.alert = result.alert_message().map(str::to_string);
        self.result = Some(result);
        true
    }
}

// ============================================================================
// Enum : Screen
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul écran actif à la fois
// - Les deux modes de saisie capturent toutes les touches
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : widgets bourse et météo
    Dashboard,

    /// Saisie d'un symbole boursier (avec suggestions)
    SymbolSearch,

    /// Saisie d'un nom de ville
    CitySearch,
}

/// Valeur validée par l'utilisateur en mode saisie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Symbol(String),
    City(String),
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Two-step quit : première pression de 'q' = confirmation demandée
    pub confirm_quit: bool,

    pub stock: StockWidget,
    pub weather: WeatherWidget,

    /// Nombre de tâches en cours dans le worker
    pub pending_tasks: usize,

    /// Texte en cours de saisie
    pub input_buffer: String,

    /// Suggestions pour le texte saisi (mode SymbolSearch uniquement)
    pub suggestions: Vec<String>,

    /// Suggestion surlignée
    pub selected_suggestion: Option<usize>,

    suggester: SymbolSuggester,
}

impl App {
    pub fn new() -> Self {
        Self::with_suggester(SymbolSuggester::default())
    }

    pub fn with_suggester(suggester: SymbolSuggester) -> Self {
        Self {
            running: true,
            current_screen: Screen::Dashboard,
            confirm_quit: false,
            stock: StockWidget::new(),
            weather: WeatherWidget::new(),
            pending_tasks: 0,
            input_buffer: String::new(),
            suggestions: Vec::new(),
            selected_suggestion: None,
            suggester,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Tâches du worker
    // ========================================================================

    pub fn task_started(&mut self) {
        self.pending_tasks += 1;
    }

    pub fn task_finished(&mut self) {
        self.pending_tasks = self.pending_tasks.saturating_sub(1);
    }

    /// Vérifie si des données sont en cours de chargement
    pub fn is_loading_data(&self) -> bool {
        self.pending_tasks > 0 || self.stock.loading || self.weather.loading
    }

    // ========================================================================
    // Input Mode Management
    // ========================================================================

    pub fn start_symbol_search(&mut self) {
        self.current_screen = Screen::SymbolSearch;
        self.input_buffer.clear();
        self.refresh_suggestions();
    }

    pub fn start_city_search(&mut self) {
        self.current_screen = Screen::CitySearch;
        self.input_buffer.clear();
        self.refresh_suggestions();
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen != Screen::Dashboard
    }

    /// Annule la saisie et retourne au dashboard
    pub fn cancel_input(&mut self) {
        self.leave_input();
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
        self.refresh_suggestions();
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
        self.refresh_suggestions();
    }

    /// Recalcule les suggestions pour le texte saisi
    ///
    /// Un buffer vide ne propose rien ; la sélection revient à zéro.
    pub fn refresh_suggestions(&mut self) {
        self.suggestions = if self.current_screen == Screen::SymbolSearch
            && !self.input_buffer.is_empty()
        {
            self.suggester
                .suggest(&self.input_buffer)
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };
        self.selected_suggestion = None;
    }

    /// Surligne la suggestion suivante
    pub fn select_next_suggestion(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        let last = self.suggestions.len() - 1;
        self.selected_suggestion = Some(match self.selected_suggestion {
            None => 0,
            Some(i) => (i + 1).min(last),
        });
    }

    /// Surligne la suggestion précédente (None au-dessus de la première)
    pub fn select_previous_suggestion(&mut self) {
        self.selected_suggestion = match self.selected_suggestion {
            None | Some(0) => None,
            Some(i) => Some(i - 1),
        };
    }

    /// Valide la saisie et retourne au dashboard
    ///
    /// La suggestion surlignée prend le pas sur le texte saisi.
    /// Retourne None si rien d'exploitable n'a été saisi.
    pub fn submit_input(&mut self) -> Option<Submission> {
        let screen = self.current_screen;
        let value = self
            .selected_suggestion
            .and_then(|i| self.suggestions.get(i).cloned())
            .unwrap_or_else(|| self.input_buffer.trim().to_string());
        self.leave_input();

        if value.is_empty() {
            return None;
        }

        match screen {
            Screen::SymbolSearch => Some(Submission::Symbol(value)),
            Screen::CitySearch => Some(Submission::City(value)),
            Screen::Dashboard => None,
        }
    }

    fn leave_input(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.input_buffer.clear();
        self.suggestions.clear();
        self.selected_suggestion = None;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrentConditions, GeoLocation, WeatherSnapshot};
    use chrono::{Duration, TimeZone};

    fn snapshot(symbol: &str, price: f64) -> StockSnapshot {
        let t = Utc.with_ymd_and_hms(2024, 1, 5, 15, 55, 0).unwrap();
        StockSnapshot::from_bars(
            symbol,
            vec![
                QuoteBar::new(t, price - 1.0, price + 1.0, price - 2.0, price),
                QuoteBar::new(t - Duration::days(10), 90.0, 91.0, 89.0, 90.5),
            ],
        )
        .unwrap()
    }

    fn resolved() -> LookupResult {
        LookupResult::Resolved {
            location: GeoLocation::new("Paris, France", 48.85, 2.35),
            weather: WeatherSnapshot {
                current: CurrentConditions {
                    temperature: 12.0,
                    wind_speed: 5.0,
                },
                hourly: Vec::new(),
            },
        }
    }

    #[test]
    fn test_tracker_last_issued_wins() {
        let mut tracker = RequestTracker::new();
        let first = tracker.issue();
        assert!(tracker.is_current(first));

        let second = tracker.issue();
        assert!(second > first);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[test]
    fn test_stock_stale_result_discarded() {
        let mut widget = StockWidget::new();
        let old = widget.begin_fetch("aapl");
        let new = widget.begin_fetch("msft");
        assert_eq!(widget.symbol.as_deref(), Some("MSFT"));

        // Le plus récent arrive en premier
        assert!(widget.apply_fetch(new, Ok(snapshot("MSFT", 400.0))));
        // L'ancien arrive ensuite : ignoré
        assert!(!widget.apply_fetch(old, Ok(snapshot("AAPL", 190.0))));

        assert_eq!(widget.snapshot.as_ref().unwrap().symbol, "MSFT");
        assert!(!widget.loading);
    }

    #[test]
    fn test_stock_failure_sets_message_and_clears_snapshot() {
        let mut widget = StockWidget::new();
        let token = widget.begin_fetch("AAPL");
        widget.apply_fetch(token, Ok(snapshot("AAPL", 190.0)));

        let token = widget.begin_fetch("ZZZZ");
        assert!(widget.loading);
        widget.apply_fetch(token, Err(FetchError::data_unavailable("ZZZZ", "Invalid API call")));

        assert!(widget.snapshot.is_none());
        assert_eq!(widget.error.as_deref(), Some(STOCK_ERROR_MESSAGE));

        // Une nouvelle requête efface l'erreur
        widget.begin_fetch("AAPL");
        assert!(widget.error.is_none());
    }

    #[test]
    fn test_time_range_survives_refetch() {
        let mut widget = StockWidget::new();
        widget.next_range();
        let range = widget.time_range;
        assert_ne!(range, TimeRange::default());

        let token = widget.begin_fetch("AAPL");
        widget.apply_fetch(token, Ok(snapshot("AAPL", 190.0)));
        assert_eq!(widget.time_range, range);

        widget.previous_range();
        assert_eq!(widget.time_range, TimeRange::default());
    }

    #[test]
    fn test_visible_bars() {
        let mut widget = StockWidget::new();
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 16, 0, 0).unwrap();
        assert!(widget.visible_bars(now).is_empty());

        let token = widget.begin_fetch("AAPL");
        widget.apply_fetch(token, Ok(snapshot("AAPL", 190.0)));

        widget.time_range = TimeRange::OneWeek;
        assert_eq!(widget.visible_bars(now).len(), 1);

        widget.time_range = TimeRange::All;
        assert_eq!(widget.visible_bars(now).len(), 2);
    }

    #[test]
    fn test_weather_stale_result_discarded() {
        let mut widget = WeatherWidget::new();
        let old = widget.begin_lookup("Atlantis");
        let new = widget.begin_lookup(" Paris ");
        assert_eq!(widget.place.as_deref(), Some("Paris"));

        assert!(widget.apply_lookup(new, resolved()));
        let stale = LookupResult::LocationNotFound {
            cause: FetchError::not_found("Atlantis"),
        };
        assert!(!widget.apply_lookup(old, stale));

        assert!(widget.result.as_ref().unwrap().is_resolved());
        assert!(widget.alert.is_none());
        assert!(!widget.loading);
    }

    #[test]
    fn test_weather_alert_stored() {
        let mut widget = WeatherWidget::new();
        let token = widget.begin_lookup("Atlantis");
        widget.apply_lookup(
            token,
            LookupResult::LocationNotFound {
                cause: FetchError::not_found("Atlantis"),
            },
        );
        assert_eq!(
            widget.alert.as_deref(),
            Some("City not found. Please enter a valid city name.")
        );
    }

    #[test]
    fn test_quit_confirmation() {
        let mut app = App::new();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_symbol_suggestions_follow_input() {
        let mut app = App::new();
        app.start_symbol_search();
        assert!(app.suggestions.is_empty());

        app.append_char('a');
        assert_eq!(app.suggestions, vec!["AAPL", "AMZN", "TSLA"]);

        app.append_char('m');
        assert_eq!(app.suggestions, vec!["AMZN"]);

        app.backspace();
        assert_eq!(app.suggestions, vec!["AAPL", "AMZN", "TSLA"]);
    }

    #[test]
    fn test_submit_prefers_selected_suggestion() {
        let mut app = App::new();
        app.start_symbol_search();
        app.append_char('a');
        app.select_next_suggestion();
        app.select_next_suggestion();
        app.select_next_suggestion();
        app.select_next_suggestion(); // reste sur la dernière
        assert_eq!(app.selected_suggestion, Some(2));
        app.select_previous_suggestion();

        assert_eq!(app.submit_input(), Some(Submission::Symbol("AMZN".to_string())));
        assert!(!app.is_in_input_mode());
        assert!(app.suggestions.is_empty());
    }

    #[test]
    fn test_submit_typed_text() {
        let mut app = App::new();
        app.start_symbol_search();
        for c in "nflx".chars() {
            app.append_char(c);
        }
        app.select_previous_suggestion();
        assert_eq!(app.submit_input(), Some(Submission::Symbol("nflx".to_string())));

        app.start_city_search();
        for c in " Lyon ".chars() {
            app.append_char(c);
        }
        assert!(app.suggestions.is_empty());
        assert_eq!(app.submit_input(), Some(Submission::City("Lyon".to_string())));
    }

    #[test]
    fn test_submit_blank_is_ignored() {
        let mut app = App::new();
        app.start_city_search();
        app.append_char(' ');
        assert_eq!(app.submit_input(), None);
        assert_eq!(app.current_screen, Screen::Dashboard);
    }

    #[test]
    fn test_pending_tasks() {
        let mut app = App::new();
        assert!(!app.is_loading_data());
        app.task_started();
        assert!(app.is_loading_data());
        app.task_finished();
        app.task_finished();
        assert_eq!(app.pending_tasks, 0);
    }
}
