// ============================================================================
// LazyDash - Tableau de bord bourse & météo dans le terminal
// ============================================================================
// Programme TUI avec deux widgets :
// - Bourse : cotation intraday d'un symbole (Alpha Vantage) + graphique
// - Météo : recherche d'une ville (Nominatim) puis prévisions (Open-Meteo)
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Async dans sync : worker thread avec un runtime tokio
// 4. Jetons de requête : le dernier résultat demandé gagne
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use lazydash::api::{AlphaVantageClient, LookupPipeline, NominatimClient, OpenMeteoClient, WeatherLookup};
use lazydash::app::{App, RequestToken, Submission};
use lazydash::config::Config;
use lazydash::error::FetchError;
use lazydash::models::{LookupResult, StockSnapshot};
use lazydash::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand : Commandes pour le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker lance une tâche tokio par commande (requêtes en parallèle)
// - Chaque résultat revient avec le jeton de sa requête
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Récupérer la cotation d'un symbole
    FetchStock { symbol: String, token: RequestToken },

    /// Chercher la météo d'une ville
    LookupWeather { place: String, token: RequestToken },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    StockFetched {
        token: RequestToken,
        result: Result<StockSnapshot, FetchError>,
    },

    WeatherLooked {
        token: RequestToken,
        result: LookupResult,
    },
}

impl AppCommand {
    /// Résultat en échec pour cette commande (jeton conservé)
    ///
    /// Utilisé quand la commande ne peut pas aboutir : worker arrêté ou
    /// tâche qui a paniqué. Le widget sort ainsi de l'état "loading".
    fn into_failure(self, reason: &str) -> AppResult {
        let cause = FetchError::Network(reason.to_string());
        match self {
            AppCommand::FetchStock { token, .. } => AppResult::StockFetched {
                token,
                result: Err(cause),
            },
            AppCommand::LookupWeather { token, .. } => AppResult::WeatherLooked {
                token,
                result: LookupResult::LocationNotFound { cause },
            },
        }
    }
}

/// Services HTTP partagés entre les tâches du worker
struct Services {
    quotes: AlphaVantageClient,
    weather: WeatherLookup,
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, avec rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f logs/lazydash.log.*
///
/// # Contrôler le niveau de log
/// RUST_LOG=lazydash=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::PathBuf::from("./logs");

    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "lazydash.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: lazydash::api::nominatim)
                .with_thread_ids(true) // Utile avec plusieurs tâches en parallèle
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour lazydash, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazydash=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    // Si init échoue, on affiche l'erreur et continue quand même
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("LazyDash starting up");

    // Configuration et clients : on échoue avant de toucher au terminal
    let config = Config::load().context("Impossible de charger la configuration")?;
    debug!(?config, "Configuration loaded");

    let services = Arc::new(build_services(&config)?);

    // Runtime multi-thread : chaque commande devient une tâche indépendante
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Impossible de créer le runtime tokio")?;

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    // CONCEPT RUST : Arc<Mutex<>> pour partage entre threads
    // - L'UI lit et modifie l'état, le worker compte les tâches en cours
    let app = Arc::new(Mutex::new(App::new()));

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(runtime, services, command_rx, result_tx, app.clone());

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Construit les clients HTTP
///
/// Sans clé d'API, le démarrage échoue immédiatement.
fn build_services(config: &Config) -> Result<Services> {
    let quotes = AlphaVantageClient::new(config).with_context(|| {
        format!(
            "Clé d'API Alpha Vantage invalide : définissez {} ou alpha_vantage_api_key dans lazydash.toml",
            lazydash::config::API_KEY_ENV
        )
    })?;

    let geocoder = NominatimClient::new(config).context("Impossible de créer le client Nominatim")?;
    let forecaster = OpenMeteoClient::new(config).context("Impossible de créer le client Open-Meteo")?;

    Ok(Services {
        quotes,
        weather: LookupPipeline::new(geocoder, forecaster),
    })
}

/// Verrouille l'état, même si un thread a paniqué en le tenant
fn lock_app(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Thread + runtime tokio
// - Le thread reçoit les commandes de façon bloquante (recv)
// - Chaque commande est lancée avec runtime.spawn() : pas d'attente
// - Les résultats repartent vers l'UI par le channel result_tx
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    services: Arc<Services>,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    app: Arc<Mutex<App>>,
) {
    std::thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            let services = services.clone();
            let result_tx = result_tx.clone();
            let app = app.clone();

            lock_app(&app).task_started();
            let fallback = command.clone().into_failure("request task failed");

            runtime.spawn(async move {
                let result = run_guarded(execute_command(services, command), fallback).await;

                // Toujours atteint, même si la requête a paniqué
                lock_app(&app).task_finished();

                if result_tx.send(result).is_err() {
                    debug!("Result channel closed, dropping result");
                }
            });
        }

        // Channel fermé : l'UI a quitté
        info!("Worker thread exiting (channel closed)");
        runtime.shutdown_background();
    });
}

/// Exécute une commande contre les services HTTP
async fn execute_command(services: Arc<Services>, command: AppCommand) -> AppResult {
    match command {
        AppCommand::FetchStock { symbol, token } => {
            let result = services.quotes.fetch_stock(&symbol).await;
            if let Err(e) = &result {
                error!(ticker = %symbol, error = %e, kind = e.kind(), "Failed to fetch stock data");
            }
            AppResult::StockFetched { token, result }
        }
        AppCommand::LookupWeather { place, token } => {
            let result = services.weather.lookup(&place).await;
            AppResult::WeatherLooked { token, result }
        }
    }
}

/// Lance la requête dans sa propre tâche et attend son JoinHandle
///
/// CONCEPT RUST : JoinHandle
/// - Une panique dans la tâche devient un JoinError au lieu de la perdre
/// - Dans ce cas, le résultat de secours est renvoyé à la place
async fn run_guarded<F>(job: F, fallback: AppResult) -> AppResult
where
    F: std::future::Future<Output = AppResult> + Send + 'static,
{
    match tokio::spawn(job).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Request task did not complete");
            fallback
        }
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Event Loop Pattern
// 1. Appliquer les résultats du worker
// 2. Dessiner l'interface
// 3. Traiter les événements clavier
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    loop {
        if !lock_app(&app).is_running() {
            break;
        }

        // ========================================
        // 0. RÉSULTATS : applique tout ce qui est arrivé
        // ========================================
        loop {
            match result_rx.try_recv() {
                Ok(result) => apply_result(&mut lock_app(&app), result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if worker_alive {
                        error!("Worker thread disconnected!");
                        worker_alive = false;
                    }
                    break;
                }
            }
        }

        // ========================================
        // 1. RENDER
        // ========================================
        terminal.draw(|frame| {
            let app_lock = lock_app(&app);
            render(frame, &app_lock);
        })?;

        // ========================================
        // 2. INPUT
        // ========================================
        match events.next() {
            Ok(event) => handle_event(&mut lock_app(&app), event, &command_tx),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Applique un résultat du worker (les résultats périmés sont ignorés)
fn apply_result(app: &mut App, result: AppResult) {
    match result {
        AppResult::StockFetched { token, result } => {
            let succeeded = result.is_ok();
            if app.stock.apply_fetch(token, result) {
                info!(?token, succeeded, "Stock widget updated");
            }
        }
        AppResult::WeatherLooked { token, result } => {
            let resolved = result.is_resolved();
            if app.weather.apply_lookup(token, result) {
                info!(?token, resolved, "Weather widget updated");
            }
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
fn handle_event(app: &mut App, event: lazydash::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use lazydash::ui::events::{
        get_char_from_event, is_backspace_event, is_city_search_event, is_down_event,
        is_enter_event, is_escape_event, is_input_char_event, is_interrupt_event,
        is_next_range_event, is_previous_range_event, is_quit_event, is_symbol_search_event,
        is_up_event, Event,
    };

    if is_interrupt_event(&event) {
        info!("User interrupted (Ctrl+C)");
        app.quit();
        return;
    }

    // ========================================
    // Mode saisie : toutes les touches vont au champ
    // ========================================
    if app.is_in_input_mode() {
        match event {
            Event::Key(_) if is_escape_event(&event) => {
                info!("User cancelled input");
                app.cancel_input();
            }
            Event::Key(_) if is_enter_event(&event) => match app.submit_input() {
                Some(submission) => dispatch(app, submission, command_tx),
                None => debug!("Empty input, ignoring"),
            },
            Event::Key(_) if is_backspace_event(&event) => app.backspace(),
            Event::Key(_) if is_up_event(&event) => app.select_previous_suggestion(),
            Event::Key(_) if is_down_event(&event) => app.select_next_suggestion(),
            Event::Key(_) if is_input_char_event(&event) => {
                if let Some(c) = get_char_from_event(&event) {
                    app.append_char(c);
                }
            }
            _ => {}
        }
        return;
    }

    // ========================================
    // Dashboard
    // ========================================
    match event {
        Event::Key(_) if is_quit_event(&event) => {
            // Two-step quit : première pression = confirmation
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }
        Event::Key(_) if is_symbol_search_event(&event) => {
            app.cancel_quit();
            info!("User opened symbol search");
            app.start_symbol_search();
        }
        Event::Key(_) if is_city_search_event(&event) => {
            app.cancel_quit();
            info!("User opened city search");
            app.start_city_search();
        }
        Event::Key(_) if is_next_range_event(&event) => {
            app.cancel_quit();
            app.stock.next_range();
            info!(range = %app.stock.time_range.label(), "User changed to next time range");
        }
        Event::Key(_) if is_previous_range_event(&event) => {
            app.cancel_quit();
            app.stock.previous_range();
            info!(range = %app.stock.time_range.label(), "User changed to previous time range");
        }
        Event::Key(_) => {
            // Toute autre touche : annule la confirmation de quit
            app.cancel_quit();
        }
        Event::Tick => {}
    }
}

/// Démarre la requête correspondant à la saisie et l'envoie au worker
///
/// Si le worker ne répond plus, la requête échoue immédiatement.
fn dispatch(app: &mut App, submission: Submission, command_tx: &mpsc::Sender<AppCommand>) {
    let command = match submission {
        Submission::Symbol(symbol) => {
            let token = app.stock.begin_fetch(&symbol);
            info!(ticker = %symbol, ?token, "User requested stock data");
            AppCommand::FetchStock { symbol, token }
        }
        Submission::City(place) => {
            let token = app.weather.begin_lookup(&place);
            info!(place = %place, ?token, "User requested weather");
            AppCommand::LookupWeather { place, token }
        }
    };

    if let Err(mpsc::SendError(command)) = command_tx.send(command) {
        error!(?command, "Worker unavailable, request dropped");
        apply_result(app, command.into_failure("worker unavailable"));
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Impossible d'activer le raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Impossible de créer le terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
