// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine le tableau de bord : header, widget bourse, widget météo, footer
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, etc.)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
// ============================================================================

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Screen, StockWidget, WeatherWidget};
use crate::models::{StockSnapshot, TimeRange};
use crate::ui::chart;

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size(), app.is_in_input_mode());

    render_header(frame, app, chunks[0]);

    // Deux widgets côte à côte
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_stock_panel(frame, &app.stock, panels[0]);
    render_weather_panel(frame, &app.weather, panels[1]);

    match app.current_screen {
        Screen::Dashboard => render_footer(frame, app, chunks[2]),
        Screen::SymbolSearch | Screen::CitySearch => render_input_footer(frame, app, chunks[2]),
    }
}

// ============================================================================
// Layout : Découpage de l'écran
// ============================================================================

/// Crée le layout principal (header, content, footer)
///
/// En mode saisie, le footer gagne une ligne pour les suggestions.
fn create_layout(area: Rect, input_mode: bool) -> Vec<Rect> {
    let footer_height = if input_mode { 4 } else { 3 };

    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header : 3 lignes
            Constraint::Min(0),                // Content : tout le reste
            Constraint::Length(footer_height), // Footer
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" LazyDash ")
        .title_alignment(Alignment::Center);

    let status = if app.is_loading_data() {
        Span::styled("⏳ Chargement...", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            "Bourse & Météo",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    };

    let paragraph = Paragraph::new(Line::from(status))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Widget bourse
// ============================================================================

/// Ligne de variation : "▲ +1.25 (+0.65%)"
pub fn format_change(snapshot: &StockSnapshot) -> String {
    let arrow = if snapshot.is_positive() { "▲" } else { "▼" };
    format!(
        "{} {:+.2} ({:+.2}%)",
        arrow, snapshot.change, snapshot.change_percent
    )
}

/// Barre des fenêtres de temps, la fenêtre active en surbrillance
fn time_range_line(selected: TimeRange) -> Line<'static> {
    let mut spans = Vec::new();
    for range in TimeRange::all() {
        let style = if range == selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", range.label()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn render_stock_panel(frame: &mut Frame, stock: &StockWidget, area: Rect) {
    let title = match &stock.symbol {
        Some(symbol) => format!(" 📈 {} ", symbol),
        None => " 📈 Bourse ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Prix + variation
            Constraint::Length(1), // Fenêtres de temps
            Constraint::Min(0),    // Graphique
            Constraint::Length(1), // Erreur
        ])
        .split(inner);

    // Prix et variation
    let summary = match &stock.snapshot {
        Some(snapshot) => {
            let color = if snapshot.is_positive() {
                Color::Green
            } else {
                Color::Red
            };
            vec![
                Line::from(vec![
                    Span::styled(
                        format!("${:.2}", snapshot.price),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(format_change(snapshot), Style::default().fg(color)),
                ]),
                Line::from(Span::styled(
                    format!(
                        "O {:.2}  H {:.2}  L {:.2}  Préc. {:.2}",
                        snapshot.open, snapshot.high, snapshot.low, snapshot.previous_close
                    ),
                    Style::default().fg(Color::Gray),
                )),
            ]
        }
        None if stock.loading => vec![Line::from("Chargement...")],
        None => vec![Line::from(Span::styled(
            "Appuyez sur [s] pour chercher un symbole",
            Style::default().fg(Color::Gray),
        ))],
    };
    frame.render_widget(Paragraph::new(summary), rows[0]);

    frame.render_widget(Paragraph::new(time_range_line(stock.time_range)), rows[1]);

    if let Some(snapshot) = &stock.snapshot {
        let bars = stock.visible_bars(Utc::now());
        chart::render_price_chart(frame, rows[2], &snapshot.symbol, &bars, snapshot.is_positive());
    }

    if let Some(error) = &stock.error {
        let line = Line::from(Span::styled(
            format!("⚠ {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line), rows[3]);
    }
}

// ============================================================================
// Widget météo
// ============================================================================

fn render_weather_panel(frame: &mut Frame, weather: &WeatherWidget, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 🌤 Météo ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Lieu + conditions
            Constraint::Min(0),    // Graphique
            Constraint::Length(1), // Alerte
        ])
        .split(inner);

    let result = weather.result.as_ref();

    let mut summary = Vec::new();
    match result.and_then(|r| r.location()) {
        Some(location) => summary.push(Line::from(Span::styled(
            location.display_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))),
        None if weather.loading => summary.push(Line::from("Chargement...")),
        None => summary.push(Line::from(Span::styled(
            "Appuyez sur [w] pour chercher une ville",
            Style::default().fg(Color::Gray),
        ))),
    }
    if let Some(snapshot) = result.and_then(|r| r.weather()) {
        summary.push(Line::from(vec![
            Span::styled(
                format!("{:.1} °C", snapshot.current.temperature),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::raw(format!("💨 {:.1} km/h", snapshot.current.wind_speed)),
        ]));
    }
    frame.render_widget(Paragraph::new(summary), rows[0]);

    if let Some(snapshot) = result.and_then(|r| r.weather()) {
        chart::render_temperature_chart(frame, rows[1], &snapshot.hourly);
    }

    if let Some(alert) = &weather.alert {
        let line = Line::from(Span::styled(
            format!("⚠ {}", alert),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line), rows[2]);
    }
}

// ============================================================================
// Footer : Instructions
// ============================================================================

fn key_style(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Dessine le footer avec les raccourcis clavier
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", key_style(Color::Yellow)),
            Span::styled(
                "[q]",
                key_style(Color::Red).add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                key_style(Color::Yellow),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key_style(Color::Yellow)),
            Span::raw(" Quit  "),
            Span::styled("[s]", key_style(Color::Green)),
            Span::raw(" Symbol  "),
            Span::styled("[w]", key_style(Color::Green)),
            Span::raw(" Weather  "),
            Span::styled("[h/l ←→]", key_style(Color::Yellow)),
            Span::raw(" Range"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Dessine le footer en mode saisie : prompt, buffer et suggestions
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let prompt = match app.current_screen {
        Screen::CitySearch => "City: ",
        _ => "Symbol: ",
    };

    let input_line = Line::from(vec![
        Span::styled(prompt, key_style(Color::Cyan)),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█", // Curseur
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::raw("   "),
        Span::styled("[Enter]", key_style(Color::Green)),
        Span::raw(" Confirm  "),
        Span::styled("[ESC]", key_style(Color::Red)),
        Span::raw(" Cancel"),
    ]);

    let mut suggestion_spans = Vec::new();
    if !app.suggestions.is_empty() {
        suggestion_spans.push(Span::styled("[↑↓] ", key_style(Color::Yellow)));
    }
    for (i, symbol) in app.suggestions.iter().enumerate() {
        let style = if app.selected_suggestion == Some(i) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        suggestion_spans.push(Span::styled(format!(" {} ", symbol), style));
        suggestion_spans.push(Span::raw(" "));
    }

    let paragraph = Paragraph::new(vec![input_line, Line::from(suggestion_spans)])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::{CurrentConditions, GeoLocation, LookupResult, QuoteBar, WeatherSnapshot};
    use chrono::{Duration, TimeZone};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn snapshot() -> StockSnapshot {
        let t = Utc::now() - Duration::hours(1);
        StockSnapshot::from_bars(
            "IBM",
            vec![
                QuoteBar::new(t, 180.0, 183.0, 179.5, 182.5),
                QuoteBar::new(t - Duration::minutes(5), 179.0, 180.5, 178.0, 180.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_format_change() {
        let snap = snapshot();
        assert_eq!(format_change(&snap), "▲ +2.50 (+1.39%)");

        let mut down = snap;
        down.change = -1.0;
        down.change_percent = -0.5;
        assert_eq!(format_change(&down), "▼ -1.00 (-0.50%)");
    }

    #[test]
    fn test_render_loaded_dashboard() {
        let mut app = App::new();
        let token = app.stock.begin_fetch("ibm");
        app.stock.apply_fetch(token, Ok(snapshot()));

        let token = app.weather.begin_lookup("Paris");
        app.weather.apply_lookup(
            token,
            LookupResult::Resolved {
                location: GeoLocation::new("Paris, France", 48.85, 2.35),
                weather: WeatherSnapshot {
                    current: CurrentConditions {
                        temperature: 12.3,
                        wind_speed: 8.0,
                    },
                    hourly: vec![crate::models::HourlyPoint {
                        timestamp: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
                        temperature: 11.0,
                    }],
                },
            },
        );

        let screen = draw(&app);
        assert!(screen.contains("IBM"));
        assert!(screen.contains("$182.50"));
        assert!(screen.contains("Paris, France"));
        assert!(screen.contains("12.3 °C"));
        assert!(screen.contains("1M"));
    }

    #[test]
    fn test_render_errors() {
        let mut app = App::new();
        let token = app.stock.begin_fetch("ZZZZ");
        app.stock
            .apply_fetch(token, Err(FetchError::data_unavailable("ZZZZ", "Invalid API call")));

        let token = app.weather.begin_lookup("Atlantis");
        app.weather.apply_lookup(
            token,
            LookupResult::LocationNotFound {
                cause: FetchError::not_found("Atlantis"),
            },
        );

        let screen = draw(&app);
        assert!(screen.contains("Failed to fetch stock data. Please try again."));
        assert!(screen.contains("City not found."));
    }

    #[test]
    fn test_render_input_footer_with_suggestions() {
        let mut app = App::new();
        app.start_symbol_search();
        app.append_char('m');

        let screen = draw(&app);
        assert!(screen.contains("Symbol: m"));
        assert!(screen.contains("MSFT"));
        assert!(screen.contains("AMZN"));
    }
}
