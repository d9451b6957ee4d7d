// ============================================================================
// Chart - Graphiques ligne du tableau de bord
// ============================================================================
// Deux graphiques : clôtures de la fenêtre visible (bourse) et température
// horaire (météo)
//
// CONCEPTS RUST :
// 1. Iterator chaining : transformer les données en points (x, y)
// 2. fold : calculer min/max en un seul passage
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::models::{HourlyPoint, QuoteBar};

// ============================================================================
// Conversion des données en points
// ============================================================================

/// Points (index, clôture) dans l'ordre chronologique
///
/// Les chandelles arrivent de la plus récente à la plus ancienne.
pub fn price_points(bars: &[QuoteBar]) -> Vec<(f64, f64)> {
    bars.iter()
        .rev()
        .enumerate()
        .map(|(i, bar)| (i as f64, bar.close))
        .collect()
}

/// Points (index, température) dans l'ordre du fournisseur
pub fn temperature_points(hourly: &[HourlyPoint]) -> Vec<(f64, f64)> {
    hourly
        .iter()
        .enumerate()
        .map(|(i, point)| (i as f64, point.temperature))
        .collect()
}

/// Bornes de l'axe Y avec une marge de 5%
///
/// Une série plate reçoit une marge fixe d'une unité.
pub fn y_bounds(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }

    let (min, max) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(min, max), &(_x, y)| (min.min(y), max.max(y)));

    let margin = if max > min { (max - min) * 0.05 } else { 1.0 };
    Some((min - margin, max + margin))
}

fn x_max(points: &[(f64, f64)]) -> f64 {
    // Un seul point : borne à 1 pour que l'axe ne soit pas vide
    (points.len().saturating_sub(1) as f64).max(1.0)
}

fn time_label(timestamp: Option<DateTime<Utc>>, format: &str) -> Span<'static> {
    Span::raw(
        timestamp
            .map(|t| t.format(format).to_string())
            .unwrap_or_default(),
    )
}

// ============================================================================
// Graphique bourse
// ============================================================================

/// Dessine la courbe des clôtures pour les chandelles visibles
pub fn render_price_chart(
    frame: &mut Frame,
    area: Rect,
    symbol: &str,
    bars: &[QuoteBar],
    positive: bool,
) {
    let points = price_points(bars);
    let Some((min_price, max_price)) = y_bounds(&points) else {
        render_no_data(frame, area, "Pas de données dans cette fenêtre");
        return;
    };
    // Ne descend pas en dessous de 0
    let y_min = min_price.max(0.0);

    let color = if positive { Color::Green } else { Color::Red };

    let datasets = vec![Dataset::default()
        .name(symbol)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, x_max(&points)])
        .labels(vec![
            time_label(bars.last().map(|b| b.timestamp), "%d/%m %H:%M"),
            time_label(bars.first().map(|b| b.timestamp), "%d/%m %H:%M"),
        ]);

    let y_axis = Axis::default()
        .title("Prix ($)")
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, max_price])
        .labels(vec![
            Span::raw(format!("${:.2}", y_min)),
            Span::raw(format!("${:.2}", (y_min + max_price) / 2.0)),
            Span::raw(format!("${:.2}", max_price)),
        ]);

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::TOP))
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

// ============================================================================
// Graphique météo
// ============================================================================

/// Dessine la température horaire
pub fn render_temperature_chart(frame: &mut Frame, area: Rect, hourly: &[HourlyPoint]) {
    let points = temperature_points(hourly);
    let Some((y_min, y_max)) = y_bounds(&points) else {
        render_no_data(frame, area, "Pas de prévision horaire");
        return;
    };

    let datasets = vec![Dataset::default()
        .name("°C")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Yellow))
        .data(&points)];

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, x_max(&points)])
        .labels(vec![
            time_label(hourly.first().map(|p| p.timestamp), "%d/%m %Hh"),
            time_label(hourly.last().map(|p| p.timestamp), "%d/%m %Hh"),
        ]);

    let y_axis = Axis::default()
        .title("°C")
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{:.0}", y_min)),
            Span::raw(format!("{:.0}", (y_min + y_max) / 2.0)),
            Span::raw(format!("{:.0}", y_max)),
        ]);

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::TOP))
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Affiche un message quand il n'y a pas de données à afficher
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::TOP))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
