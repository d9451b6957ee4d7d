// ============================================================================
// Gestion des événements
// ============================================================================
// Gère les événements clavier et les ticks de l'application
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Error handling avec Result
// 3. Pattern matching sur KeyCode et KeyModifiers
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (aucune touche pendant le poll)
    Tick,
}

/// Gestionnaire d'événements
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend max 250ms
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                // Sur certains OS, on reçoit Press ET Release : on ne garde que Press
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : Convertir KeyEvent en action
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

/// Vérifie si l'événement est la touche 'q' (quitter)
pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q') | KeyCode::Char('Q')))
}

/// Vérifie si l'événement est Ctrl+C
pub fn is_interrupt_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
    } else {
        false
    }
}

/// Vérifie si l'événement est Échap
pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

/// Vérifie si l'événement est Entrée
pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

/// Vérifie si l'événement est 's' (recherche de symbole)
pub fn is_symbol_search_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('s') | KeyCode::Char('S')))
}

/// Vérifie si l'événement est 'w' (recherche météo)
pub fn is_city_search_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('w') | KeyCode::Char('W')))
}

/// Vérifie si l'événement est 'l' ou → (fenêtre suivante)
pub fn is_next_range_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('l') | KeyCode::Right))
}

/// Vérifie si l'événement est 'h' ou ← (fenêtre précédente)
pub fn is_previous_range_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('h') | KeyCode::Left))
}

/// Vérifie si l'événement est la flèche vers le haut
///
/// Pas de 'k' : en mode saisie, les lettres vont dans le buffer.
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up))
}

/// Vérifie si l'événement est la flèche vers le bas
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down))
}

/// Vérifie si l'événement est Backspace
pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Vérifie si l'événement est un caractère saisissable
///
/// Les noms de ville contiennent espaces, accents et virgules : tout
/// caractère imprimable est accepté, sauf avec Ctrl.
pub fn is_input_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        !key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char(c) if !c.is_control())
    } else {
        false
    }
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) => Some(c),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_range_keys() {
        assert!(is_next_range_event(&key(KeyCode::Char('l'))));
        assert!(is_next_range_event(&key(KeyCode::Right)));
        assert!(is_previous_range_event(&key(KeyCode::Char('h'))));
        assert!(is_previous_range_event(&key(KeyCode::Left)));
        assert!(!is_next_range_event(&key(KeyCode::Char('h'))));
    }

    #[test]
    fn test_search_keys() {
        assert!(is_symbol_search_event(&key(KeyCode::Char('s'))));
        assert!(is_city_search_event(&key(KeyCode::Char('w'))));
        assert!(!is_city_search_event(&key(KeyCode::Char('s'))));
    }

    #[test]
    fn test_input_chars() {
        assert!(is_input_char_event(&key(KeyCode::Char('é'))));
        assert!(is_input_char_event(&key(KeyCode::Char(' '))));
        assert!(is_input_char_event(&key(KeyCode::Char(','))));
        assert!(!is_input_char_event(&key(KeyCode::Enter)));

        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!is_input_char_event(&ctrl_c));
        assert!(is_interrupt_event(&ctrl_c));

        assert_eq!(get_char_from_event(&key(KeyCode::Char('x'))), Some('x'));
        assert_eq!(get_char_from_event(&Event::Tick), None);
    }
}
