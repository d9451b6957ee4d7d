// ============================================================================
// SymbolSuggester : suggestions de tickers
// ============================================================================
// Filtre une liste fixe de symboles par sous-chaîne, sans tenir compte de la
// casse. L'ordre du résultat est celui de la liste de référence.
//
// Synchrone et sans I/O : appelé à chaque frappe dans le champ de recherche.
// ============================================================================

/// Liste de référence, dans l'ordre déclaré
pub const REFERENCE_SYMBOLS: [&str; 6] = ["AAPL", "GOOGL", "MSFT", "AMZN", "IBM", "TSLA"];

/// Suggestions de symboles à partir d'une liste fixe
#[derive(Debug, Clone)]
pub struct SymbolSuggester {
    symbols: Vec<String>,
}

impl SymbolSuggester {
    /// Crée un suggester sur une liste personnalisée (l'ordre est conservé)
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// Retourne les symboles contenant la requête (insensible à la casse)
    ///
    /// Une requête vide retourne toute la liste.
    pub fn suggest(&self, query: &str) -> Vec<&str> {
        let needle = query.to_lowercase();
        self.symbols
            .iter()
            .filter(|symbol| symbol.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }
}

impl Default for SymbolSuggester {
    fn default() -> Self {
        Self::new(REFERENCE_SYMBOLS)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_match() {
        let suggester = SymbolSuggester::default();
        assert_eq!(suggester.suggest("AAP"), vec!["AAPL"]);
    }

    #[test]
    fn test_empty_query_returns_all_in_order() {
        let suggester = SymbolSuggester::default();
        assert_eq!(suggester.suggest(""), REFERENCE_SYMBOLS.to_vec());
    }

    #[test]
    fn test_no_match() {
        let suggester = SymbolSuggester::default();
        assert!(suggester.suggest("zzz").is_empty());
    }

    #[test]
    fn test_case_insensitive_substring() {
        let suggester = SymbolSuggester::default();
        assert_eq!(suggester.suggest("m"), vec!["MSFT", "AMZN", "IBM"]);
        assert_eq!(suggester.suggest("oog"), vec!["GOOGL"]);
        assert_eq!(suggester.suggest("Sl"), vec!["TSLA"]);
    }

    #[test]
    fn test_declared_order_not_alphabetical() {
        let suggester = SymbolSuggester::new(["ZM", "AZN", "ZS"]);
        assert_eq!(suggester.suggest("z"), vec!["ZM", "AZN", "ZS"]);
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let suggester = SymbolSuggester::default();
        assert!(suggester.suggest(" AAPL").is_empty());
    }
}
