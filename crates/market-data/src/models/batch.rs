use serde::{Deserialize, Serialize};

use super::quote::Quote;

/// A symbol that could not be fetched in a batch, with the reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of a multi-symbol quote fetch.
///
/// `quotes` keeps the input order of the symbols that succeeded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuotes {
    pub quotes: Vec<Quote>,
    pub failures: Vec<SymbolFailure>,
}

impl BatchQuotes {
    /// True when no symbol succeeded and at least one failed.
    pub fn is_total_failure(&self) -> bool {
        self.quotes.is_empty() && !self.failures.is_empty()
    }

    /// One-line summary of the failures, e.g. `"BAD: No data found: ..."`.
    pub fn failure_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(|f| format!("{}: {}", f.symbol, f.reason))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_is_not_total_failure() {
        let batch = BatchQuotes::default();
        assert!(!batch.is_total_failure());
        assert_eq!(batch.failure_summary(), None);
    }

    #[test]
    fn test_failure_summary() {
        let batch = BatchQuotes {
            quotes: vec![],
            failures: vec![
                SymbolFailure {
                    symbol: "BAD".to_string(),
                    reason: "HTTP error: status 500".to_string(),
                },
                SymbolFailure {
                    symbol: "WORSE".to_string(),
                    reason: "Request timed out".to_string(),
                },
            ],
        };
        assert!(batch.is_total_failure());
        assert_eq!(
            batch.failure_summary().unwrap(),
            "BAD: HTTP error: status 500; WORSE: Request timed out"
        );
    }
}
