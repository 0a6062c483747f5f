//! Types d'erreurs pour le crate bal

use thiserror::Error;

/// Erreurs pouvant survenir lors du traitement d'un fichier BAL
#[derive(Debug, Error)]
pub enum BalError {
    /// Erreur d'I/O lors de la lecture de la source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Erreur du lecteur CSV sous-jacent
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Fichier inutilisable dans son ensemble (en-tête absent ou incomplet)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Numéro hors du domaine encodable dans une clé d'interopérabilité
    #[error("Numero out of range: {0} (max 99999)")]
    NumeroOutOfRange(u32),
}

/// Ligne écartée par l'import, avec sa raison.
///
/// Les rejets ligne à ligne ne sont jamais des erreurs fatales : ils sont
/// accumulés dans le résultat et l'import continue sur le reste du fichier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// Numéro de ligne dans le fichier source, en-tête compris (la
    /// première ligne de données est donc la ligne 2)
    pub line: usize,

    /// Valeur incriminée, si elle est isolable
    pub value: Option<String>,

    /// Raison du rejet
    pub reason: String,
}

impl RejectedRow {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            value: None,
            reason: reason.into(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl std::fmt::Display for RejectedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "line {} ('{}'): {}", self.line, value, self.reason),
            None => write!(f, "line {}: {}", self.line, self.reason),
        }
    }
}
