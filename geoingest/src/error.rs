//! Types d'erreurs pour le crate geoingest

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Catégorie d'une erreur, utilisée par l'appelant pour choisir la réaction
/// (message à corriger, confirmation, abandon silencieux...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Entrée invalide (URL, fichier, extension, saisie utilisateur)
    Validation,
    /// Budget de taille, de temps ou de complexité dépassé
    BudgetExceeded,
    /// Contenu illisible (JSON, CSV, shapefile)
    Parse,
    /// Données de référence (frontières, métadonnées pays) indisponibles
    ReferenceData,
    /// Chargement refusé par l'utilisateur
    UserCanceled,
    /// Erreur réseau ou I/O non classée ailleurs
    Transport,
}

/// Erreurs pouvant survenir pendant l'ingestion
#[derive(Debug, Error)]
pub enum GeoIngestError {
    /// URL non parsable
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Schéma autre que https
    #[error("Protocol not allowed: {0} (only https is accepted)")]
    ProtocolNotAllowed(String),

    /// user:password présent dans l'URL
    #[error("Credentials are not allowed in import URLs")]
    CredentialsNotAllowed,

    /// Port explicite autre que 443
    #[error("Port not allowed: {0} (only the default https port is accepted)")]
    PortNotAllowed(u16),

    /// Hôte privé, interne, loopback ou de rebinding DNS
    #[error("Host is private or internal and cannot be imported from: {0}")]
    PrivateHostBlocked(String),

    /// Hôte absent de la liste stricte
    #[error("Host is not in the allowed host list: {0}")]
    HostNotAllowed(String),

    /// Extension de fichier non supportée
    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    /// Taille au-delà du budget
    #[error("{label} is too large (limit: {limit} bytes)")]
    TooLarge { label: String, limit: u64 },

    /// Téléchargement trop long
    #[error("Fetching {label} timed out after {secs}s")]
    Timeout { label: String, secs: u64 },

    /// Trop de features
    #[error("{label} has too many features: {count} (limit: {limit})")]
    TooManyFeatures {
        label: String,
        count: usize,
        limit: usize,
    },

    /// Trop de sommets
    #[error("{label} is too complex: {count} vertices (limit: {limit})")]
    TooComplex {
        label: String,
        count: usize,
        limit: usize,
    },

    /// Erreur de parsing d'une source
    #[error("Parse error in {source_label}: {reason}")]
    Parse {
        source_label: String,
        reason: String,
    },

    /// Jeu de frontières mal formé
    #[error("Invalid boundary data: {0}")]
    InvalidBoundaryData(String),

    /// Table de métadonnées pays mal formée
    #[error("Invalid country metadata: {0}")]
    InvalidMetadata(String),

    /// Aucune source configurée pour une donnée de référence
    #[error("No source configured for {0}")]
    MissingReferenceSource(&'static str),

    /// Échec partagé du chargement des données de référence
    #[error("Reference data unavailable: {0}")]
    ReferenceData(Arc<GeoIngestError>),

    /// Identifiant de couche inconnu
    #[error("Unknown layer: {0}")]
    UnknownLayer(u64),

    /// Index de classe hors limites
    #[error("Unknown class index: {0}")]
    UnknownClass(usize),

    /// Saisie de bornes invalide
    #[error("Invalid class range: {0:?} (expected two numbers separated by a dash)")]
    InvalidBreakRange(String),

    /// Couleur invalide
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    /// Opération numérique sur une classification catégorielle
    #[error("Attribute {0} is not numeric")]
    NotNumeric(String),

    /// Réponse HTTP en erreur ou transport défaillant
    #[error("HTTP error for {url}: {reason}")]
    Http { url: String, reason: String },

    /// Erreur d'I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chargement refusé par l'utilisateur
    #[error("Import canceled by user")]
    UserCanceled,
}

impl GeoIngestError {
    /// Crée une erreur de parsing avec contexte
    pub fn parse_error(source_label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            source_label: source_label.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur HTTP avec contexte
    pub fn http(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Catégorie de l'erreur
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl(_)
            | Self::ProtocolNotAllowed(_)
            | Self::CredentialsNotAllowed
            | Self::PortNotAllowed(_)
            | Self::PrivateHostBlocked(_)
            | Self::HostNotAllowed(_)
            | Self::UnsupportedExtension(_)
            | Self::UnknownLayer(_)
            | Self::UnknownClass(_)
            | Self::InvalidBreakRange(_)
            | Self::InvalidColor(_)
            | Self::NotNumeric(_) => ErrorKind::Validation,
            Self::TooLarge { .. }
            | Self::Timeout { .. }
            | Self::TooManyFeatures { .. }
            | Self::TooComplex { .. } => ErrorKind::BudgetExceeded,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::InvalidBoundaryData(_)
            | Self::InvalidMetadata(_)
            | Self::MissingReferenceSource(_)
            | Self::ReferenceData(_) => ErrorKind::ReferenceData,
            Self::UserCanceled => ErrorKind::UserCanceled,
            Self::Http { .. } | Self::Io(_) => ErrorKind::Transport,
        }
    }

    /// Vrai si l'erreur doit être affichée à l'utilisateur
    /// (un refus de confirmation est silencieux)
    pub fn is_user_facing(&self) -> bool {
        self.kind() != ErrorKind::UserCanceled
    }
}
