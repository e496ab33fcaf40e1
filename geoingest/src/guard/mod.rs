//! Garde d'entrée : validation des sources non fiables et budgets de transfert

pub mod fetch;
pub mod local;
pub mod url;

pub use fetch::{fetch_with_budget, FetchedText, HttpFetch, RemoteResponse, ReqwestFetcher};
pub use local::{read_local_file, validate_local_file, LocalFile};
pub use self::url::{check_origin, validate_import_url, ValidatedUrl};
