//! Téléchargement distant sous budget de taille et de temps

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt, TryStreamExt};
use tracing::{debug, warn};
use url::Url;

use crate::decode::{charset_from_content_type, decode_text};
use crate::guard::url::check_origin;
use crate::types::{Limits, SecurityPolicy};
use crate::GeoIngestError;

const USER_AGENT: &str = concat!("geoingest/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 5;

/// Réponse HTTP dont le corps n'a pas encore été lu
pub struct RemoteResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub body: BoxStream<'static, Result<Bytes, GeoIngestError>>,
}

impl std::fmt::Debug for RemoteResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Transport HTTP injectable.
///
/// Le corps est exposé en flux pour pouvoir abandonner la lecture dès que le
/// budget est dépassé.
pub trait HttpFetch: Send + Sync {
    /// Émet un GET sans identifiants ni cookies
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<RemoteResponse, GeoIngestError>>;
}

impl<T: HttpFetch + ?Sized> HttpFetch for Arc<T> {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<RemoteResponse, GeoIngestError>> {
        (**self).get(url)
    }
}

/// Texte téléchargé et son type MIME déclaré
#[derive(Debug, Clone)]
pub struct FetchedText {
    pub text: String,
    pub content_type: Option<String>,
}

/// Télécharge `url` en respectant `limits`.
///
/// - délai global `fetch_timeout_secs` (toute la requête, corps compris)
/// - rejet immédiat si `Content-Length` dépasse le budget
/// - sinon lecture en flux avec comptage ; le flux est abandonné dès que le
///   cumul dépasse le budget
/// - décodage texte seulement une fois le corps complet dans le budget
pub async fn fetch_with_budget(
    fetcher: &dyn HttpFetch,
    url: &Url,
    limits: &Limits,
) -> Result<FetchedText, GeoIngestError> {
    let label = url.to_string();
    let timeout = limits.fetch_timeout();

    match tokio::time::timeout(timeout, fetch_inner(fetcher, url, limits.max_remote_bytes)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(url = %label, timeout_secs = timeout.as_secs(), "Remote fetch timed out");
            Err(GeoIngestError::Timeout {
                label,
                secs: timeout.as_secs(),
            })
        }
    }
}

async fn fetch_inner(
    fetcher: &dyn HttpFetch,
    url: &Url,
    budget: u64,
) -> Result<FetchedText, GeoIngestError> {
    let label = url.to_string();
    let response = fetcher.get(url).await?;

    if !(200..300).contains(&response.status) {
        return Err(GeoIngestError::http(
            &label,
            format!("unexpected status {}", response.status),
        ));
    }

    if let Some(len) = response.content_length {
        if len > budget {
            debug!(url = %label, content_length = len, budget, "Rejected by Content-Length");
            return Err(GeoIngestError::TooLarge {
                label,
                limit: budget,
            });
        }
    }

    let capacity = response.content_length.unwrap_or(0).min(budget) as usize;
    let mut buf = BytesMut::with_capacity(capacity);
    let mut body = response.body;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if (buf.len() + chunk.len()) as u64 > budget {
            // Drop du flux = annulation de la lecture en cours
            drop(body);
            debug!(url = %label, read = buf.len(), budget, "Body exceeded budget mid-stream");
            return Err(GeoIngestError::TooLarge {
                label,
                limit: budget,
            });
        }
        buf.extend_from_slice(&chunk);
    }

    let charset = response
        .content_type
        .as_deref()
        .and_then(charset_from_content_type);
    let text = decode_text(&buf, charset);

    Ok(FetchedText {
        text,
        content_type: response.content_type,
    })
}

/// Transport de production basé sur reqwest
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Crée un client qui revalide chaque cible de redirection avec `policy`
    pub fn new(policy: SecurityPolicy, connect_timeout: Duration) -> Result<Self, GeoIngestError> {
        let redirect = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if let Err(e) = check_origin(attempt.url(), &policy) {
                warn!(target_url = %attempt.url(), error = %e, "Refusing redirect");
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .redirect(redirect)
            .build()
            .map_err(|e| GeoIngestError::http("client", format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<RemoteResponse, GeoIngestError>> {
        async move {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| GeoIngestError::http(url.as_str(), e.to_string()))?;

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let label = url.to_string();
            Ok(RemoteResponse {
                status: response.status().as_u16(),
                content_length: response.content_length(),
                content_type,
                body: response
                    .bytes_stream()
                    .map_err(move |e| GeoIngestError::http(&label, e.to_string()))
                    .boxed(),
            })
        }
        .boxed()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Transport de test : répond avec des morceaux prédéfinis
    pub(crate) struct MockFetch {
        pub content_length: Option<u64>,
        pub content_type: Option<String>,
        pub status: u16,
        pub chunks: Vec<Vec<u8>>,
        pub body_polled: Arc<AtomicBool>,
        pub chunks_read: Arc<AtomicUsize>,
    }

    impl MockFetch {
        pub(crate) fn with_body(body: &str) -> Self {
            Self {
                content_length: Some(body.len() as u64),
                content_type: Some("application/json".to_string()),
                status: 200,
                chunks: vec![body.as_bytes().to_vec()],
                body_polled: Arc::new(AtomicBool::new(false)),
                chunks_read: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl HttpFetch for MockFetch {
        fn get<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<RemoteResponse, GeoIngestError>> {
            let polled = Arc::clone(&self.body_polled);
            let read = Arc::clone(&self.chunks_read);
            let chunks = self.chunks.clone();
            let body = stream::iter(chunks).map(move |c| {
                polled.store(true, Ordering::SeqCst);
                read.fetch_add(1, Ordering::SeqCst);
                Ok(Bytes::from(c))
            });
            let response = RemoteResponse {
                status: self.status,
                content_length: self.content_length,
                content_type: self.content_type.clone(),
                body: body.boxed(),
            };
            async move { Ok(response) }.boxed()
        }
    }

    /// Transport qui ne répond jamais
    struct HangingFetch;

    impl HttpFetch for HangingFetch {
        fn get<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<RemoteResponse, GeoIngestError>> {
            futures::future::pending().boxed()
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/a.geojson").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_within_budget() {
        let mock = MockFetch {
            chunks: vec![b"{\"type\":".to_vec(), b"\"FeatureCollection\"}".to_vec()],
            content_length: None,
            ..MockFetch::with_body("")
        };
        let fetched = fetch_with_budget(&mock, &url(), &Limits::default())
            .await
            .unwrap();
        assert_eq!(fetched.text, r#"{"type":"FeatureCollection"}"#);
        assert_eq!(fetched.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_content_length_over_budget_fails_before_body() {
        let mock = MockFetch {
            content_length: Some(600_000_000),
            ..MockFetch::with_body("{}")
        };
        let err = fetch_with_budget(&mock, &url(), &Limits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoIngestError::TooLarge { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::BudgetExceeded);
        assert!(!mock.body_polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_stream_aborts_when_budget_exceeded() {
        let limits = Limits {
            max_remote_bytes: 10,
            ..Default::default()
        };
        let mock = MockFetch {
            content_length: None,
            chunks: vec![vec![b'a'; 6], vec![b'b'; 6], vec![b'c'; 6], vec![b'd'; 6]],
            ..MockFetch::with_body("")
        };
        let err = fetch_with_budget(&mock, &url(), &limits).await.unwrap_err();
        assert!(matches!(err, GeoIngestError::TooLarge { limit: 10, .. }));
        // Les morceaux suivants ne sont jamais lus
        assert_eq!(mock.chunks_read.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exact_budget_is_accepted() {
        let limits = Limits {
            max_remote_bytes: 4,
            ..Default::default()
        };
        let mock = MockFetch::with_body("abcd");
        let fetched = fetch_with_budget(&mock, &url(), &limits).await.unwrap();
        assert_eq!(fetched.text, "abcd");
    }

    #[tokio::test]
    async fn test_timeout() {
        let limits = Limits {
            fetch_timeout_secs: 0,
            ..Default::default()
        };
        let err = fetch_with_budget(&HangingFetch, &url(), &limits)
            .await
            .unwrap_err();
        assert!(matches!(err, GeoIngestError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock = MockFetch {
            status: 404,
            ..MockFetch::with_body("not found")
        };
        let err = fetch_with_budget(&mock, &url(), &Limits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoIngestError::Http { .. }));
    }

    #[tokio::test]
    async fn test_charset_from_header() {
        let mock = MockFetch {
            content_type: Some("text/csv; charset=ISO-8859-1".to_string()),
            chunks: vec![vec![b'c', b'a', b'f', 0xE9]],
            content_length: Some(4),
            ..MockFetch::with_body("")
        };
        let fetched = fetch_with_budget(&mock, &url(), &Limits::default())
            .await
            .unwrap();
        assert_eq!(fetched.text, "café");
    }
}
