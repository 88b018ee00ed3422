use crate::error::FetchError;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use tokio::sync::Mutex;
use url::Url;

/// Where preview documents and other panel resources are fetched from
#[async_trait]
pub trait PreviewSource: Send + Sync {
    /// GETs `url` and returns the body; a non-success response is an error
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Whether `url` can be retrieved
    async fn is_reachable(&self, url: &str) -> bool {
        self.fetch_text(url).await.is_ok()
    }
}

/// Plain HTTP source
#[derive(Debug, Clone, Default)]
pub struct HttpPreviewSource {
    client: reqwest::Client,
}

impl HttpPreviewSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PreviewSource for HttpPreviewSource {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response.text().await.map_err(network)
    }

    async fn is_reachable(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                ::log::debug!("Probe of {} failed: {}", url, e);
                false
            }
        }
    }
}

/// Source that loads pages through a WebDriver session, for previews that only
/// render completely in a browser.
///
/// The session is opened on first use and reopened after it is lost. WebDriver
/// does not expose the response status, so an error page comes back as content;
/// use it for preview documents only and fetch translations and favicons over HTTP.
pub struct WebDriverPreviewSource {
    webdriver_url: String,
    client: Mutex<Option<Client>>,
}

impl WebDriverPreviewSource {
    pub fn new(webdriver_url: &str) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            client: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<Client, FetchError> {
        ClientBuilder::native()
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| FetchError::WebDriver {
                url: self.webdriver_url.clone(),
                message: e.to_string(),
            })
    }

    /// Ends the WebDriver session, if one is open
    pub async fn close(&self) {
        if let Some(client) = self.client.lock().await.take() {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}

#[async_trait]
impl PreviewSource for WebDriverPreviewSource {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut slot = self.client.lock().await;
        let client = match slot.as_ref() {
            Some(client) => client.clone(),
            None => {
                ::log::debug!("Connecting to WebDriver at {}", self.webdriver_url);
                let client = self.connect().await?;
                *slot = Some(client.clone());
                client
            }
        };

        let loaded = match client.goto(url).await {
            Ok(()) => client.source().await,
            Err(e) => Err(e),
        };

        loaded.map_err(|e| {
            let message = e.to_string();
            if message.contains("Unable to find session") {
                ::log::warn!("Lost WebDriver session while loading {}", url);
                *slot = None;
            }
            FetchError::WebDriver {
                url: url.to_string(),
                message,
            }
        })
    }
}

/// Resolves `href` against `base`, leaving it untouched when either does not parse
pub fn resolve_url(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Picks the favicon to show in the snippet preview.
///
/// The page's own favicon wins when reachable, then the configured default; `None`
/// leaves the choice to the preview's built-in icon.
pub async fn resolve_favicon(
    source: &dyn PreviewSource,
    page_url: &str,
    hint: &str,
    default_src: Option<&str>,
) -> Option<String> {
    if !hint.is_empty() {
        let src = resolve_url(page_url, hint);
        if source.is_reachable(&src).await {
            return Some(src);
        }
        ::log::debug!("Favicon {} declared by the page is not reachable", src);
    }

    match default_src {
        Some(src) if !src.is_empty() && source.is_reachable(src).await => Some(src.to_string()),
        _ => None,
    }
}
