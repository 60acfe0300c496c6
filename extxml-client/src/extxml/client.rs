//! ExtXML endpoint client.
//!
//! Ties the pieces together: builds a request document, hands it to
//! the transport, and converts the response into domain records. The
//! transport is a trait so tests (and offline tooling) can swap the
//! HTTP POST for canned data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::domain::Place;

use super::error::{ExtXmlError, TransportError};
use super::request::{self, LocationKind, SearchQuery};
use super::response;
use super::xml::{self, Element};

/// Default endpoint of the Saarfahrplan installation.
const DEFAULT_ENDPOINT: &str = "http://saarfahrplan.de/cgi-bin/extxml.exe";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The zone the endpoint's schedule data lives in.
const ENDPOINT_TIMEZONE: Tz = chrono_tz::Europe::Berlin;

/// Configuration for the ExtXML client.
#[derive(Debug, Clone)]
pub struct ExtXmlConfig {
    /// Access token embedded in every request document.
    pub access_token: String,
    /// Endpoint URL receiving the POSTs.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Zone used to reconstruct dates from wire times.
    pub timezone: Tz,
}

impl ExtXmlConfig {
    /// Create a config with the given access token and defaults for
    /// everything else.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            timezone: ENDPOINT_TIMEZONE,
        }
    }

    /// Set a custom endpoint URL (for testing).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the zone wire times are interpreted in.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}

/// The transport collaborator: one POST, bytes in, bytes out.
///
/// The core performs no retries and no connection management of its
/// own; those concerns belong to implementations of this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_raw(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post_raw(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        (**self).post_raw(body).await
    }
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &ExtXmlConfig) -> Result<Self, ExtXmlError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(TransportError::from)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_raw(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/xml; charset=iso8859-1")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Location search client for an ExtXML endpoint.
///
/// All conversion work is pure; the only state here is the transport
/// and the configuration, so one client may serve concurrent calls.
#[derive(Debug, Clone)]
pub struct ExtXmlClient<T> {
    transport: T,
    config: ExtXmlConfig,
}

impl ExtXmlClient<HttpTransport> {
    /// Create a client speaking HTTP to the configured endpoint.
    pub fn new(config: ExtXmlConfig) -> Result<Self, ExtXmlError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { transport, config })
    }
}

impl<T: Transport> ExtXmlClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(config: ExtXmlConfig, transport: T) -> Self {
        Self { transport, config }
    }

    /// The current instant in the endpoint's zone, suitable as the
    /// reference for wire time decoding.
    pub fn reference_now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.config.timezone)
    }

    /// Run a batch of location queries.
    ///
    /// Results come back as one list per query, in request order,
    /// whatever order the server answered in.
    pub async fn search_batch(
        &self,
        queries: &[SearchQuery],
    ) -> Result<Vec<Vec<Place>>, ExtXmlError> {
        let body = request::build_location_search(queries, &self.config.access_token)?;
        let raw = self.transport.post_raw(body).await?;

        let document = Element::parse(&xml::decode_latin1(&raw))?;
        let envelope = response::parse_response(&document)?;
        debug!(
            queries = queries.len(),
            items = envelope.items().len(),
            "location search answered"
        );
        response::collate_location_results(envelope)
    }

    /// Search for stations matching `text`.
    pub async fn search_stations(&self, text: &str) -> Result<Vec<Place>, ExtXmlError> {
        self.search_one(text, LocationKind::Station).await
    }

    /// Search for addresses matching `text`.
    pub async fn search_addresses(&self, text: &str) -> Result<Vec<Place>, ExtXmlError> {
        self.search_one(text, LocationKind::Address).await
    }

    /// Search for points of interest matching `text`.
    pub async fn search_pois(&self, text: &str) -> Result<Vec<Place>, ExtXmlError> {
        self.search_one(text, LocationKind::Poi).await
    }

    /// Search across every location kind the server knows.
    pub async fn search_any(&self, text: &str) -> Result<Vec<Place>, ExtXmlError> {
        self.search_one(text, LocationKind::Any).await
    }

    async fn search_one(
        &self,
        text: &str,
        kind: LocationKind,
    ) -> Result<Vec<Place>, ExtXmlError> {
        let queries = [SearchQuery::new(text, kind)];
        self.search_batch(&queries)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ExtXmlError::Protocol("response contained no result for the request".to_string())
            })
    }
}
