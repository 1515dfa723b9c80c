//! Client for the SC northbound API.

use meterfocus_core::{MetricsQuery, RawMetricRecord, Region, Vdc, VdcQuery};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::auth::{Authenticator, Reauthenticate};
use crate::endpoints::{MetricsRequest, RegionsRequest, VdcsRequest};
use crate::error::FetchError;
use crate::host::HttpClient;
use crate::pagination::PaginatedFetcher;
use crate::session::{Token, TokenSession};
use crate::settings::{Credentials, SourceSettings};

// ============================================================================
// Source Client
// ============================================================================

/// Authenticated, paginating client for the SC northbound API.
///
/// The client holds no token; every call takes the caller's
/// [`TokenSession`], so independent request chains stay isolated.
#[derive(Debug, Clone)]
pub struct SourceClient {
    http: HttpClient,
    settings: SourceSettings,
    authenticator: Authenticator,
}

impl SourceClient {
    /// Creates a client from settings and credentials.
    ///
    /// The identity host is always allowed, whether or not the settings
    /// name it.
    pub fn new(settings: SourceSettings, credentials: Credentials) -> Result<Self, FetchError> {
        let mut hosts = settings.allowed_hosts.clone();
        if let Some(host) = credentials.identity_url.host_str() {
            if !hosts.iter().any(|h| h == host) {
                hosts.push(host.to_string());
            }
        }
        let http = HttpClient::with_timeout(settings.timeout, settings.accept_invalid_certs)?
            .allow_hosts(hosts);
        Ok(Self::with_http(http, settings, credentials))
    }

    /// Creates a client around an existing HTTP client.
    pub fn with_http(http: HttpClient, settings: SourceSettings, credentials: Credentials) -> Self {
        let authenticator =
            Authenticator::new(http.clone(), credentials, settings.subject_token_header.clone());
        Self {
            http,
            settings,
            authenticator,
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// Creates an empty session using the configured refresh buffer.
    pub fn new_session(&self) -> TokenSession {
        TokenSession::with_refresh_buffer(self.settings.refresh_buffer)
    }

    /// Authenticates and stores the token into `session`.
    pub async fn authenticate(&self, session: &mut TokenSession) -> Result<Token, FetchError> {
        self.authenticator.authenticate(session).await
    }

    /// Authenticates only if the session has no valid token.
    pub async fn ensure_authenticated(&self, session: &mut TokenSession) -> Result<(), FetchError> {
        if !session.is_valid() {
            self.authenticate(session).await?;
        }
        Ok(())
    }

    /// Fetches all regions.
    pub async fn fetch_regions(&self, session: &mut TokenSession) -> Result<Vec<Region>, FetchError> {
        self.fetch_regions_with_cancel(session, &CancellationToken::new())
            .await
    }

    /// Fetches all regions, abandoning the fetch when `cancel` fires.
    #[instrument(skip(self, session, cancel))]
    pub async fn fetch_regions_with_cancel(
        &self,
        session: &mut TokenSession,
        cancel: &CancellationToken,
    ) -> Result<Vec<Region>, FetchError> {
        self.fetcher()
            .fetch_all_with_cancel(session, &RegionsRequest::default(), cancel)
            .await
    }

    /// Fetches all VDCs matching `query`.
    pub async fn fetch_vdcs(
        &self,
        session: &mut TokenSession,
        query: &VdcQuery,
    ) -> Result<Vec<Vdc>, FetchError> {
        self.fetch_vdcs_with_cancel(session, query, &CancellationToken::new())
            .await
    }

    /// Fetches all VDCs, abandoning the fetch when `cancel` fires.
    #[instrument(skip(self, session, cancel))]
    pub async fn fetch_vdcs_with_cancel(
        &self,
        session: &mut TokenSession,
        query: &VdcQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vdc>, FetchError> {
        let request = VdcsRequest::new(query.clone())?;
        self.fetcher()
            .fetch_all_with_cancel(session, &request, cancel)
            .await
    }

    /// Fetches all metering records for `query`.
    pub async fn fetch_metrics(
        &self,
        session: &mut TokenSession,
        query: &MetricsQuery,
    ) -> Result<Vec<RawMetricRecord>, FetchError> {
        self.fetch_metrics_with_cancel(session, query, &CancellationToken::new())
            .await
    }

    /// Fetches all metering records, abandoning the fetch when `cancel` fires.
    #[instrument(skip(self, session, cancel), fields(region = %query.region_code, domain = %query.domain_id))]
    pub async fn fetch_metrics_with_cancel(
        &self,
        session: &mut TokenSession,
        query: &MetricsQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawMetricRecord>, FetchError> {
        let request = MetricsRequest::new(query.clone())?;
        self.fetcher()
            .fetch_all_with_cancel(session, &request, cancel)
            .await
    }

    fn fetcher(&self) -> PaginatedFetcher<'_, Authenticator> {
        PaginatedFetcher::new(&self.http, &self.settings, &self.authenticator)
    }
}
