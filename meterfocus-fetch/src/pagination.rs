//! Offset pagination over the SC list and query endpoints.
//!
//! [`PaginatedFetcher::fetch_all`] walks an endpoint page by page until the
//! server-reported total is reached or a page comes back empty. A rejected
//! token (HTTP 401 or the login page served in place of JSON) triggers one
//! invalidate/re-authenticate/retry of the same page; a second rejection is
//! fatal.

use meterfocus_core::PageEnvelope;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::auth::Reauthenticate;
use crate::error::{truncate_body, FetchError};
use crate::host::{HttpClient, HttpResponse, PageCall};
use crate::session::TokenSession;
use crate::settings::SourceSettings;

// ============================================================================
// Page Request
// ============================================================================

/// Describes how to request one page of an endpoint.
pub trait PageRequest: Send + Sync {
    /// Envelope the page body deserializes into.
    type Envelope: PageEnvelope + DeserializeOwned;

    /// Label used in logs.
    fn name(&self) -> &'static str;

    /// Requested page size, if the caller fixed one.
    fn page_size(&self) -> Option<u32>;

    /// Builds the call for the page starting at `offset`.
    fn page_call(&self, settings: &SourceSettings, offset: u64) -> Result<PageCall, FetchError>;
}

/// Item type produced by a [`PageRequest`].
pub type ItemOf<R> = <<R as PageRequest>::Envelope as PageEnvelope>::Item;

// ============================================================================
// Login Redirect Detection
// ============================================================================

/// Returns true if a body is the upstream's login page rather than JSON.
///
/// This is specific to the ManageOne gateway, which answers a stale token
/// with a 200 carrying its HTML login form instead of a 401.
pub fn is_login_redirect(body: &str, marker: &str) -> bool {
    body.trim_start().starts_with('<') || (!marker.is_empty() && body.contains(marker))
}

// ============================================================================
// Paginated Fetcher
// ============================================================================

/// Fetches every page of an endpoint for one request chain.
pub struct PaginatedFetcher<'a, A: Reauthenticate + ?Sized> {
    http: &'a HttpClient,
    settings: &'a SourceSettings,
    auth: &'a A,
}

impl<'a, A: Reauthenticate + ?Sized> PaginatedFetcher<'a, A> {
    /// Creates a fetcher.
    pub fn new(http: &'a HttpClient, settings: &'a SourceSettings, auth: &'a A) -> Self {
        Self {
            http,
            settings,
            auth,
        }
    }

    /// Fetches all pages.
    pub async fn fetch_all<R: PageRequest>(
        &self,
        session: &mut TokenSession,
        request: &R,
    ) -> Result<Vec<ItemOf<R>>, FetchError> {
        self.fetch_all_with_cancel(session, request, &CancellationToken::new())
            .await
    }

    /// Fetches all pages, stopping with [`FetchError::Cancelled`] as soon as
    /// `cancel` fires. Partially accumulated items are discarded.
    #[instrument(skip_all, fields(endpoint = request.name()))]
    pub async fn fetch_all_with_cancel<R: PageRequest>(
        &self,
        session: &mut TokenSession,
        request: &R,
        cancel: &CancellationToken,
    ) -> Result<Vec<ItemOf<R>>, FetchError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Fetch cancelled");
                Err(FetchError::Cancelled)
            }
            result = self.run(session, request) => result,
        }
    }

    async fn run<R: PageRequest>(
        &self,
        session: &mut TokenSession,
        request: &R,
    ) -> Result<Vec<ItemOf<R>>, FetchError> {
        if !session.is_valid() {
            self.auth.authenticate(session).await?;
        }

        let mut items = Vec::new();
        let mut offset: u64 = 0;
        let mut total: u64 = 0;

        loop {
            let call = request.page_call(self.settings, offset)?;
            info!(
                url = %call.url,
                start = offset,
                limit = ?request.page_size(),
                "Fetching page"
            );

            let response = self.send_page(session, &call).await?;

            let body = response.body.trim();
            if body.is_empty() || body == "null" {
                warn!(start = offset, "Empty response body; treating as no more results");
                break;
            }

            let envelope: R::Envelope = serde_json::from_str(body)
                .map_err(|e| FetchError::unparsable(call.endpoint(), &e, body))?;
            let page = envelope.into_page();
            let returned = page.len();
            total = page.total;
            items.extend(page.items);

            debug!(returned, accumulated = items.len(), total, "Page received");

            if returned == 0 || items.len() as u64 >= total {
                break;
            }

            offset += match request.page_size() {
                Some(size) => u64::from(size),
                None => returned as u64,
            };
        }

        info!(record_count = items.len(), total, "Fetch complete");
        Ok(items)
    }

    /// Sends one page call, re-authenticating once if the token is rejected.
    async fn send_page(
        &self,
        session: &mut TokenSession,
        call: &PageCall,
    ) -> Result<HttpResponse, FetchError> {
        let mut response = self.send(session, call).await?;

        if self.token_rejected(&response) {
            warn!(
                status = %response.status,
                endpoint = call.endpoint(),
                "Token rejected; re-authenticating"
            );
            session.invalidate();
            self.auth.authenticate(session).await?;

            response = self.send(session, call).await?;
            if self.token_rejected(&response) {
                session.invalidate();
                return Err(FetchError::auth_with_body(
                    "Token not accepted after re-authentication",
                    &response.body,
                ));
            }
        }

        if !response.status.is_success() {
            warn!(
                status = %response.status,
                body = %truncate_body(&response.body),
                "Unexpected status"
            );
            return Err(FetchError::unexpected_status(
                call.endpoint(),
                response.status.as_u16(),
                &response.body,
            ));
        }

        Ok(response)
    }

    async fn send(
        &self,
        session: &TokenSession,
        call: &PageCall,
    ) -> Result<HttpResponse, FetchError> {
        let token = session.current_token()?;
        self.http
            .send(call, &self.settings.auth_token_header, token.value())
            .await
    }

    fn token_rejected(&self, response: &HttpResponse) -> bool {
        response.status == StatusCode::UNAUTHORIZED
            || is_login_redirect(&response.body, &self.settings.login_redirect_marker)
    }
}

// ============================================================================
// Tests
// ============================================================================
