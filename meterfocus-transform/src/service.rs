//! Transform orchestration.
//!
//! Authenticate if needed, fetch every metering page for the query, map the
//! records for the caller's account context, and wrap them in an envelope.

use meterfocus_core::{AccountContext, MetricsQuery, RecordMapper, TransformEnvelope};
use meterfocus_fetch::{FetchError, SharedTokenSession, SourceClient, TokenSession};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::error::TransformError;
use crate::mapper::{FocusMapper, MapperSettings};

/// Runs metering → FOCUS transforms against one upstream.
#[derive(Debug, Clone)]
pub struct TransformService {
    client: SourceClient,
    settings: MapperSettings,
}

impl TransformService {
    /// Creates a service with default mapper settings.
    pub fn new(client: SourceClient) -> Self {
        Self::with_settings(client, MapperSettings::default())
    }

    /// Creates a service with explicit mapper settings.
    pub fn with_settings(client: SourceClient, settings: MapperSettings) -> Self {
        Self { client, settings }
    }

    /// The underlying source client.
    pub fn client(&self) -> &SourceClient {
        &self.client
    }

    /// Fetches and transforms every record matching `query`.
    pub async fn transform(
        &self,
        session: &mut TokenSession,
        query: &MetricsQuery,
        context: AccountContext,
    ) -> Result<TransformEnvelope, TransformError> {
        self.transform_with_cancel(session, query, context, &CancellationToken::new())
            .await
    }

    /// As [`transform`](Self::transform), abandoning the run when `cancel`
    /// fires. No partial result is returned.
    #[instrument(
        skip(self, session, context, cancel),
        fields(region = %query.region_code, domain = %query.domain_id, period = %query.period)
    )]
    pub async fn transform_with_cancel(
        &self,
        session: &mut TokenSession,
        query: &MetricsQuery,
        context: AccountContext,
        cancel: &CancellationToken,
    ) -> Result<TransformEnvelope, TransformError> {
        info!(
            start_time = %query.start_time,
            end_time = %query.end_time,
            resource_type = query.resource_type_code.as_deref().unwrap_or(""),
            "Starting transform"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FetchError::Cancelled.into()),
            result = self.client.ensure_authenticated(session) => result?,
        }

        let raw = self
            .client
            .fetch_metrics_with_cancel(session, query, cancel)
            .await?;

        let mapper = FocusMapper::with_settings(context, self.settings.clone());
        let records = mapper.map_many(&raw)?;

        info!(
            fetched = raw.len(),
            transformed = records.len(),
            "Transform complete"
        );
        Ok(TransformEnvelope::ok(records, query.metadata()))
    }

    /// Runs a transform on a session shared with other request chains.
    ///
    /// The session lock is held for the whole run.
    pub async fn transform_shared(
        &self,
        session: &SharedTokenSession,
        query: &MetricsQuery,
        context: AccountContext,
        cancel: &CancellationToken,
    ) -> Result<TransformEnvelope, TransformError> {
        let mut guard = session.lock().await;
        self.transform_with_cancel(&mut guard, query, context, cancel)
            .await
    }
}
