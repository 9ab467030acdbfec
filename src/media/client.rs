use super::{
    error::{AnalysisError, DownloadError, ErrorCode, MediaError},
    transport::{HttpTransport, Transport, TransportError, TransportResponse},
    types::{DownloadRequest, DownloadTicket, MediaInfo},
    validate::validate_url,
};
use crate::config::ApiConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Analyze,
    PrepareDownload,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Analyze => "analyze",
            Endpoint::PrepareDownload => "download/prepare",
        }
    }

    fn unreachable(self) -> MediaError {
        match self {
            Endpoint::Analyze => MediaError::new(
                ErrorCode::BackendUnreachable,
                "Media analysis service is not available",
            )
            .with_details(
                "The backend service required for media analysis is not connected. \
                 This feature will be available once the backend is set up.",
            ),
            Endpoint::PrepareDownload => MediaError::new(
                ErrorCode::BackendUnreachable,
                "Download service is not available",
            )
            .with_details("The backend service required for downloads is not connected."),
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Endpoint::Analyze => "Failed to analyze media",
            Endpoint::PrepareDownload => "Failed to prepare download",
        }
    }

    fn timeout(self) -> MediaError {
        let details = match self {
            Endpoint::Analyze => "The media analysis took too long. Please try again.",
            Endpoint::PrepareDownload => "Preparing the download took too long. Please try again.",
        };
        MediaError::new(ErrorCode::Timeout, "Request timed out").with_details(details)
    }
}

/// Error body as sent by the service, either flat (`{code, message}`) or
/// nested under `error`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    error: Option<Box<ErrorBody>>,
}

impl ErrorBody {
    fn into_error(self, endpoint: Endpoint) -> MediaError {
        let body = match self.error {
            Some(nested) => *nested,
            None => self,
        };

        MediaError {
            code: body.code.map(ErrorCode::from).unwrap_or(ErrorCode::ApiError),
            message: body
                .message
                .unwrap_or_else(|| endpoint.failure_message().to_string()),
            details: body.details,
        }
    }
}

/// `{success, data?, error?}` wrapper some deployments put around the result.
#[derive(Debug, Deserialize)]
struct AnalyzeEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<MediaInfo>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

fn unexpected(endpoint: Endpoint) -> MediaError {
    MediaError::new(ErrorCode::Unexpected, endpoint.failure_message())
        .with_details("The service returned an unrecognized response.")
}

fn error_from_body(endpoint: Endpoint, body: &[u8]) -> MediaError {
    serde_json::from_slice::<ErrorBody>(body)
        .unwrap_or_default()
        .into_error(endpoint)
}

/// Client for the remote analysis and download-preparation service.
///
/// Both operations are gated by the connectivity flag given at construction
/// and perform at most one request each. Failures are always returned as
/// [`MediaError`] values.
pub struct MediaClient {
    transport: Arc<dyn Transport>,
    connected: bool,
}

impl MediaClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.base_url, config.timeout())
            .with_context(|| format!("Failed to build HTTP client for {}", config.base_url))?;

        info!(
            "Media client initialized - endpoint {}, connected: {}",
            config.base_url, config.connected
        );

        Ok(Self::with_transport(Arc::new(transport), config.connected))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, connected: bool) -> Self {
        Self {
            transport,
            connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub async fn analyze(&self, url: &str) -> Result<MediaInfo, AnalysisError> {
        if let Err(invalid) = validate_url(url) {
            debug!("Rejected URL {:?}: {}", url, invalid);
            return Err(MediaError::new(ErrorCode::InvalidUrl, invalid.to_string()));
        }

        let endpoint = Endpoint::Analyze;
        if !self.connected {
            return Err(endpoint.unreachable());
        }

        info!("Analyzing media: {}", url.trim());
        let response = self
            .send(endpoint, json!({ "url": url.trim() }))
            .await?;

        let value: Value = serde_json::from_slice(&response.body).map_err(|e| {
            warn!("Analysis response is not JSON: {}", e);
            unexpected(endpoint)
        })?;

        if value.get("success").is_none() {
            return serde_json::from_value::<MediaInfo>(value)
                .map(MediaInfo::normalize)
                .map_err(|e| {
                    warn!("Undecodable analysis result: {}", e);
                    unexpected(endpoint)
                });
        }

        let envelope: AnalyzeEnvelope = serde_json::from_value(value).map_err(|e| {
            warn!("Undecodable analysis envelope: {}", e);
            unexpected(endpoint)
        })?;

        match envelope {
            AnalyzeEnvelope {
                success: true,
                data: Some(media),
                ..
            } => Ok(media.normalize()),
            AnalyzeEnvelope {
                success: true,
                data: None,
                ..
            } => {
                warn!("Analysis envelope reported success without media data");
                Err(unexpected(endpoint))
            }
            AnalyzeEnvelope {
                error: Some(body), ..
            } => Err(body.into_error(endpoint)),
            AnalyzeEnvelope { error: None, .. } => Err(MediaError::new(
                ErrorCode::ApiError,
                endpoint.failure_message(),
            )),
        }
    }

    pub async fn prepare_download(
        &self,
        request: &DownloadRequest,
    ) -> Result<DownloadTicket, DownloadError> {
        let endpoint = Endpoint::PrepareDownload;
        if !self.connected {
            return Err(endpoint.unreachable());
        }

        info!(
            "Preparing download of {} in format {}",
            request.media_id, request.format_id
        );
        let body = serde_json::to_value(request).map_err(|e| {
            warn!("Could not encode download request: {}", e);
            unexpected(endpoint)
        })?;
        let response = self.send(endpoint, body).await?;

        let prepared: PrepareResponse = serde_json::from_slice(&response.body).map_err(|e| {
            warn!("Undecodable download response: {}", e);
            unexpected(endpoint)
        })?;

        if prepared.success == Some(false) {
            return Err(error_from_body(endpoint, &response.body));
        }

        match prepared.download_url {
            Some(download_url) => Ok(DownloadTicket {
                download_url,
                expires_at: prepared.expires_at,
            }),
            None => {
                warn!("Download response did not include a download URL");
                Err(unexpected(endpoint))
            }
        }
    }

    /// Performs the single request for `endpoint`, turning transport failures
    /// and non-2xx statuses into errors.
    async fn send(
        &self,
        endpoint: Endpoint,
        body: serde_json::Value,
    ) -> Result<TransportResponse, MediaError> {
        let response = match self.transport.post_json(endpoint.path(), body).await {
            Ok(response) => response,
            Err(TransportError::Timeout(after)) => {
                warn!("{} timed out after {:?}", endpoint.path(), after);
                return Err(endpoint.timeout());
            }
            Err(TransportError::Network(reason)) => {
                warn!("{} failed: {}", endpoint.path(), reason);
                return Err(MediaError::new(
                    ErrorCode::NetworkError,
                    "Unable to connect to the service",
                )
                .with_details("Please check your internet connection and try again."));
            }
        };

        if !response.is_success() {
            let error = error_from_body(endpoint, &response.body);
            warn!(
                "{} returned status {}: {} ({})",
                endpoint.path(),
                response.status,
                error.message,
                error.code
            );
            return Err(error);
        }

        Ok(response)
    }
}
