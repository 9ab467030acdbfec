//! One workflow session: submit a link, pick a format, prepare the download.
//!
//! The session is a tagged union, so a download can only be requested once an
//! analysis result and a format exist. While `submit` or `download` is
//! pending the workflow is mutably borrowed and no other transition can run.

use crate::media::{
    validate_url, DownloadRequest, DownloadTicket, ErrorCode, MediaClient, MediaError,
    MediaFormat, MediaInfo,
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    AnalysisFailed {
        url: String,
        error: MediaError,
    },
    ResultReady {
        media: MediaInfo,
    },
    FormatChosen {
        media: MediaInfo,
        format: MediaFormat,
    },
    DownloadReady {
        media: MediaInfo,
        format: MediaFormat,
        ticket: DownloadTicket,
    },
    DownloadFailed {
        media: MediaInfo,
        format: MediaFormat,
        error: MediaError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("No analysis result yet. Analyze a link first")]
    NoResult,
    #[error("Format '{0}' is not available for this media")]
    UnknownFormat(String),
    #[error("Please select a format first")]
    NoFormatChosen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-facing outcome of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    fn success(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description,
        }
    }

    fn error(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description,
        }
    }
}

pub struct Workflow<'a> {
    client: &'a MediaClient,
    state: WorkflowState,
}

impl<'a> Workflow<'a> {
    pub fn new(client: &'a MediaClient) -> Self {
        Self {
            client,
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn media(&self) -> Option<&MediaInfo> {
        match &self.state {
            WorkflowState::ResultReady { media }
            | WorkflowState::FormatChosen { media, .. }
            | WorkflowState::DownloadReady { media, .. }
            | WorkflowState::DownloadFailed { media, .. } => Some(media),
            WorkflowState::Idle | WorkflowState::AnalysisFailed { .. } => None,
        }
    }

    pub fn selected_format(&self) -> Option<&MediaFormat> {
        match &self.state {
            WorkflowState::FormatChosen { format, .. }
            | WorkflowState::DownloadReady { format, .. }
            | WorkflowState::DownloadFailed { format, .. } => Some(format),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&MediaError> {
        match &self.state {
            WorkflowState::AnalysisFailed { error, .. }
            | WorkflowState::DownloadFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn service_available(&self) -> bool {
        self.client.is_connected()
    }

    pub fn download_enabled(&self) -> bool {
        self.service_available() && self.selected_format().is_some()
    }

    /// `{title}.{format}` for the chosen rendition.
    pub fn suggested_filename(&self) -> Option<String> {
        let media = self.media()?;
        let format = self.selected_format()?;
        Some(format!("{}.{}", media.title, format.format))
    }

    /// Validates `input` and, if it passes, analyzes it. Any previous session
    /// is discarded.
    pub async fn submit(&mut self, input: &str) -> Notice {
        self.state = WorkflowState::Idle;

        if let Err(invalid) = validate_url(input) {
            debug!("Not submitting {:?}: {}", input, invalid);
            let error = MediaError::new(ErrorCode::InvalidUrl, invalid.to_string());
            let notice = Notice::error(error.message.clone(), None);
            self.state = WorkflowState::AnalysisFailed {
                url: input.to_string(),
                error,
            };
            return notice;
        }

        match self.client.analyze(input).await {
            Ok(media) => {
                info!(
                    "Analysis ready: {} ({} formats)",
                    media.title,
                    media.formats.len()
                );
                self.state = WorkflowState::ResultReady { media };
                Notice::success("Media analyzed successfully!", None)
            }
            Err(error) => {
                warn!("Analysis failed [{}]: {}", error.code, error.message);
                let notice = if error.code == ErrorCode::BackendUnreachable {
                    Notice::error(
                        "Backend service not available",
                        Some("Media analysis requires backend infrastructure.".to_string()),
                    )
                } else {
                    Notice::error(error.message.clone(), error.details.clone())
                };
                self.state = WorkflowState::AnalysisFailed {
                    url: input.to_string(),
                    error,
                };
                notice
            }
        }
    }

    pub fn choose_format(&mut self, format_id: &str) -> Result<(), TransitionError> {
        let media = self.media().ok_or(TransitionError::NoResult)?;
        let format = media
            .find_format(format_id)
            .ok_or_else(|| TransitionError::UnknownFormat(format_id.to_string()))?
            .clone();
        let media = media.clone();

        debug!("Format chosen: {} ({})", format.id, format.quality);
        self.state = WorkflowState::FormatChosen { media, format };
        Ok(())
    }

    /// Prepares the chosen format for download. Retrying after a failure or
    /// re-requesting a ready download is allowed.
    pub async fn download(&mut self) -> Result<Notice, TransitionError> {
        let (media, format) = match &self.state {
            WorkflowState::FormatChosen { media, format }
            | WorkflowState::DownloadReady { media, format, .. }
            | WorkflowState::DownloadFailed { media, format, .. } => {
                (media.clone(), format.clone())
            }
            WorkflowState::ResultReady { .. } => return Err(TransitionError::NoFormatChosen),
            WorkflowState::Idle | WorkflowState::AnalysisFailed { .. } => {
                return Err(TransitionError::NoResult)
            }
        };

        let request = DownloadRequest::new(&media, &format);
        match self.client.prepare_download(&request).await {
            Ok(ticket) => {
                let notice = Notice::success(
                    "Download started!",
                    Some(format!("{} - {}", media.title, format.quality)),
                );
                self.state = WorkflowState::DownloadReady {
                    media,
                    format,
                    ticket,
                };
                Ok(notice)
            }
            Err(error) => {
                warn!("Download preparation failed [{}]: {}", error.code, error.message);
                let notice = if error.code == ErrorCode::BackendUnreachable {
                    Notice::error(
                        "Download service not available",
                        Some("Backend infrastructure is required for downloads.".to_string()),
                    )
                } else {
                    Notice::error("Download failed", Some(error.message.clone()))
                };
                self.state = WorkflowState::DownloadFailed {
                    media,
                    format,
                    error,
                };
                Ok(notice)
            }
        }
    }

    /// Discards the session ("analyze another link").
    pub fn reset(&mut self) {
        self.state = WorkflowState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::RecordingTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn media_json() -> serde_json::Value {
        json!({
            "id": "m1",
            "url": "https://example.com/video",
            "title": "Sample Clip",
            "thumbnail": "",
            "duration": 75,
            "mediaType": "video",
            "source": "example",
            "formats": [
                {"id": "v720", "format": "mp4", "quality": "720p", "resolution": "1280x720",
                 "fileSize": 1000, "hasVideo": true, "hasAudio": true},
                {"id": "a320", "format": "mp3", "quality": "320kbps", "bitrate": 320,
                 "fileSize": 500, "hasVideo": false, "hasAudio": true}
            ]
        })
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_client() {
        let transport = Arc::new(RecordingTransport::new());
        let client = MediaClient::with_transport(transport.clone(), true);
        let mut workflow = Workflow::new(&client);

        let notice = workflow.submit("not a url").await;

        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(transport.calls(), 0);
        assert_eq!(workflow.error().map(|e| &e.code), Some(&ErrorCode::InvalidUrl));
        assert!(workflow.media().is_none());
    }

    #[tokio::test]
    async fn test_disconnected_service_shows_unavailable_and_disables_download() {
        let transport = Arc::new(RecordingTransport::new());
        let client = MediaClient::with_transport(transport.clone(), false);
        let mut workflow = Workflow::new(&client);

        let notice = workflow.submit("https://example.com/video").await;

        assert_eq!(notice.title, "Backend service not available");
        assert_eq!(
            workflow.error().map(|e| &e.code),
            Some(&ErrorCode::BackendUnreachable)
        );
        assert!(!workflow.service_available());
        assert!(!workflow.download_enabled());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_full_session() {
        let transport = Arc::new(
            RecordingTransport::new()
                .reply(200, media_json())
                .reply(200, json!({"success": true, "downloadUrl": "https://cdn.example.com/x"})),
        );
        let client = MediaClient::with_transport(transport.clone(), true);
        let mut workflow = Workflow::new(&client);

        let notice = workflow.submit("https://example.com/video").await;
        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(matches!(workflow.state(), WorkflowState::ResultReady { .. }));
        assert!(!workflow.download_enabled());

        workflow.choose_format("a320").unwrap();
        assert!(workflow.download_enabled());
        assert_eq!(workflow.suggested_filename().as_deref(), Some("Sample Clip.mp3"));

        let notice = workflow.download().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.description.as_deref(), Some("Sample Clip - 320kbps"));
        match workflow.state() {
            WorkflowState::DownloadReady { ticket, format, .. } => {
                assert_eq!(ticket.download_url, "https://cdn.example.com/x");
                assert_eq!(format.id, "a320");
            }
            other => panic!("unexpected state {other:?}"),
        }

        let requests = transport.requests();
        assert_eq!(requests[1].1, json!({"mediaId": "m1", "formatId": "a320"}));
    }

    #[tokio::test]
    async fn test_download_before_format_is_rejected() {
        let transport = Arc::new(RecordingTransport::new().reply(200, media_json()));
        let client = MediaClient::with_transport(transport.clone(), true);
        let mut workflow = Workflow::new(&client);

        assert_eq!(workflow.download().await, Err(TransitionError::NoResult));

        workflow.submit("https://example.com/video").await;
        let before = workflow.state().clone();
        assert_eq!(workflow.download().await, Err(TransitionError::NoFormatChosen));
        assert_eq!(workflow.state(), &before);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_format_keeps_state() {
        let transport = Arc::new(RecordingTransport::new().reply(200, media_json()));
        let client = MediaClient::with_transport(transport, true);
        let mut workflow = Workflow::new(&client);
        workflow.submit("https://example.com/video").await;

        assert_eq!(
            workflow.choose_format("v4k"),
            Err(TransitionError::UnknownFormat("v4k".into()))
        );
        assert!(matches!(workflow.state(), WorkflowState::ResultReady { .. }));
        assert_eq!(workflow.choose_format("v720"), Ok(()));
    }

    #[tokio::test]
    async fn test_failed_download_can_be_retried() {
        let transport = Arc::new(
            RecordingTransport::new()
                .reply(200, media_json())
                .reply(503, json!({"code": "BUSY", "message": "Try later"}))
                .reply(200, json!({"downloadUrl": "https://cdn.example.com/y"})),
        );
        let client = MediaClient::with_transport(transport.clone(), true);
        let mut workflow = Workflow::new(&client);
        workflow.submit("https://example.com/video").await;
        workflow.choose_format("v720").unwrap();

        let notice = workflow.download().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.description.as_deref(), Some("Try later"));
        assert!(matches!(workflow.state(), WorkflowState::DownloadFailed { .. }));

        let notice = workflow.download().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(transport.calls(), 3);
    }

    #[test]
    fn test_choose_format_without_result() {
        let client = MediaClient::with_transport(Arc::new(RecordingTransport::new()), true);
        let mut workflow = Workflow::new(&client);
        assert_eq!(workflow.choose_format("v720"), Err(TransitionError::NoResult));
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let transport = Arc::new(RecordingTransport::new().reply(200, media_json()));
        let client = MediaClient::with_transport(transport, true);
        let mut workflow = Workflow::new(&client);
        workflow.submit("https://example.com/video").await;
        workflow.choose_format("v720").unwrap();

        workflow.reset();

        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(workflow.suggested_filename().is_none());
    }
}
