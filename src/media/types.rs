use crate::utils::{format_duration, format_file_size};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

/// JSON numbers may arrive as floats (`1536.0`); counts are rounded and
/// clamped at zero.
fn number_to_u64(number: Number) -> u64 {
    match number.as_u64() {
        Some(n) => n,
        None => number
            .as_f64()
            .filter(|n| n.is_finite() && *n > 0.0)
            .map(|n| n.round() as u64)
            .unwrap_or(0),
    }
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Number>::deserialize(deserializer)?
        .map(number_to_u64)
        .unwrap_or(0))
}

fn deserialize_optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Number>::deserialize(deserializer)?.map(number_to_u64))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
    Image,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Image => "image",
        }
    }
}

/// One downloadable rendition of a media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    pub id: String,
    /// Container, e.g. `mp4`, `webm`, `mp3`.
    pub format: String,
    /// Display label, e.g. `1080p` or `320kbps`.
    pub quality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub file_size: u64,
    #[serde(default)]
    pub file_size_formatted: String,
    #[serde(default)]
    pub has_video: bool,
    #[serde(default)]
    pub has_audio: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    /// kbps; services often report fractional averages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<f64>,
}

impl MediaFormat {
    pub fn is_meaningful(&self) -> bool {
        self.has_video || self.has_audio
    }

    fn fill_defaults(&mut self) {
        if self.file_size_formatted.is_empty() {
            self.file_size_formatted = format_file_size(self.file_size);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: String,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub duration_formatted: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub formats: Vec<MediaFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub view_count: Option<u64>,
}

impl MediaInfo {
    pub fn find_format(&self, format_id: &str) -> Option<&MediaFormat> {
        self.formats.iter().find(|f| f.id == format_id)
    }

    /// Clamps the duration and fills display strings the service left out.
    pub(crate) fn normalize(mut self) -> Self {
        if !self.duration.is_finite() || self.duration < 0.0 {
            self.duration = 0.0;
        }
        if self.duration_formatted.is_empty() {
            self.duration_formatted = format_duration(self.duration);
        }
        for format in &mut self.formats {
            format.fill_defaults();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub media_id: String,
    pub format_id: String,
}

impl DownloadRequest {
    pub fn new(media: &MediaInfo, format: &MediaFormat) -> Self {
        Self {
            media_id: media.id.clone(),
            format_id: format.id.clone(),
        }
    }
}

/// A time-limited URL the host environment fetches the file from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTicket {
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_info_from_camel_case_json() {
        let json = r#"{
            "id": "abc",
            "url": "https://example.com/video",
            "title": "Clip",
            "thumbnail": "https://example.com/t.jpg",
            "duration": 75,
            "mediaType": "video",
            "source": "example",
            "viewCount": 1200,
            "formats": [
                {"id": "f1", "format": "mp4", "quality": "720p", "resolution": "1280x720",
                 "fileSize": 1536, "hasVideo": true, "hasAudio": true}
            ]
        }"#;

        let media: MediaInfo = serde_json::from_str(json).unwrap();
        let media = media.normalize();

        assert_eq!(media.media_type, MediaType::Video);
        assert_eq!(media.duration_formatted, "1:15");
        assert_eq!(media.view_count, Some(1200));
        assert_eq!(media.formats[0].file_size_formatted, "1.5 KB");
        assert!(media.find_format("f1").is_some());
        assert!(media.find_format("nope").is_none());
    }

    #[test]
    fn test_fractional_numbers_are_accepted() {
        let format: MediaFormat = serde_json::from_str(
            r#"{"id": "a", "format": "m4a", "quality": "129k", "fileSize": 1536.0,
                "bitrate": 129.472, "hasAudio": true}"#,
        )
        .unwrap();
        assert_eq!(format.file_size, 1536);
        assert_eq!(format.bitrate, Some(129.472));

        let media: MediaInfo = serde_json::from_str(
            r#"{"id": "x", "url": "https://example.com", "title": "t", "mediaType": "audio",
                "viewCount": 1200.6, "formats": [{"id": "f", "format": "mp3", "quality": "q",
                "fileSize": null, "hasAudio": true}]}"#,
        )
        .unwrap();
        assert_eq!(media.view_count, Some(1201));
        assert_eq!(media.formats[0].file_size, 0);
    }

    #[test]
    fn test_normalize_clamps_negative_duration() {
        let media = MediaInfo {
            id: "x".into(),
            url: "https://example.com".into(),
            title: "t".into(),
            description: None,
            thumbnail: String::new(),
            duration: -3.0,
            duration_formatted: String::new(),
            media_type: MediaType::Audio,
            formats: Vec::new(),
            preview_url: None,
            source: String::new(),
            upload_date: None,
            view_count: None,
        }
        .normalize();

        assert_eq!(media.duration, 0.0);
        assert_eq!(media.duration_formatted, "0:00");
    }

    #[test]
    fn test_download_request_serializes_camel_case() {
        let request = DownloadRequest {
            media_id: "m1".into(),
            format_id: "f1".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["mediaId"], "m1");
        assert_eq!(value["formatId"], "f1");
    }

    #[test]
    fn test_format_is_meaningful() {
        let mut format: MediaFormat = serde_json::from_str(
            r#"{"id": "a", "format": "mp3", "quality": "320kbps", "hasAudio": true}"#,
        )
        .unwrap();
        assert!(format.is_meaningful());
        format.has_audio = false;
        assert!(!format.is_meaningful());
    }
}
