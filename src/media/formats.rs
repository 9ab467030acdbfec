use super::types::MediaFormat;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatFilter {
    #[default]
    All,
    Video,
    Audio,
}

impl FormatFilter {
    pub fn matches(self, format: &MediaFormat) -> bool {
        match self {
            FormatFilter::All => format.is_meaningful(),
            FormatFilter::Video => format.has_video,
            FormatFilter::Audio => !format.has_video && format.has_audio,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormatFilter::All => "all",
            FormatFilter::Video => "video",
            FormatFilter::Audio => "audio",
        }
    }
}

impl FromStr for FormatFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(FormatFilter::All),
            "video" => Ok(FormatFilter::Video),
            "audio" => Ok(FormatFilter::Audio),
            other => Err(format!("unknown format filter '{other}' (expected all, video or audio)")),
        }
    }
}

/// Sort key: vertical resolution for `WxH` formats, otherwise bitrate.
pub fn quality_value(format: &MediaFormat) -> f64 {
    if let Some(resolution) = &format.resolution {
        return resolution
            .split_once('x')
            .and_then(|(_, height)| height.trim().parse::<u32>().ok())
            .map(f64::from)
            .unwrap_or(0.0);
    }
    format
        .bitrate
        .filter(|b| b.is_finite())
        .unwrap_or(0.0)
}

/// Formats passing `filter`, best quality first. Formats carrying neither
/// audio nor video are never listed.
pub fn select_formats(formats: &[MediaFormat], filter: FormatFilter) -> Vec<&MediaFormat> {
    let mut selected: Vec<&MediaFormat> = formats.iter().filter(|f| filter.matches(f)).collect();
    selected.sort_by(|a, b| quality_value(b).total_cmp(&quality_value(a)));
    selected
}

/// Filters that would show at least one format. `All` is always offered.
pub fn available_filters(formats: &[MediaFormat]) -> Vec<FormatFilter> {
    let mut filters = vec![FormatFilter::All];
    for filter in [FormatFilter::Video, FormatFilter::Audio] {
        if formats.iter().any(|f| filter.matches(f)) {
            filters.push(filter);
        }
    }
    filters
}
