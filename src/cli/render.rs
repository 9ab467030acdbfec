use crate::media::{FormatFilter, MediaError, MediaFormat, MediaInfo};
use crate::utils::format_number;
use crate::workflow::{Notice, NoticeLevel};
use std::fmt::Write;

pub fn notice(notice: &Notice) -> String {
    let icon = match notice.level {
        NoticeLevel::Success => "✅",
        NoticeLevel::Error => "❌",
    };
    match &notice.description {
        Some(description) => format!("{icon} {}\n   {description}", notice.title),
        None => format!("{icon} {}", notice.title),
    }
}

pub fn error_panel(error: &MediaError) -> String {
    let mut out = format!("[!] {}", error.message);
    if let Some(details) = &error.details {
        let _ = write!(out, "\n    {details}");
    }
    if error.code.is_retryable() {
        let _ = write!(out, "\n    You can try again.");
    }
    let _ = write!(out, "\n    (code: {})", error.code);
    out
}

pub fn unavailable_panel() -> String {
    "[!] Backend Setup Required\n    \
     Media analysis and download features require a backend service.\n    \
     Set `connected = true` under [api] once the service is reachable."
        .to_string()
}

pub fn preview(media: &MediaInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", media.title);
    let _ = writeln!(
        out,
        "  {} · {}",
        media.media_type.as_str().to_uppercase(),
        media.duration_formatted
    );

    let mut meta = vec![media.source.clone()];
    if let Some(date) = &media.upload_date {
        meta.push(date.clone());
    }
    if let Some(views) = media.view_count {
        meta.push(format!("{} views", format_number(views)));
    }
    meta.retain(|m| !m.is_empty());
    if !meta.is_empty() {
        let _ = writeln!(out, "  {}", meta.join(" · "));
    }

    if let Some(description) = &media.description {
        let _ = writeln!(out, "  {description}");
    }
    if media.preview_url.is_some() {
        let _ = writeln!(out, "  (preview available)");
    }
    out.trim_end().to_string()
}

pub fn format_list(
    formats: &[&MediaFormat],
    filter: FormatFilter,
    selected: Option<&str>,
) -> String {
    if formats.is_empty() {
        return match filter {
            FormatFilter::All => "No formats available".to_string(),
            other => format!("No {} formats available", other.label()),
        };
    }

    let mut out = String::new();
    for format in formats {
        let marker = if selected == Some(format.id.as_str()) {
            "[x]"
        } else {
            "[ ]"
        };
        let mut line = format!(
            "{marker} {} {}",
            format.format.to_uppercase(),
            format.quality
        );
        if let Some(resolution) = &format.resolution {
            let _ = write!(line, " {resolution}");
        }
        if let Some(codec) = &format.codec {
            let _ = write!(line, " • {codec}");
        }
        let _ = writeln!(
            out,
            "  {line:<40} {:>10}  (id: {})",
            format.file_size_formatted, format.id
        );
    }
    out.trim_end().to_string()
}

pub fn download_summary(format: &MediaFormat) -> String {
    let mut out = format!(
        "Download Summary\n  Format: {}\n  Quality: {}",
        format.format.to_uppercase(),
        format.quality
    );
    if let Some(resolution) = &format.resolution {
        let _ = write!(out, "\n  Resolution: {resolution}");
    }
    let _ = write!(out, "\n  Size: {}", format.file_size_formatted);
    out
}
