mod render;

use crate::{
    config::Config,
    fetch::save_download,
    media::{available_filters, select_formats, validate_url, FormatFilter, MediaClient},
    workflow::{TransitionError, Workflow, WorkflowState},
};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Runs only the URL validator.
pub fn check(out: &mut impl Write, url: &str) -> Result<bool> {
    match validate_url(url) {
        Ok(parsed) => {
            writeln!(out, "✅ Valid URL: {parsed}")?;
            Ok(true)
        }
        Err(invalid) => {
            writeln!(out, "❌ {invalid}")?;
            Ok(false)
        }
    }
}

pub fn status(out: &mut impl Write, config: &Config, client: &MediaClient) -> Result<()> {
    writeln!(out, "Service endpoint: {}", config.api.base_url)?;
    writeln!(out, "Request timeout:  {}s", config.api.timeout_secs)?;
    if client.is_connected() {
        writeln!(out, "Status:           connected")?;
    } else {
        writeln!(out, "Status:           not connected")?;
        writeln!(out)?;
        writeln!(out, "{}", render::unavailable_panel())?;
    }
    Ok(())
}

/// Analyzes `url` and prints the preview plus the formats passing `filter`.
pub async fn analyze(
    out: &mut impl Write,
    client: &MediaClient,
    url: &str,
    filter: FormatFilter,
) -> Result<bool> {
    let mut workflow = Workflow::new(client);
    let notice = workflow.submit(url).await;
    writeln!(out, "{}", render::notice(&notice))?;

    let ok = print_session(out, &workflow, filter)?;
    if !workflow.service_available() {
        writeln!(out)?;
        writeln!(out, "{}", render::unavailable_panel())?;
    }
    Ok(ok)
}

/// Runs the whole session: analyze, choose `format_id`, prepare, save.
pub async fn download(
    out: &mut impl Write,
    config: &Config,
    client: &MediaClient,
    url: &str,
    format_id: &str,
    output_dir: &Path,
) -> Result<bool> {
    let mut workflow = Workflow::new(client);
    let notice = workflow.submit(url).await;
    writeln!(out, "{}", render::notice(&notice))?;

    if let WorkflowState::AnalysisFailed { url, error } = workflow.state() {
        info!("Analysis of {:?} ended with {}", url, error.code);
        writeln!(out, "{}", render::error_panel(error))?;
        if !workflow.service_available() {
            writeln!(out)?;
            writeln!(out, "{}", render::unavailable_panel())?;
        }
        return Ok(false);
    }

    if let Err(e) = workflow.choose_format(format_id) {
        return reject_format(out, &mut workflow, &e);
    }

    if let Some(format) = workflow.selected_format() {
        writeln!(out)?;
        writeln!(out, "{}", render::download_summary(format))?;
    }

    if !workflow.download_enabled() {
        writeln!(out, "{}", render::unavailable_panel())?;
        return Ok(false);
    }

    let notice = workflow.download().await?;
    writeln!(out, "{}", render::notice(&notice))?;

    let (ticket, filename) = match (workflow.state(), workflow.suggested_filename()) {
        (WorkflowState::DownloadReady { ticket, .. }, Some(filename)) => (ticket, filename),
        (WorkflowState::DownloadFailed { error, .. }, _) => {
            writeln!(out, "{}", render::error_panel(error))?;
            return Ok(false);
        }
        _ => return Ok(false),
    };

    if let Some(expires_at) = &ticket.expires_at {
        info!("Download link expires at {}", expires_at);
    }

    let http = reqwest::Client::builder()
        .connect_timeout(config.api.timeout())
        .build()
        .context("Failed to build download client")?;
    let path = save_download(&http, &ticket.download_url, &filename, output_dir).await?;
    writeln!(out, "Saved to {}", path.display())?;

    Ok(true)
}

/// Lists what the analyzed media does offer, then drops the session so the
/// next link starts clean.
fn reject_format(
    out: &mut impl Write,
    workflow: &mut Workflow<'_>,
    error: &TransitionError,
) -> Result<bool> {
    writeln!(out, "❌ {error}")?;
    print_session(out, workflow, FormatFilter::All)?;
    workflow.reset();
    info!("Session discarded after {}", error);
    Ok(false)
}

fn print_session(
    out: &mut impl Write,
    workflow: &Workflow<'_>,
    filter: FormatFilter,
) -> Result<bool> {
    if let Some(error) = workflow.error() {
        writeln!(out, "{}", render::error_panel(error))?;
        return Ok(false);
    }

    let Some(media) = workflow.media() else {
        return Ok(false);
    };

    writeln!(out)?;
    writeln!(out, "{}", render::preview(media))?;
    writeln!(out)?;

    let filters: Vec<&str> = available_filters(&media.formats)
        .into_iter()
        .map(FormatFilter::label)
        .collect();
    writeln!(
        out,
        "Formats ({} shown, filters: {})",
        filter.label(),
        filters.join(", ")
    )?;

    let selected = workflow.selected_format().map(|f| f.id.as_str());
    let formats = select_formats(&media.formats, filter);
    writeln!(out, "{}", render::format_list(&formats, filter, selected))?;
    Ok(true)
}
