//! File commands: listing, upload, and download URLs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use redbox_cloud::{NewFile, RedBoxClient};
use tracing::instrument;

use crate::output::{files_table, format_size};

#[derive(ClapArgs, Clone)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Clone)]
pub struct UploadArgs {
    /// Local files to upload
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// MIME type to record instead of guessing from the extension
    #[arg(long)]
    pub file_type: Option<String>,
}

#[derive(ClapArgs, Clone)]
pub struct UrlArgs {
    /// Record ID of the file
    pub record_id: String,

    /// Print the inline preview URL instead (plaintext images only)
    #[arg(long)]
    pub preview: bool,
}

#[instrument(level = "info", name = "cmd::files", skip_all)]
pub async fn list(client: &RedBoxClient, args: &ListArgs) -> Result<()> {
    let files = client.list_files().await.context("Failed to list files")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }
    if files.is_empty() {
        eprintln!("No files yet. Use 'redbox upload <PATH>' to add one.");
        return Ok(());
    }
    println!("{}", files_table(&files));
    Ok(())
}

#[instrument(level = "info", name = "cmd::upload", skip_all)]
pub async fn upload(client: &RedBoxClient, args: &UploadArgs) -> Result<()> {
    for path in &args.paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file = NewFile {
            file_name: file_name(path),
            file_type: args.file_type.clone().unwrap_or_else(|| guess_mime(path)),
            bytes,
        };
        let size = file.bytes.len();

        let created = client
            .upload_file(&file)
            .await
            .with_context(|| format!("Failed to upload {}", path.display()))?;
        println!("{}  {} ({})", created.id, created.file_name, format_size(size));
    }
    Ok(())
}

#[instrument(level = "info", name = "cmd::url", skip_all)]
pub async fn url(client: &RedBoxClient, args: &UrlArgs) -> Result<()> {
    let record = client
        .get_file(&args.record_id)
        .await
        .with_context(|| format!("Failed to look up file {}", args.record_id))?;

    if args.preview {
        let url = client
            .preview_url(&record)
            .with_context(|| format!("'{}' has no inline preview", record.display_name()))?;
        println!("{url}");
    } else {
        println!("{}", client.download_url(&record)?);
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// MIME type from the file extension; `"unknown"` when unrecognized.
fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_common_types() {
        assert_eq!(guess_mime(Path::new("report.pdf")), "application/pdf");
        assert_eq!(guess_mime(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("notes.txt")), "text/plain");
    }

    #[test]
    fn guesses_less_common_types() {
        assert_eq!(guess_mime(Path::new("scan.bmp")), "image/bmp");
        assert_eq!(guess_mime(Path::new("photo.tiff")), "image/tiff");
        assert_eq!(guess_mime(Path::new("clip.webm")), "video/webm");
        assert_eq!(
            guess_mime(Path::new("slides.pptx")),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );
    }

    #[test]
    fn unknown_extension() {
        assert_eq!(guess_mime(Path::new("archive.qqzz")), "unknown");
        assert_eq!(guess_mime(Path::new("Makefile")), "unknown");
    }

    #[test]
    fn file_name_from_path() {
        assert_eq!(file_name(Path::new("/tmp/docs/report.pdf")), "report.pdf");
    }
}
