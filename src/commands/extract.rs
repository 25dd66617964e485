use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::chunking::render_marked_text;
use crate::cli::ExtractArgs;
use crate::util::ensure_directory;

pub fn run(args: ExtractArgs) -> Result<()> {
    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| default_output_path(&args.pdf_path));

    let (pages, first_page) = extract_pages(&args.pdf_path, args.skip_pages, args.max_pages)?;
    let marked = render_marked_text(&pages, first_page);

    if let Some(parent) = output_path.parent() {
        ensure_directory(parent)?;
    }
    fs::write(&output_path, &marked)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    info!(
        pdf = %args.pdf_path.display(),
        path = %output_path.display(),
        chars = marked.chars().count(),
        "wrote page-marked text"
    );

    Ok(())
}

/// Extracts a PDF's text layer, returning the kept pages and the physical
/// number of the first one.
///
/// The first `skip_pages` pages (cover, disclaimer, title) are dropped but keep
/// their numbers, so page numbers always match the PDF.
pub fn extract_pages(
    pdf_path: &Path,
    skip_pages: usize,
    max_pages: Option<usize>,
) -> Result<(Vec<String>, u32)> {
    let pages = extract_pages_with_pdftotext(pdf_path, max_pages)?;
    let total_pages = pages.len();
    let kept = pages.into_iter().skip(skip_pages).collect::<Vec<String>>();

    info!(
        pdf = %pdf_path.display(),
        total_pages,
        skipped = total_pages - kept.len(),
        "extracted text layer"
    );

    let first_page = u32::try_from(skip_pages + 1).context("skip_pages is out of range")?;
    Ok((kept, first_page))
}

pub fn pdftotext_version() -> Option<String> {
    let output = Command::new("pdftotext").arg("-v").output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

fn default_output_path(pdf_path: &Path) -> PathBuf {
    pdf_path.with_extension("pages.txt")
}

fn extract_pages_with_pdftotext(pdf_path: &Path, max_pages: Option<usize>) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_form_feed_pages(&String::from_utf8_lossy(&output.stdout)))
}

fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_form_feed_pages_drops_trailing_blank_pages_and_nuls() {
        let pages = split_form_feed_pages("Cover\u{000C}1.1 Sc\u{0000}ope\nBody\u{000C}\n\u{000C}  ");
        assert_eq!(pages, vec!["Cover".to_string(), "1.1 Scope\nBody".to_string()]);
    }

    #[test]
    fn default_output_path_sits_next_to_the_pdf() {
        assert_eq!(
            default_output_path(Path::new("docs/IS_456_2000.pdf")),
            PathBuf::from("docs/IS_456_2000.pages.txt")
        );
    }
}
