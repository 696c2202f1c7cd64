use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use mime_guess::from_path;
use pdf_extract::extract_text;
use scraper::{Html, Node};
use std::fs;
use std::path::Path;
use url::Url;

/// A loaded source document, ready for chunking.
#[derive(Debug, Clone)]
pub struct Document {
    /// Extracted plain-text content
    pub content: String,
    /// Source identifier: the URL or the file name
    pub source: String,
    /// When the content was fetched or read
    pub fetched_at: DateTime<Utc>,
}

impl Document {
    /// Whether an input string should be treated as a URL rather than a path.
    pub fn is_url(input: &str) -> bool {
        input.starts_with("http://") || input.starts_with("https://")
    }

    /// Load a document from a scheme URL or a local file path.
    pub async fn load(client: &reqwest::Client, input: &str) -> Result<Self> {
        if Self::is_url(input) {
            Self::from_url(client, input).await
        } else {
            Self::from_file(input)
        }
    }

    /// Fetch a scheme page and strip it down to its visible text.
    pub async fn from_url(client: &reqwest::Client, url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid URL: {}", url))?;
        info!("Fetching {}", url);

        let response = client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {}", url))?;
        let body = response.text().await?;

        let content = normalize_whitespace(&html_to_text(&body));
        if content.is_empty() {
            warn!("No usable text extracted from {}", url);
        }
        debug!("Extracted {} characters from {}", content.chars().count(), url);

        Ok(Document {
            content,
            source: url.to_string(),
            fetched_at: Utc::now(),
        })
    }

    /// Read a local document (PDF or plain text).
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .context("Invalid file name")?
            .to_str()
            .context("Invalid file name encoding")?
            .to_string();

        // Detect MIME type
        let mime = from_path(path).first_or_octet_stream();
        let mime_type = mime.to_string();
        debug!("Detected MIME type: {}", mime_type);

        let content = read_file_content(path, &mime_type)?;

        Ok(Document {
            content,
            source: file_name,
            fetched_at: Utc::now(),
        })
    }
}

/// Read content from a local file based on its MIME type.
fn read_file_content(path: &Path, mime_type: &str) -> Result<String> {
    match mime_type {
        // PDF documents
        mime if mime.starts_with("application/pdf") => {
            info!("Extracting PDF document: {}", path.display());
            let content = extract_text(path)
                .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;

            // PDF extraction can leave excessive whitespace behind
            let cleaned = normalize_whitespace(&content);
            if cleaned.is_empty() {
                warn!("Extracted PDF content is empty or contains only whitespace");
            }

            Ok(cleaned)
        }

        // Plain text documents
        mime if mime.starts_with("text/") => {
            info!("Reading text document: {}", path.display());
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read text file: {}", path.display()))?;
            Ok(content)
        }

        _ => Err(anyhow::anyhow!(
            "Unsupported document format: {}. Only text and PDF files are supported.",
            mime_type
        )),
    }
}

/// Tags whose text is never user-visible.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "head", "template"];

/// Tags that start a new text block.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "table", "tr", "h1", "h2", "h3", "h4", "h5", "h6",
    "section", "article", "header", "footer", "blockquote", "pre",
];

/// Extract the visible text of an HTML page, one block element per line.
fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.tree.nodes() {
        match node.value() {
            Node::Element(element) => {
                if BLOCK_TAGS.contains(&element.name()) {
                    out.push('\n');
                }
            }
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
                });
                if !hidden {
                    out.push_str(&text.text);
                }
            }
            _ => {}
        }
    }

    out
}

/// Normalize whitespace in text (collapse runs of spaces, cap consecutive
/// newlines at a paragraph break).
fn normalize_whitespace(text: &str) -> String {
    let result = text.replace('\r', "");

    let mut prev_char = ' ';
    let mut newline_count = 0;
    let mut normalized = String::with_capacity(result.len());

    for c in result.chars() {
        if c == '\n' {
            newline_count += 1;
        } else {
            if newline_count > 0 {
                // At most two newlines (paragraph break)
                if newline_count >= 2 {
                    normalized.push_str("\n\n");
                } else {
                    normalized.push('\n');
                }
                newline_count = 0;
            }

            // Don't add consecutive spaces
            if !(c == ' ' && prev_char == ' ') {
                normalized.push(c);
            }

            prev_char = c;
        }
    }

    if newline_count > 0 {
        if newline_count >= 2 {
            normalized.push_str("\n\n");
        } else {
            normalized.push('\n');
        }
    }

    normalized.trim().to_string()
}
