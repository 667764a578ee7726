//! Headless-browser page fetcher with a 1h on-disk cache (spec.md §4.2.2;
//! ground truth: `internal/tools/browser/{load,extract}.go`).

use std::path::Path;
use std::time::{Duration, SystemTime};

use scraper::{ElementRef, Html, Node};
use sha2::{Digest, Sha256};

use crate::error::ToolError;

const CACHE_TTL: Duration = Duration::from_secs(3600);
const NAV_TIMEOUT: Duration = Duration::from_secs(10);
const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(5);
const STABILISE_TIMEOUT: Duration = Duration::from_secs(5);

const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "iframe", "canvas", "video", "audio", "nav", "header",
    "footer", "aside", "form", "button", "input", "select", "textarea", "label", "link", "meta",
];
const BLOCK_TAGS: &[&str] = &[
    "div", "section", "article", "main", "p", "ul", "ol", "li", "blockquote", "pre", "table",
    "tr", "td", "th",
];

/// Renders a URL to `(title, html)`. Production code uses
/// [`HeadlessChromePageRenderer`] (feature `browser`); tests substitute a
/// fixed-HTML stub so the cache and Markdown serialisation are verifiable
/// without spawning a real browser.
#[async_trait::async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<(String, String), ToolError>;
}

#[cfg(feature = "browser")]
pub struct HeadlessChromePageRenderer;

#[cfg(feature = "browser")]
#[async_trait::async_trait]
impl PageRenderer for HeadlessChromePageRenderer {
    async fn render(&self, url: &str) -> Result<(String, String), ToolError> {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || render_blocking(&url))
            .await
            .map_err(|e| ToolError::Message(format!("browser task panicked: {e}")))?
    }
}

#[cfg(feature = "browser")]
fn render_blocking(url: &str) -> Result<(String, String), ToolError> {
    use headless_chrome::{Browser, LaunchOptionsBuilder};
    use std::ffi::OsStr;

    let launch_options = LaunchOptionsBuilder::default()
        .headless(true)
        .window_size(Some((1920, 1080)))
        .args(vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-infobars"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
        ])
        .build()
        .map_err(|e| ToolError::Message(format!("launch options: {e}")))?;

    let browser = Browser::new(launch_options).map_err(|e| ToolError::Message(e.to_string()))?;
    let tab = browser.new_tab().map_err(|e| ToolError::Message(e.to_string()))?;
    tab.set_default_timeout(NAV_TIMEOUT);
    tab.navigate_to(url).map_err(|e| ToolError::Message(e.to_string()))?;
    tab.wait_until_navigated().map_err(|e| ToolError::Message(e.to_string()))?;
    let _ = tab.wait_for_element_with_custom_timeout("body", NETWORK_IDLE_TIMEOUT);
    std::thread::sleep(STABILISE_TIMEOUT.min(Duration::from_millis(200)));

    let title = tab.get_title().unwrap_or_default();
    let html = tab
        .get_content()
        .map_err(|e| ToolError::Message(format!("page content: {e}")))?;
    Ok((title, html))
}

fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn purge_expired(cache_dir: &Path, now: SystemTime) {
    let Ok(entries) = std::fs::read_dir(cache_dir) else { return };
    for entry in entries.filter_map(|e| e.ok()) {
        let Ok(metadata) = entry.metadata() else { continue };
        if metadata.is_dir() {
            continue;
        }
        if let Ok(modified) = metadata.modified() {
            if now.duration_since(modified).unwrap_or_default() > CACHE_TTL {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }
}

/// `fetch_page{url}` (spec.md §4.2.2): cache lookup, purge, render, cache
/// write (best-effort).
pub async fn fetch_page(
    renderer: &dyn PageRenderer,
    cache_dir: &Path,
    url: &str,
    now: SystemTime,
) -> Result<String, ToolError> {
    if url.is_empty() {
        return Err(ToolError::Message("url is required".into()));
    }
    std::fs::create_dir_all(cache_dir)?;
    purge_expired(cache_dir, now);

    let cache_path = cache_dir.join(format!("{}.md", cache_key(url)));
    if let Ok(metadata) = std::fs::metadata(&cache_path) {
        if let Ok(modified) = metadata.modified() {
            if now.duration_since(modified).unwrap_or(CACHE_TTL) < CACHE_TTL {
                if let Ok(cached) = std::fs::read_to_string(&cache_path) {
                    return Ok(cached);
                }
            }
        }
    }

    let (title, html) = renderer.render(url).await?;
    let markdown = extract_markdown(&html, &title, url);
    let _ = std::fs::write(&cache_path, &markdown);
    Ok(markdown)
}

/// Serialise an HTML document to a Markdown-ish form (spec.md §4.2.2 step
/// 4): skip non-content tags, treat a fixed set as block-level, render
/// headings/bold/italic/`<br>`/list items, then collapse blank-line runs.
fn extract_markdown(raw_html: &str, title: &str, url: &str) -> String {
    let document = Html::parse_document(raw_html);
    let mut out = format!("---\ntitle: {title}\nurl: {url}\n---\n\n");
    for child in document.root_element().children() {
        if let Some(el) = ElementRef::wrap(child) {
            walk(el, &mut out);
        }
    }
    collapse(out.trim())
}

fn walk(el: ElementRef, out: &mut String) {
    let tag = el.value().name();
    if SKIP_TAGS.contains(&tag) {
        return;
    }

    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag.as_bytes()[1] - b'0';
            out.push('\n');
            out.push_str(&"#".repeat(level as usize));
            out.push(' ');
            walk_children(el, out);
            out.push('\n');
            return;
        }
        "a" => {
            walk_children(el, out);
            return;
        }
        "strong" | "b" => {
            out.push_str("**");
            walk_children(el, out);
            out.push_str("**");
            return;
        }
        "em" | "i" => {
            out.push('*');
            walk_children(el, out);
            out.push('*');
            return;
        }
        "br" => {
            out.push('\n');
            return;
        }
        "li" => {
            out.push_str("\n- ");
            walk_children(el, out);
            return;
        }
        _ => {}
    }

    if BLOCK_TAGS.contains(&tag) {
        out.push('\n');
        walk_children(el, out);
        out.push('\n');
        return;
    }

    walk_children(el, out);
}

fn walk_children(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    walk(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Collapse runs of blank lines to at most one, trimming each line.
fn collapse(s: &str) -> String {
    let mut out = Vec::new();
    let mut blanks = 0;
    for line in s.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blanks += 1;
            if blanks <= 1 {
                out.push(String::new());
            }
        } else {
            blanks = 0;
            out.push(trimmed.to_string());
        }
    }
    out.join("\n")
}
