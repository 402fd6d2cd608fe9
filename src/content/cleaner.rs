//! HTML cleaner implementation
//!
//! Cleaning runs in two passes over the parsed document:
//! 1. Build a pruned tree: drop noise subtrees, filter attributes, and drop
//!    elements left without text or media once their children are pruned
//! 2. Serialize the pruned tree with canonical whitespace: collapsed text runs,
//!    one line per block-level element, `<pre>` kept verbatim

use crate::content::noise::{is_media, is_noise};
use crate::content::{CleanError, CleanedPage, CleanerOptions};
use scraper::{ElementRef, Html, Node, Selector};

/// Deepest element nesting the cleaner will walk
pub const MAX_NESTING_DEPTH: usize = 512;

/// Elements that start and end on their own line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "ol", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "ul",
];

/// Elements serialized without a closing tag
const VOID_TAGS: &[&str] = &[
    "area", "br", "col", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Void elements that never count as content on their own
const SEPARATOR_TAGS: &[&str] = &["br", "hr"];

/// A node of the pruned tree
#[derive(Debug)]
enum CleanNode {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<CleanNode>,
    },
    Text(String),
}

impl CleanNode {
    fn carries_content(&self) -> bool {
        match self {
            CleanNode::Text(text) => !text.trim().is_empty(),
            CleanNode::Element { name, .. } => !SEPARATOR_TAGS.contains(&name.as_str()),
        }
    }
}

/// Cleans raw page HTML into canonical content
///
/// # Example
///
/// ```
/// use sumi_harvest::content::HtmlCleaner;
///
/// let raw = r#"<html><head><title>Guide</title></head>
/// <body><nav>Menu</nav><p onclick="x()" class="lead">Hello   world</p></body></html>"#;
///
/// let page = HtmlCleaner::default().clean(raw).unwrap();
/// assert_eq!(page.title.as_deref(), Some("Guide"));
/// assert_eq!(page.html, "<h1>Guide</h1>\n<p>Hello world</p>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct HtmlCleaner {
    options: CleanerOptions,
}

impl HtmlCleaner {
    /// Creates a cleaner with the given options
    pub fn new(options: CleanerOptions) -> Self {
        Self { options }
    }

    /// Cleans a raw content blob
    ///
    /// # Returns
    ///
    /// * `Ok(CleanedPage)` - Title plus canonical body HTML headed by the title
    /// * `Err(CleanError)` - The document could not be walked safely
    pub fn clean(&self, raw: &str) -> Result<CleanedPage, CleanError> {
        let document = Html::parse_document(raw);
        let title = extract_document_title(&document);

        let children = match body_element(&document) {
            Some(body) => self.prune_children(body, 0, false)?,
            None => Vec::new(),
        };

        let mut writer = Writer::default();
        if let Some(title) = &title {
            writer.newline();
            writer.raw("<h1>");
            writer.text(&escape_text(title));
            writer.raw("</h1>");
            writer.newline();
        }
        for child in &children {
            writer.node(child, false);
        }

        Ok(CleanedPage {
            title,
            html: writer.finish(),
        })
    }

    /// Cleans a raw content blob, falling back to the raw content on failure
    ///
    /// Partially processed content beats losing the page, so a cleaning
    /// failure is logged and the raw blob is kept as the page body.
    pub fn clean_or_raw(&self, raw: &str) -> CleanedPage {
        match self.clean(raw) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Cleaning failed, keeping raw content: {}", e);
                CleanedPage {
                    title: extract_document_title(&Html::parse_document(raw)),
                    html: raw.to_string(),
                }
            }
        }
    }

    fn prune_children(
        &self,
        parent: ElementRef<'_>,
        depth: usize,
        in_pre: bool,
    ) -> Result<Vec<CleanNode>, CleanError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CleanError::TooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }

        let mut nodes = Vec::new();
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => {
                    let text: &str = text;
                    if in_pre {
                        nodes.push(CleanNode::Text(text.to_string()));
                    } else {
                        nodes.push(CleanNode::Text(collapse_whitespace(text)));
                    }
                }
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        if let Some(node) = self.prune_element(element, depth + 1, in_pre)? {
                            nodes.push(node);
                        }
                    }
                }
                // Comments, doctypes and processing instructions are dropped
                _ => {}
            }
        }
        Ok(nodes)
    }

    fn prune_element(
        &self,
        element: ElementRef<'_>,
        depth: usize,
        in_pre: bool,
    ) -> Result<Option<CleanNode>, CleanError> {
        let value = element.value();
        if is_noise(value) {
            return Ok(None);
        }

        let name = value.name().to_string();
        let attrs = self.kept_attributes(element);

        if VOID_TAGS.contains(&name.as_str()) {
            if is_media(&name) || SEPARATOR_TAGS.contains(&name.as_str()) {
                return Ok(Some(CleanNode::Element {
                    name,
                    attrs,
                    children: Vec::new(),
                }));
            }
            return Ok(None);
        }

        let children = self.prune_children(element, depth, in_pre || name == "pre")?;
        if !is_media(&name) && !children.iter().any(CleanNode::carries_content) {
            return Ok(None);
        }

        Ok(Some(CleanNode::Element {
            name,
            attrs,
            children,
        }))
    }

    /// Allow-listed attributes, in allow-list order
    fn kept_attributes(&self, element: ElementRef<'_>) -> Vec<(String, String)> {
        let value = element.value();
        self.options
            .allowed_attributes
            .iter()
            .filter(|name| !is_event_handler(name))
            .filter_map(|name| {
                let attr = value.attr(name)?;
                if (name == "href" || name == "src") && is_script_url(attr) {
                    return None;
                }
                Some((name.clone(), attr.to_string()))
            })
            .collect()
    }
}

/// Returns the trimmed, whitespace-collapsed `<title>` text
pub(crate) fn extract_document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

fn body_element(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("body").ok()?;
    document.select(&selector).next()
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.get(..2).map_or(false, |prefix| prefix.eq_ignore_ascii_case("on"))
}

fn is_script_url(value: &str) -> bool {
    value
        .trim_start()
        .get(..11)
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

/// Replaces every whitespace run with a single space
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Line-aware serializer for the pruned tree
#[derive(Default)]
struct Writer {
    out: String,
    /// Set right after a block opening tag, where leading spaces are dropped
    fresh: bool,
}

impl Writer {
    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    /// Ends the current line unless already at a line start
    fn newline(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
        if !self.at_line_start() {
            self.out.push('\n');
        }
    }

    fn raw(&mut self, s: &str) {
        self.out.push_str(s);
        self.fresh = false;
    }

    /// Writes already-collapsed, escaped text without doubling spaces
    fn text(&mut self, s: &str) {
        let s = if self.fresh || self.at_line_start() || self.out.ends_with(' ') {
            s.trim_start_matches(' ')
        } else {
            s
        };
        if !s.is_empty() {
            self.raw(s);
        }
    }

    fn node(&mut self, node: &CleanNode, in_pre: bool) {
        match node {
            CleanNode::Text(text) if in_pre => self.raw(&escape_text(text)),
            CleanNode::Text(text) => self.text(&escape_text(text)),
            CleanNode::Element {
                name,
                attrs,
                children,
            } => self.element(name, attrs, children, in_pre),
        }
    }

    fn element(
        &mut self,
        name: &str,
        attrs: &[(String, String)],
        children: &[CleanNode],
        in_pre: bool,
    ) {
        let block = BLOCK_TAGS.contains(&name) && !in_pre;
        if block {
            self.newline();
        }

        self.raw("<");
        self.raw(name);
        for (key, value) in attrs {
            self.raw(&format!(" {}=\"{}\"", key, escape_attribute(value)));
        }
        self.raw(">");
        self.fresh = block;

        if name == "br" && !in_pre {
            self.newline();
            return;
        }
        if VOID_TAGS.contains(&name) {
            if block {
                self.newline();
            }
            return;
        }

        let child_in_pre = in_pre || name == "pre";
        if name == "pre" {
            // A newline right after <pre> is swallowed by parsers
            if let Some(CleanNode::Text(text)) = children.first() {
                if text.starts_with('\n') {
                    self.raw("\n");
                }
            }
        }

        for child in children {
            self.node(child, child_in_pre);
        }

        if block && !child_in_pre {
            let trimmed = self.out.trim_end_matches(' ').len();
            self.out.truncate(trimmed);
        }

        self.raw("</");
        self.raw(name);
        self.raw(">");
        if block {
            self.newline();
        }
    }

    fn finish(self) -> String {
        self.out.trim_end_matches([' ', '\n']).to_string()
    }
}
