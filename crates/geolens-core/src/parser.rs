//! Structural content extraction
//!
//! Turns raw HTML into a [`ParsedContent`]: head metadata, the block tree of
//! the main content, links, statistics and the outputs of every
//! content-level detector.

use scraper::{ElementRef, Html, Selector};

use crate::capabilities::Capabilities;
use crate::config::Settings;
use crate::detectors::{detect_quotable_sentences, is_definition};
use crate::entities::extract_entities;
use crate::error::ParseError;
use crate::language::detect_language;
use crate::readability::{compute_readability, round_to};
use crate::structured_data::extract_structured_data;
use crate::types::{
    ContentBlock, ContentStats, ContentSurfaceSize, ContentTree, Heading, HeadingLevel, Link,
    PageMeta, ParsedContent, Section, SurfaceComponents,
};
use crate::url_utils::{LinkKind, classify_link, parse_http_url, resolve_href};

const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, ul, ol, table";
const CONTAINER_TAGS: &[&str] = &["ul", "ol", "table"];
const BOILERPLATE_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];
const MIN_PARAGRAPH_BLOCK_CHARS: usize = 10;

/// Parse `html` fetched from `url` into a content tree.
///
/// Malformed markup is recovered leniently. Input that is empty or only
/// whitespace fails with [`ParseError::EmptyDocument`].
pub fn parse_content(
    html: &str,
    url: &str,
    capabilities: &Capabilities,
    settings: &Settings,
) -> Result<ParsedContent, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    let document = Html::parse_document(html);
    let meta = extract_meta(&document)?;

    let main_html = main_content_html(html, url, &document, capabilities.main_content)?;
    let main_document = Html::parse_document(&main_html);
    let body = selector("body")?;
    let content_root = main_document
        .select(&body)
        .next()
        .unwrap_or_else(|| main_document.root_element());

    let mut content = walk_blocks(content_root)?;
    content.links = extract_links(content_root, url)?;

    let base = parse_http_url(url);
    let internal_links = content
        .links
        .iter()
        .filter(|l| classify_link(&l.href, base.as_ref()) == LinkKind::Internal)
        .count();
    let external_links = content.links.len() - internal_links;

    let all_paragraph_text = content.paragraphs.join(" ");
    let language = detect_language(&all_paragraph_text);
    let recognizer = capabilities.recognizer();
    let entities = extract_entities(
        &content.paragraphs,
        language,
        recognizer.as_deref(),
        &settings.nlp,
    );

    let word_count = content
        .paragraphs
        .iter()
        .chain(content.lists.iter().flatten())
        .chain(content.tables.iter().flatten())
        .map(|text| word_count(text))
        .sum();
    let paragraph_count = content.paragraphs.len();
    let avg_paragraph_length = if paragraph_count > 0 {
        word_count / paragraph_count
    } else {
        0
    };

    let components = SurfaceComponents {
        heading_blocks: content.headings.len(),
        paragraph_blocks: content
            .paragraphs
            .iter()
            .filter(|p| p.chars().count() >= MIN_PARAGRAPH_BLOCK_CHARS)
            .count(),
        list_blocks: content.lists.len(),
        table_blocks: content.tables.len(),
        definition_blocks: content.paragraphs.iter().filter(|p| is_definition(p)).count(),
    };

    let stats = ContentStats {
        word_count,
        paragraph_count,
        avg_paragraph_length,
        heading_count: content.headings.len(),
        internal_links,
        external_links,
        content_ratio: content_ratio(&document, &all_paragraph_text),
    };

    let readability = compute_readability(&all_paragraph_text, capabilities.readability);
    let schema_org = extract_structured_data(&document, capabilities.structured_data);
    let quotable_sentences = detect_quotable_sentences(&all_paragraph_text);

    tracing::debug!(
        url,
        language = language.code(),
        headings = stats.heading_count,
        paragraphs = paragraph_count,
        words = word_count,
        entities = entities.len(),
        "parsed content"
    );

    Ok(ParsedContent {
        url: url.to_string(),
        meta,
        content,
        stats,
        content_surface_size: ContentSurfaceSize::from(components),
        entities,
        readability,
        schema_org,
        quotable_sentences,
        language,
    })
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

fn extract_meta(document: &Html) -> Result<PageMeta, ParseError> {
    let title = document
        .select(&selector("title")?)
        .next()
        .map(|t| clean_text(&t.text().collect::<String>()))
        .unwrap_or_default();

    let description = document
        .select(&selector(r#"meta[name="description"]"#)?)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(clean_text)
        .unwrap_or_default();

    let canonical = document
        .select(&selector(r#"link[rel~="canonical"]"#)?)
        .next()
        .and_then(|l| l.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    Ok(PageMeta {
        title,
        description,
        canonical,
    })
}

/// HTML of the page's main content.
///
/// Uses Readability-style boilerplate removal when `boilerplate_removal` is
/// set and the `readability` feature is on, and otherwise (or when that pass
/// finds nothing) the first `<main>`, `<article>` or `<body>`.
fn main_content_html(
    html: &str,
    url: &str,
    document: &Html,
    boilerplate_removal: bool,
) -> Result<String, ParseError> {
    #[cfg(feature = "readability")]
    if boilerplate_removal {
        let document_url = parse_http_url(url).map(|_| url);
        match dom_smoothie::Readability::new(html, document_url, None).and_then(|mut r| r.parse())
        {
            Ok(article) => {
                let content = article.content.to_string();
                if !content.trim().is_empty() {
                    return Ok(content);
                }
                tracing::debug!("readability pass returned no content; using page landmarks");
            }
            Err(err) => {
                tracing::debug!(error = %err, "readability pass failed; using page landmarks");
            }
        }
    }
    #[cfg(not(feature = "readability"))]
    let _ = (html, url, boilerplate_removal);

    for tag in ["main", "article", "body"] {
        if let Some(el) = document.select(&selector(tag)?).next() {
            return Ok(el.html());
        }
    }
    Ok(document.root_element().html())
}

fn walk_blocks(root: ElementRef<'_>) -> Result<ContentTree, ParseError> {
    let mut tree = ContentTree::default();

    for element in root.select(&selector(BLOCK_SELECTOR)?) {
        let name = element.value().name();

        if let Some(level) = HeadingLevel::from_tag(name) {
            if has_ancestor(&element, CONTAINER_TAGS) {
                continue;
            }
            let text = element_text(&element);
            if text.is_empty() {
                continue;
            }
            let heading = Heading::new(level, text.clone());
            tree.sections.push(Section {
                heading: heading.clone(),
                paragraphs: Vec::new(),
            });
            tree.headings.push(heading);
            tree.blocks.push(ContentBlock::Heading { level, text });
            continue;
        }

        match name {
            "p" => {
                if has_ancestor(&element, CONTAINER_TAGS) {
                    continue;
                }
                let text = element_text(&element);
                if text.is_empty() {
                    continue;
                }
                if let Some(section) = tree.sections.last_mut() {
                    section.paragraphs.push(text.clone());
                }
                tree.paragraphs.push(text.clone());
                tree.blocks.push(ContentBlock::Paragraph { text });
            }
            "ul" | "ol" => {
                if has_ancestor(&element, CONTAINER_TAGS) {
                    continue;
                }
                let items: Vec<String> = element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| child.value().name() == "li")
                    .map(|li| element_text(&li))
                    .filter(|text| !text.is_empty())
                    .collect();
                if !items.is_empty() {
                    tree.lists.push(items.clone());
                    tree.blocks.push(ContentBlock::List { items });
                }
            }
            "table" => {
                if has_ancestor(&element, &["table"]) {
                    continue;
                }
                let rows = table_rows(&element)?;
                if !rows.is_empty() {
                    tree.tables.push(rows.clone());
                    tree.blocks.push(ContentBlock::Table { rows });
                }
            }
            _ => {}
        }
    }

    Ok(tree)
}

fn table_rows(table: &ElementRef<'_>) -> Result<Vec<String>, ParseError> {
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    Ok(table
        .select(&row_selector)
        .map(|row| {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| element_text(&cell))
                .filter(|text| !text.is_empty())
                .collect();
            clean_text(&cells.join(" | "))
        })
        .filter(|row| !row.is_empty())
        .collect())
}

fn extract_links(root: ElementRef<'_>, url: &str) -> Result<Vec<Link>, ParseError> {
    let base = parse_http_url(url);
    Ok(root
        .select(&selector("a[href]")?)
        .map(|a| Link {
            href: resolve_href(base.as_ref(), a.value().attr("href").unwrap_or_default()),
            text: element_text(&a),
        })
        .collect())
}

/// Share of the page's visible text that the paragraphs account for, in
/// `[0, 1]` with two decimals. Script, style and navigation chrome do not
/// count as visible.
fn content_ratio(document: &Html, main_text: &str) -> f64 {
    let mut total = String::new();
    collect_visible_text(document.root_element(), &mut total);
    let total_len = clean_text(&total).chars().count();
    if total_len == 0 {
        return 0.0;
    }
    let main_len = clean_text(main_text).chars().count();
    round_to((main_len as f64 / total_len as f64).min(1.0), 2)
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if !BOILERPLATE_TAGS.contains(&child.value().name()) {
                collect_visible_text(child, out);
            }
        }
    }
}

fn has_ancestor(element: &ElementRef<'_>, tags: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| tags.contains(&a.value().name()))
}

/// Text of `element` with whitespace collapsed, inline pieces joined by a space.
fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str, url: &str) -> ParsedContent {
        parse_content(html, url, &Capabilities::none(), &Settings::default()).unwrap()
    }

    const ARTICLE: &str = r#"
        <html>
          <head>
            <title>  What is   GEO? </title>
            <meta name="description" content="A guide to generative engine optimization.">
            <link rel="canonical" href="https://example.com/geo">
          </head>
          <body>
            <nav><a href="/home">Home</a> <a href="/blog">Blog</a></nav>
            <main>
              <h1>What is GEO?</h1>
              <p>Generative engine optimization refers to shaping pages for AI answers.</p>
              <h2>Key ideas</h2>
              <ul>
                <li>Lists <b>help</b></li>
                <li><p>Nested paragraph inside item</p></li>
                <li>   </li>
              </ul>
              <table>
                <tr><th>Metric</th><th>Weight</th></tr>
                <tr><td>Accessibility</td><td>40</td></tr>
                <tr><td></td><td></td></tr>
              </table>
              <p>Read the <a href="/docs/start">getting started guide</a> or the
                 <a href="https://other.org/paper">research paper</a>.</p>
            </main>
            <footer>Copyright footer text that is long enough to matter</footer>
          </body>
        </html>
    "#;

    #[test]
    fn empty_input_fails() {
        let err = parse_content("  \n ", "", &Capabilities::none(), &Settings::default());
        assert!(matches!(err, Err(ParseError::EmptyDocument)));
    }

    #[test]
    fn extracts_meta() {
        let parsed = parse(ARTICLE, "https://example.com/geo");
        assert_eq!(parsed.meta.title, "What is GEO?");
        assert_eq!(
            parsed.meta.description,
            "A guide to generative engine optimization."
        );
        assert_eq!(parsed.meta.canonical, "https://example.com/geo");
    }

    #[test]
    fn walks_blocks_without_double_counting() {
        let parsed = parse(ARTICLE, "https://example.com/geo");
        let content = &parsed.content;

        assert_eq!(content.headings.len(), 2);
        assert_eq!(content.headings[0].level, HeadingLevel::H1);
        assert_eq!(content.paragraphs.len(), 2);
        assert!(content.paragraphs.iter().all(|p| !p.contains("Nested")));
        assert_eq!(
            content.lists,
            vec![vec![
                "Lists help".to_string(),
                "Nested paragraph inside item".to_string()
            ]]
        );
        assert_eq!(
            content.tables,
            vec![vec![
                "Metric | Weight".to_string(),
                "Accessibility | 40".to_string()
            ]]
        );
        assert_eq!(content.sections.len(), 2);
        assert_eq!(content.sections[1].paragraphs.len(), 1);
        assert_eq!(content.blocks.len(), 6);
    }

    #[test]
    fn resolves_and_classifies_links() {
        let parsed = parse(ARTICLE, "https://example.com/geo");
        let hrefs: Vec<_> = parsed.content.links.iter().map(|l| l.href.as_str()).collect();
        assert!(hrefs.contains(&"https://example.com/docs/start"));
        assert!(hrefs.contains(&"https://other.org/paper"));
        assert_eq!(parsed.stats.external_links, 1);
        assert_eq!(
            parsed.stats.internal_links + parsed.stats.external_links,
            parsed.content.links.len()
        );
    }

    #[test]
    fn links_stay_relative_without_url() {
        let parsed = parse(ARTICLE, "");
        assert!(
            parsed
                .content
                .links
                .iter()
                .any(|l| l.href == "/docs/start")
        );
    }

    #[test]
    fn word_count_covers_paragraphs_lists_and_rows() {
        let parsed = parse(ARTICLE, "https://example.com/geo");
        let content = &parsed.content;
        let expected: usize = content
            .paragraphs
            .iter()
            .chain(content.lists.iter().flatten())
            .chain(content.tables.iter().flatten())
            .map(|t| t.split_whitespace().count())
            .sum();
        assert_eq!(parsed.stats.word_count, expected);
        assert_eq!(
            parsed.stats.avg_paragraph_length,
            expected / parsed.stats.paragraph_count
        );
    }

    #[test]
    fn surface_components_add_up() {
        let parsed = parse(ARTICLE, "https://example.com/geo");
        let surface = parsed.content_surface_size;
        assert_eq!(surface.score, surface.components.total());
        assert_eq!(surface.components.heading_blocks, 2);
        assert_eq!(surface.components.list_blocks, 1);
        assert_eq!(surface.components.table_blocks, 1);
        assert_eq!(surface.components.definition_blocks, 1);
    }

    #[test]
    fn content_ratio_is_bounded() {
        let parsed = parse(ARTICLE, "https://example.com/geo");
        let ratio = parsed.stats.content_ratio;
        assert!((0.0..=1.0).contains(&ratio), "ratio {ratio}");
        assert!(ratio > 0.0);

        let bare = parse("<div>   </div>", "");
        assert_eq!(bare.stats.content_ratio, 0.0);
    }

    #[test]
    fn content_ratio_ignores_boilerplate() {
        let doc = Html::parse_document(
            "<body><nav>menu menu menu</nav><p>abcd</p><script>var x;</script></body>",
        );
        assert_eq!(content_ratio(&doc, "abcd"), 1.0);
        assert_eq!(content_ratio(&doc, "ab"), 0.5);
    }

    #[test]
    fn malformed_html_is_tolerated() {
        let parsed = parse(
            "<h2>Unclosed heading<p>First paragraph of text<p>Second one<ul><li>item",
            "",
        );
        assert!(!parsed.content.paragraphs.is_empty());
        assert_eq!(parsed.content.lists.len(), 1);
    }

    #[test]
    fn without_capabilities_bundles_are_unavailable() {
        let parsed = parse(ARTICLE, "https://example.com/geo");
        assert!(!parsed.readability.available);
        assert!(!parsed.schema_org.available);
    }
}
