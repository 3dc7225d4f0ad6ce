use scraper::{ElementRef, Html, Node};

use crate::domain::Thread;

/// Rendering of a `<br>` element. The space before the newline matches the
/// text layout the board's own clients produce.
const LINE_BREAK: &str = " \n";

/// Turns the HTML fragments the board sends in thread bodies into plain text.
///
/// - `<br>` in any form becomes a line break
/// - `<a href="H">T</a>` becomes `[T](H)`
/// - every other tag is dropped, keeping its text; entities are decoded
/// - whitespace inside text is kept verbatim
///
/// Recoverable markup errors (stray `<`, unclosed tags, `</br>`, entities
/// without `;`) are rendered from the repaired tree. Input that ends inside
/// a tag, attribute or comment is returned unchanged.
#[derive(Clone)]
pub struct ContentNormalizer;

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = raw.replace("\r\n", "");
        let document = Html::parse_fragment(&cleaned);

        if document.errors.iter().any(|e| is_truncated_markup(e)) {
            tracing::debug!(
                "Leaving content as-is, parser reported: {}",
                document.errors.join("; ")
            );
            return raw.to_string();
        }

        let mut out = String::with_capacity(cleaned.len());
        render_children(document.root_element(), &mut out);
        out
    }

    /// Normalize the body of each freshly fetched thread.
    pub fn normalize_threads(&self, threads: Vec<Thread>) -> Vec<Thread> {
        threads
            .into_iter()
            .map(|mut thread| {
                thread.content = self.normalize(&thread.content);
                thread
            })
            .collect()
    }
}

/// html5ever reports input ending mid-tag as an EOF error; everything else it
/// repairs.
fn is_truncated_markup(error: &str) -> bool {
    error == "Unexpected EOF" || error.starts_with("Saw EOF")
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    render_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    match element.value().name() {
        "br" => out.push_str(LINE_BREAK),
        "a" => {
            let mut text = String::new();
            render_children(element, &mut text);
            let href = element.value().attr("href").unwrap_or_default();
            out.push('[');
            out.push_str(&text);
            out.push_str("](");
            out.push_str(href);
            out.push(')');
        }
        _ => render_children(element, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_breaks() {
        let normalizer = ContentNormalizer::new();
        let html = "line1<br/><br/>\r\nline2<br/>\r\nline3\r\n";
        assert_eq!(normalizer.normalize(html), "line1 \n \nline2 \nline3");
    }

    #[test]
    fn test_all_br_forms_render_identically() {
        let normalizer = ContentNormalizer::new();
        let expected = "a \nb \nc \nd";
        assert_eq!(normalizer.normalize("a<br>b<br/>c<br />d"), expected);
        assert_eq!(normalizer.normalize("a<BR>b<br >c<br/>d"), expected);
    }

    #[test]
    fn test_preserves_internal_whitespace() {
        let normalizer = ContentNormalizer::new();
        assert_eq!(
            normalizer.normalize("  indented   text<br>  next"),
            "  indented   text \n  next"
        );
    }

    #[test]
    fn test_anchor_becomes_markdown_link() {
        let normalizer = ContentNormalizer::new();
        let html = r#"see <a href="https://example.com/t/1">this thread</a> please"#;
        assert_eq!(
            normalizer.normalize(html),
            "see [this thread](https://example.com/t/1) please"
        );
    }

    #[test]
    fn test_anchor_with_empty_text_keeps_href() {
        let normalizer = ContentNormalizer::new();
        assert_eq!(
            normalizer.normalize(r#"<a href="/t/59976803"></a>"#),
            "[](/t/59976803)"
        );
    }

    #[test]
    fn test_strips_other_tags_and_decodes_entities() {
        let normalizer = ContentNormalizer::new();
        let html = r##"<font color="#789922">&gt;&gt;No.59976803</font><br /><b>加粗</b>"##;
        assert_eq!(normalizer.normalize(html), ">>No.59976803 \n加粗");
    }

    #[test]
    fn test_keeps_lone_newlines() {
        let normalizer = ContentNormalizer::new();
        assert_eq!(normalizer.normalize("a\nb\r\nc"), "a\nbc");
    }

    #[test]
    fn test_truncated_markup_returned_unchanged() {
        let normalizer = ContentNormalizer::new();
        let unterminated = "text <a href=\"https://example.com";
        assert_eq!(normalizer.normalize(unterminated), unterminated);

        let open_tag = "a<br>b <fon\r\n";
        assert_eq!(normalizer.normalize(open_tag), open_tag);
    }

    #[test]
    fn test_recoverable_markup_is_rendered() {
        let normalizer = ContentNormalizer::new();
        assert_eq!(normalizer.normalize("1 < 2<br>3"), "1 < 2 \n3");
        assert_eq!(normalizer.normalize("1 <2 and 3\r\n"), "1 <2 and 3");
        assert_eq!(normalizer.normalize("<b>bold<br>text"), "bold \ntext");
        assert_eq!(normalizer.normalize("x<br/>y</br>z"), "x \ny \nz");
        assert_eq!(normalizer.normalize("a&nbspb<br>c"), "a\u{a0}b \nc");
    }

    #[test]
    fn test_plain_text_untouched() {
        let normalizer = ContentNormalizer::new();
        assert_eq!(normalizer.normalize("测试内容"), "测试内容");
        assert_eq!(normalizer.normalize(""), "");
    }

    #[test]
    fn test_normalize_threads_rewrites_content() {
        let normalizer = ContentNormalizer::new();
        let thread: Thread = serde_json::from_str(
            r#"{"id":1,"fid":4,"content":"a<br />b","sage":0,"admin":0,"Hide":0}"#,
        )
        .unwrap();

        let threads = normalizer.normalize_threads(vec![thread]);
        assert_eq!(threads[0].content, "a \nb");
    }
}
