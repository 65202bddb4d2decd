//! Readable markup dump for debugging captures.
//!
//! `generate_image` renders whatever markup it is handed; when a capture
//! comes out wrong the quickest check is to look at that markup. This prints
//! an indented view of it so nesting mistakes stand out.

use ego_tree::NodeRef;
use scraper::{Html, Node};

const INDENT: &str = "  ";

/// Prints an indented rendering of `html` to stdout.
pub fn dump_markup(html: &str) {
    println!("{}", format_markup(html));
}

/// Formats `html` with one element per line, children indented.
pub fn format_markup(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    write_node(document.tree.root(), 0, &mut out);
    out.trim_end().to_string()
}

fn write_node(node: NodeRef<'_, Node>, depth: usize, out: &mut String) {
    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node(child, depth, out);
            }
        }
        Node::Doctype(doctype) => {
            push_line(out, depth, &format!("<!DOCTYPE {}>", doctype.name()));
        }
        Node::Comment(comment) => {
            push_line(out, depth, &format!("<!--{}-->", comment.trim()));
        }
        Node::Text(text) => {
            let text = text.trim();
            if !text.is_empty() {
                push_line(out, depth, text);
            }
        }
        Node::Element(element) => {
            let mut open = format!("<{}", element.name());
            for (name, value) in element.attrs() {
                if value.is_empty() {
                    open.push_str(&format!(" {name}"));
                } else {
                    open.push_str(&format!(" {name}=\"{value}\""));
                }
            }

            if node.children().next().is_none() {
                open.push_str(" />");
                push_line(out, depth, &open);
            } else {
                open.push('>');
                push_line(out, depth, &open);
                for child in node.children() {
                    write_node(child, depth + 1, out);
                }
                push_line(out, depth, &format!("</{}>", element.name()));
            }
        }
        _ => {}
    }
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_nested_elements() {
        let formatted = format_markup("<html><body><div><p>hi</p></div></body></html>");

        let lines: Vec<&str> = formatted.lines().collect();
        assert!(lines.contains(&"<html>"));
        assert!(lines.contains(&"    <div>"));
        assert!(lines.contains(&"      <p>"));
        assert!(lines.contains(&"        hi"));
        assert!(lines.contains(&"</html>"));
    }

    #[test]
    fn renders_attributes_on_the_open_tag() {
        let formatted =
            format_markup(r#"<div id="x" style="width:50px;height:50px;background:blue"></div>"#);

        let line = formatted
            .lines()
            .find(|l| l.trim_start().starts_with("<div"))
            .expect("div line present");
        assert!(line.contains(r#"id="x""#), "got: {line}");
        assert!(
            line.contains(r#"style="width:50px;height:50px;background:blue""#),
            "got: {line}"
        );
        assert!(line.ends_with("/>"), "childless div should self-close: {line}");
    }

    #[test]
    fn skips_whitespace_only_text() {
        let formatted = format_markup("<div>\n    \n</div>");
        assert!(!formatted.lines().any(|l| l.trim().is_empty()));
    }

    #[test]
    fn keeps_comments() {
        let formatted = format_markup("<div><!-- marker --></div>");
        assert!(formatted.contains("<!--marker-->"));
    }
}
