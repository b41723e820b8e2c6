//! Markdown-to-HTML rendering for report export
//!
//! A small, dependency-free renderer covering the subset the summarization
//! service emits: headers, bold/italic, bullet and numbered lists, pipe
//! tables, and paragraphs. Input is escaped before any markup is applied,
//! so raw HTML in the source text cannot reach the output.

/// Render report markdown to safe HTML
pub fn render_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 2);
    let lines: Vec<&str> = markdown.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() {
            i += 1;
            continue;
        }

        if is_table_row(line) {
            let start = i;
            while i < lines.len() && is_table_row(lines[i].trim()) {
                i += 1;
            }
            out.push_str(&render_table(&lines[start..i]));
            continue;
        }

        if let Some(rest) = line.strip_prefix("### ") {
            out.push_str(&format!("<h3>{}</h3>", render_inline(rest)));
            i += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix("## ") {
            out.push_str(&format!("<h2>{}</h2>", render_inline(rest)));
            i += 1;
            continue;
        }
        if let Some(rest) = line.strip_prefix("# ") {
            out.push_str(&format!("<h1>{}</h1>", render_inline(rest)));
            i += 1;
            continue;
        }

        if bullet_item(line).is_some() {
            out.push_str("<ul>");
            while i < lines.len() {
                match bullet_item(lines[i].trim()) {
                    Some(item) => {
                        out.push_str(&format!("<li>{}</li>", render_inline(item)));
                        i += 1;
                    }
                    None => break,
                }
            }
            out.push_str("</ul>");
            continue;
        }

        if numbered_item(line).is_some() {
            out.push_str("<ol>");
            while i < lines.len() {
                match numbered_item(lines[i].trim()) {
                    Some(item) => {
                        out.push_str(&format!("<li>{}</li>", render_inline(item)));
                        i += 1;
                    }
                    None => break,
                }
            }
            out.push_str("</ol>");
            continue;
        }

        // Paragraph: consecutive plain lines up to the next blank or block
        let mut paragraph = String::new();
        while i < lines.len() {
            let line = lines[i].trim();
            if line.is_empty() || (!paragraph.is_empty() && is_block_start(line)) {
                break;
            }
            if !paragraph.is_empty() {
                paragraph.push(' ');
            }
            paragraph.push_str(line);
            i += 1;
        }
        out.push_str(&format!("<p>{}</p>", render_inline(&paragraph)));
    }

    out
}

/// Escape the characters HTML gives meaning to
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Apply inline markup (bold, italic) to escaped text
fn render_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let bolded = replace_delimited(&escaped, "**", "<strong>", "</strong>");
    replace_delimited(&bolded, "*", "<em>", "</em>")
}

/// Replace paired occurrences of `delim` with open/close tags.
/// An unpaired trailing delimiter is left as-is.
fn replace_delimited(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        match rest.find(delim) {
            Some(start) => {
                let after = &rest[start + delim.len()..];
                match after.find(delim) {
                    Some(end) => {
                        out.push_str(&rest[..start]);
                        out.push_str(open);
                        out.push_str(&after[..end]);
                        out.push_str(close);
                        rest = &after[end + delim.len()..];
                    }
                    None => {
                        out.push_str(rest);
                        break;
                    }
                }
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    out
}

fn is_block_start(line: &str) -> bool {
    line.starts_with("# ")
        || line.starts_with("## ")
        || line.starts_with("### ")
        || is_table_row(line)
        || bullet_item(line).is_some()
        || numbered_item(line).is_some()
}

fn bullet_item(line: &str) -> Option<&str> {
    line.strip_prefix("* ").or_else(|| line.strip_prefix("- "))
}

fn numbered_item(line: &str) -> Option<&str> {
    let dot = line.find(". ")?;
    if dot > 0 && line[..dot].chars().all(|c| c.is_ascii_digit()) {
        Some(&line[dot + 2..])
    } else {
        None
    }
}

fn is_table_row(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('|') && line.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    line.contains("---")
}

fn parse_row(line: &str) -> Vec<&str> {
    let inner = line.trim().trim_start_matches('|').trim_end_matches('|');
    inner.split('|').map(str::trim).collect()
}

fn render_table(rows: &[&str]) -> String {
    let mut body_rows: Vec<&str> = Vec::new();
    let mut header: Option<&str> = None;

    for (idx, row) in rows.iter().enumerate() {
        if is_separator_row(row) {
            continue;
        }
        if idx == 0 {
            header = Some(row);
        } else {
            body_rows.push(row);
        }
    }

    let mut out = String::from("<table>");
    if let Some(header) = header {
        out.push_str("<thead><tr>");
        for cell in parse_row(header) {
            out.push_str(&format!("<th>{}</th>", render_inline(cell)));
        }
        out.push_str("</tr></thead>");
    }
    out.push_str("<tbody>");
    for row in body_rows {
        out.push_str("<tr>");
        for cell in parse_row(row) {
            out.push_str(&format!("<td>{}</td>", render_inline(cell)));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headers() {
        assert_eq!(render_html("# Shift Handover"), "<h1>Shift Handover</h1>");
        assert_eq!(render_html("## Alarms"), "<h2>Alarms</h2>");
        assert_eq!(render_html("### Detail"), "<h3>Detail</h3>");
    }

    #[test]
    fn renders_bold_and_italic() {
        assert_eq!(
            render_html("pump **P-105** is *down*"),
            "<p>pump <strong>P-105</strong> is <em>down</em></p>"
        );
    }

    #[test]
    fn unpaired_markers_stay_literal() {
        assert_eq!(render_html("5 * 3"), "<p>5 * 3</p>");
    }

    #[test]
    fn renders_bullet_list() {
        let html = render_html("* one\n* two");
        assert_eq!(html, "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn renders_numbered_list() {
        let html = render_html("1. calibrate LIC-301\n2. check P-105");
        assert_eq!(html, "<ol><li>calibrate LIC-301</li><li>check P-105</li></ol>");
    }

    #[test]
    fn renders_table_with_separator() {
        let md = "| Tag | Value |\n|---|---|\n| T-303 | 78% |";
        let html = render_html(md);
        assert_eq!(
            html,
            "<table><thead><tr><th>Tag</th><th>Value</th></tr></thead>\
             <tbody><tr><td>T-303</td><td>78%</td></tr></tbody></table>"
        );
    }

    #[test]
    fn joins_adjacent_lines_into_one_paragraph() {
        let html = render_html("first line\nsecond line\n\nnew paragraph");
        assert_eq!(
            html,
            "<p>first line second line</p><p>new paragraph</p>"
        );
    }

    #[test]
    fn escapes_raw_html() {
        let html = render_html("<script>alert('x')</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn escapes_inside_table_cells() {
        let html = render_html("| a | <b>bad</b> |\n| c | d |");
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
    }
}
