const PAGE_TEMPLATE: &str = include_str!("../templates/page.html");

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps already-escaped `body` in the shared page layout.
pub fn render_page(title: &str, body: &str) -> String {
    PAGE_TEMPLATE
        .replace("{{title}}", &escape(title))
        .replace("{{body}}", body)
}

pub fn status_line(ok: bool, message: &str) -> String {
    let class = if ok { "ok" } else { "fail" };
    format!("<p class=\"{}\">{}</p>", class, escape(message))
}

pub fn key_value_table(rows: &[(&str, String)]) -> String {
    let mut out = String::from("<table>");
    for (key, value) in rows {
        out.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>",
            escape(key),
            escape(value)
        ));
    }
    out.push_str("</table>");
    out
}

pub fn transcript_block(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    format!("<h2>Transcript</h2><pre>{}</pre>", escape(&lines.join("\n")))
}
