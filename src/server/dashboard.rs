
use crate::fetch::Scored;
use crate::scoring::GRAFT_TYPE_COLUMN;

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;color:#222}\
table{border-collapse:collapse;margin-bottom:2rem}\
th,td{border:1px solid #ccc;padding:.3rem .6rem;text-align:right}\
th:first-child,td:first-child{text-align:left}\
.error{background:#fde8e8;border:1px solid #e0a0a0;padding:1rem}\
.warning{background:#fff6db;border:1px solid #e5cf87;padding:1rem}";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Lindy Scores</title>\
<style>{}</style></head><body>\n<h1>ACL Grafts Lindy Scores</h1>\n{}</body></html>\n",
        STYLE, body
    )
}

/// Dashboard with the raw graft table and the ranked scores
pub fn render(scored: &Scored, as_of_year: i32) -> String {
    let mut body = String::new();
    let table = &scored.table;

    for skipped in &scored.report.skipped {
        body.push_str(&format!(
            "<p class=\"warning\">Skipped: {}</p>\n",
            escape(&skipped.to_string())
        ));
    }

    body.push_str("<h2>Graft Data</h2>\n<table>\n<tr>");
    for column in &table.columns {
        body.push_str(&format!("<th>{}</th>", escape(column)));
    }
    body.push_str("</tr>\n");
    for row in &table.rows {
        body.push_str("<tr>");
        for column in &table.columns {
            let value = if column == GRAFT_TYPE_COLUMN {
                row.graft_type.as_str()
            } else {
                row.get(column).unwrap_or("")
            };
            body.push_str(&format!("<td>{}</td>", escape(value)));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");

    body.push_str(&format!("<h2>Lindy Scores (as of {})</h2>\n", as_of_year));
    body.push_str("<table>\n<tr><th>Graft type</th><th>Lindy Score</th></tr>\n");
    for entry in scored.report.result.ranked() {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{:.2}</td></tr>\n",
            escape(entry.graft_type()),
            entry.score()
        ));
    }
    body.push_str("</table>\n");

    page(&body)
}

/// Dashboard showing only an error banner
pub fn render_error(message: &str) -> String {
    page(&format!(
        "<p class=\"error\">Error fetching data: {}</p>\n",
        escape(message)
    ))
}
