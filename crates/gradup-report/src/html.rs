//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use gradup_core::report::{AttemptSummary, SectionSummary};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from an attempt summary.
pub fn generate_html(summary: &AttemptSummary) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>gradup report: {}</title>\n",
        html_escape(&summary.assessment_title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!(
        "<h1>{}</h1>\n",
        html_escape(&summary.assessment_title)
    ));
    let finished = summary
        .finished_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    html.push_str(&format!(
        "<p class=\"meta\">Attempt <code>{}</code> | started {} | finished {}</p>\n",
        summary.attempt_id,
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        finished,
    ));
    html.push_str("</header>\n");

    // Dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<ul class=\"stats\">\n");
    html.push_str(&format!(
        "<li><strong>Result:</strong> <span class=\"{}\">{}</span></li>\n",
        outcome_class(summary),
        html_escape(&summary.end_label())
    ));
    html.push_str(&format!(
        "<li><strong>Answered:</strong> {}/{} ({:.1}%)</li>\n",
        summary.answered_questions(),
        summary.total_questions(),
        summary.completion_rate() * 100.0
    ));
    html.push_str(&format!(
        "<li><strong>Flagged:</strong> {}</li>\n",
        summary.flagged.len()
    ));
    html.push_str(&format!(
        "<li><strong>Time used:</strong> {} of {}</li>\n",
        clock(summary.seconds_used),
        clock(summary.duration_secs)
    ));
    html.push_str("</ul>\n");

    if !summary.sections.is_empty() {
        html.push_str(&generate_section_chart(&summary.sections));
    }
    html.push_str("</section>\n");

    // Per-section table
    html.push_str("<section class=\"sections\">\n");
    html.push_str("<h2>Sections</h2>\n");
    html.push_str("<table id=\"sections\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Phase</th><th onclick=\"sortTable(1)\">Section</th><th onclick=\"sortTable(2)\">Category</th><th onclick=\"sortTable(3)\">Answered</th><th onclick=\"sortTable(4)\">Flagged</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &summary.sections {
        let class = if s.answered == s.total { "pass" } else { "fail" };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}/{}</td><td>{}</td></tr>\n",
            html_escape(&s.phase),
            html_escape(&s.section),
            s.category,
            class,
            s.answered,
            s.total,
            s.flagged
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    if !summary.unanswered.is_empty() || !summary.flagged.is_empty() {
        html.push_str("<section class=\"review\">\n");
        push_id_list(&mut html, "Unanswered", &summary.unanswered);
        push_id_list(&mut html, "Flagged for review", &summary.flagged);
        html.push_str("</section>\n");
    }

    // Recorded answers
    html.push_str("<section class=\"answers\">\n");
    html.push_str("<h2>Answers</h2>\n");
    if summary.answers.is_empty() {
        html.push_str("<p class=\"meta\">No answers recorded.</p>\n");
    } else {
        html.push_str("<table>\n<thead><tr><th>Key</th><th>Answer</th></tr></thead>\n<tbody>\n");
        for (key, value) in &summary.answers {
            html.push_str(&format!(
                "<tr><td><code>{}</code></td><td>{}</td></tr>\n",
                html_escape(key),
                html_escape(&value.to_string())
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(summary).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(summary: &AttemptSummary, path: &Path) -> Result<()> {
    let html = generate_html(summary);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn outcome_class(summary: &AttemptSummary) -> &'static str {
    if summary.answered_questions() == summary.total_questions() {
        "pass"
    } else {
        "fail"
    }
}

fn clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn push_id_list(html: &mut String, heading: &str, ids: &[String]) {
    if ids.is_empty() {
        return;
    }
    html.push_str(&format!("<h3>{heading}</h3>\n<ul>\n"));
    for id in ids {
        html.push_str(&format!("<li><code>{}</code></li>\n", html_escape(id)));
    }
    html.push_str("</ul>\n");
}

/// Horizontal bars of per-section completion.
fn generate_section_chart(sections: &[SectionSummary]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 240;

    let total_height = sections.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, s) in sections.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let ratio = if s.total == 0 {
            0.0
        } else {
            s.answered as f64 / s.total as f64
        };
        let width = (ratio * max_width as f64) as usize;

        let color = if ratio >= 1.0 {
            "#22c55e"
        } else if ratio >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"13\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{} / {}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&s.phase),
            html_escape(&s.section)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}/{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            s.answered,
            s.total
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.stats { list-style: none; padding: 0; display: flex; gap: 2rem; flex-wrap: wrap; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('sections');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
