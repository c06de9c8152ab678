//! HTML document assembly.

use crate::content::ContentEnvelope;
use crate::error::Result;
use crate::router::FormatOffer;
use crate::traps::TrapBundle;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Page served to humans and unclassified clients.
pub const HUMAN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Welcome</title>
</head>
<body>
<h1>Welcome</h1>
<p>This site is currently under maintenance. Please check back later.</p>
</body>
</html>
"#;

/// Footer stamped on every bot document.
#[derive(Debug, Clone, Copy)]
pub struct VisitFooter {
    pub generated_at: DateTime<Utc>,
    pub total_visits: u64,
}

impl VisitFooter {
    pub fn now(total_visits: u64) -> Self {
        Self {
            generated_at: Utc::now(),
            total_visits,
        }
    }
}

/// One row of a synthetic dataset index.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    pub name: String,
    pub path: String,
    pub size_kb: u32,
    pub records: u32,
}

/// Escape text for HTML element and attribute content.
pub fn escape(text: &str) -> String {
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

/// Assemble a trap document.
///
/// `lead` is an optional pre-rendered section placed above the article body.
pub fn bot_document(
    envelope: &ContentEnvelope,
    bundle: &TrapBundle,
    offers: &[FormatOffer],
    lead: Option<&str>,
    footer: &VisitFooter,
) -> Result<String> {
    let mut html = String::with_capacity(16 * 1024);

    writeln!(html, "<!DOCTYPE html>\n<html lang=\"en\">\n<head>")?;
    writeln!(html, "<meta charset=\"utf-8\">")?;
    writeln!(html, "<title>{}</title>", escape(&envelope.title))?;
    writeln!(
        html,
        "<meta name=\"description\" content=\"{}\">",
        escape(&envelope.keywords.join(", "))
    )?;
    for entry in &bundle.meta_entries {
        writeln!(html, "{}", entry.to_html())?;
    }
    for entry in &bundle.structured_data_entries {
        writeln!(
            html,
            "<script type=\"application/ld+json\">{}</script>",
            entry.to_json_ld()?
        )?;
    }
    writeln!(html, "</head>\n<body data-ref=\"{}\">", envelope.content_hash)?;

    writeln!(html, "<article>\n<h1>{}</h1>", escape(&envelope.title))?;
    if let Some(lead) = lead {
        writeln!(html, "{lead}")?;
    }
    for paragraph in envelope.paragraphs() {
        writeln!(html, "<p>{paragraph}</p>")?;
    }
    writeln!(html, "</article>")?;

    for block in &bundle.hidden_blocks {
        writeln!(html, "{block}")?;
    }

    if !offers.is_empty() {
        writeln!(html, "<section class=\"downloads\">\n<h2>Available Downloads</h2>\n<ul>")?;
        for offer in offers {
            writeln!(
                html,
                "<li><a href=\"{}\">{}</a> ({}) - {} data points, updated {} days ago</li>",
                escape(&offer.path),
                escape(&offer.label),
                offer.format.to_uppercase(),
                offer.data_points,
                offer.updated_days_ago
            )?;
        }
        writeln!(html, "</ul>\n</section>")?;
    }

    if let Some(widgets) = &bundle.interactive_widgets {
        writeln!(html, "<section class=\"tools\">")?;
        for button in &widgets.buttons {
            writeln!(html, "{button}")?;
        }
        for form in &widgets.forms {
            writeln!(html, "{form}")?;
        }
        writeln!(html, "<div class=\"resources\">")?;
        for link in &widgets.links {
            writeln!(html, "{link}<br>")?;
        }
        writeln!(html, "</div>\n{}\n</section>", widgets.dynamic_block)?;
    }

    writeln!(html, "<nav class=\"related\">")?;
    for (i, link) in bundle.recursive_links.iter().enumerate() {
        writeln!(html, "<a href=\"{}\">Related resource {}</a>", escape(link), i + 1)?;
    }
    writeln!(html, "</nav>")?;

    if let Some(frame) = &bundle.nested_frame {
        writeln!(html, "{}", frame.to_html())?;
    }

    writeln!(
        html,
        "<footer><small>Generated {} | Visit #{}</small></footer>",
        footer.generated_at.to_rfc3339(),
        footer.total_visits
    )?;

    if let Some(widgets) = &bundle.interactive_widgets {
        writeln!(html, "{}", widgets.script)?;
    }
    writeln!(html, "</body>\n</html>")?;

    Ok(html)
}

/// Index table for the data-listing routes.
pub fn listing_section(entries: &[ListingEntry]) -> Result<String> {
    let mut html = String::from("<section class=\"listing\">\n<h2>Dataset Index</h2>\n<table>\n");
    writeln!(html, "<tr><th>Name</th><th>Records</th><th>Size</th></tr>")?;
    for entry in entries {
        writeln!(
            html,
            "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{} KB</td></tr>",
            escape(&entry.path),
            escape(&entry.name),
            entry.records,
            entry.size_kb
        )?;
    }
    html.push_str("</table>\n</section>");
    Ok(html)
}

/// Acknowledgement shown after a form post, redirecting into a download.
pub fn submission_notice(download_path: &str) -> String {
    let path = escape(download_path);
    format!(
        r#"<section class="notice">
<h2>Submission received</h2>
<p>Thank you. Your request is being processed and your dataset will be ready shortly.</p>
<meta http-equiv="refresh" content="5;url={path}">
<div style="display:none"><a href="{path}">Download</a></div>
</section>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traps::{MetaEntry, NestedFrame};

    fn envelope() -> ContentEnvelope {
        ContentEnvelope {
            title: "Guide to <Data>".to_string(),
            body: "First <strong>data</strong> paragraph.\n\nSecond paragraph.".to_string(),
            keywords: vec!["data".to_string()],
            theme: "technical".to_string(),
            archetype_id: "model-trainer".to_string(),
            content_hash: "0123456789abcdef".to_string(),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_human_page_is_clean() {
        assert!(!HUMAN_PAGE.contains("tp-"));
        assert!(!HUMAN_PAGE.contains("/content/"));
        assert!(!HUMAN_PAGE.contains("display:none"));
        assert!(!HUMAN_PAGE.contains("<iframe"));
    }

    #[test]
    fn test_bot_document_layout() {
        let bundle = TrapBundle {
            hidden_blocks: vec!["<div class=\"tp-shadow\">data</div>".to_string()],
            meta_entries: vec![MetaEntry {
                name: "keywords".to_string(),
                content: "data".to_string(),
            }],
            recursive_links: vec!["/model-trainer/content/abc".to_string()],
            nested_frame: Some(NestedFrame {
                path: "/model-trainer/content/ff?depth=1".to_string(),
                remaining_depth: 1,
            }),
            ..Default::default()
        };
        let offers = vec![FormatOffer {
            format: "csv".to_string(),
            label: "Data Export".to_string(),
            path: "/download/model-trainer/data_export.csv".to_string(),
            data_points: 1200,
            updated_days_ago: 3,
        }];
        let footer = VisitFooter::now(42);

        let html = bot_document(&envelope(), &bundle, &offers, Some("<p>lead</p>"), &footer).unwrap();
        assert!(html.contains("<title>Guide to &lt;Data&gt;</title>"));
        assert!(html.contains("<meta name=\"keywords\" content=\"data\">"));
        assert!(html.contains("<p>First <strong>data</strong> paragraph.</p>"));
        assert!(html.contains("tp-shadow"));
        assert!(html.contains("/download/model-trainer/data_export.csv"));
        assert!(html.contains("?depth=1"));
        assert!(html.contains("Visit #42"));
        assert!(html.find("<p>lead</p>") < html.find("<p>First"));
    }

    #[test]
    fn test_listing_and_notice() {
        let listing = listing_section(&[ListingEntry {
            name: "set_1.csv".to_string(),
            path: "/download/x/set_1.csv".to_string(),
            size_kb: 12,
            records: 500,
        }])
        .unwrap();
        assert!(listing.contains("href=\"/download/x/set_1.csv\""));

        let notice = submission_notice("/download/x/submission_dataset.zip");
        assert!(notice.contains("url=/download/x/submission_dataset.zip"));
    }
}
