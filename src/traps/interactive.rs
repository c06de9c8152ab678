//! Interactive trap widgets.
//!
//! Buttons, forms and links whose actions lead back into the download, API and
//! content surfaces, plus a script that keeps script-executing agents busy.

use super::slug;
use crate::archetypes::{ids, ArchetypeSignature};
use crate::content::generator::pick;
use crate::error::Result;
use crate::render::escape;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

static BUTTON_STYLES: &[&str] = &[
    "padding:10px 20px;background:#3498db;color:white;border:none;border-radius:5px;cursor:pointer;",
    "padding:12px 24px;background:#2ecc71;color:white;border:2px solid #27ae60;border-radius:8px;cursor:pointer;font-weight:bold;",
    "padding:8px 16px;background:#e74c3c;color:white;border:none;border-radius:3px;cursor:pointer;text-transform:uppercase;",
];

static FORM_STYLES: &[&str] = &[
    "padding:20px;background:#f8f9fa;border:1px solid #dee2e6;border-radius:10px;",
    "padding:30px;background:white;box-shadow:0 4px 6px rgba(0,0,0,0.1);border-radius:15px;",
];

static DOWNLOAD_FORMATS: &[&str] = &["pdf", "csv", "json", "xml", "zip"];

/// Rendered interactive elements for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractiveWidgets {
    pub buttons: Vec<String>,
    pub forms: Vec<String>,
    pub links: Vec<String>,
    pub dynamic_block: String,
    pub script: String,
}

impl InteractiveWidgets {
    /// Generate widgets themed for `archetype_id`.
    pub fn generate<R: Rng + ?Sized>(
        archetype_id: &str,
        signature: Option<&ArchetypeSignature>,
        keywords: &[String],
        rng: &mut R,
    ) -> Result<Self> {
        let slugs: Vec<String> = keywords.iter().map(|k| slug(k)).collect();
        let arch = slug(archetype_id);

        let buttons = (0..rng.gen_range(3..=7))
            .map(|_| button(&arch, &slugs, rng))
            .collect();

        let kinds = form_kinds(archetype_id);
        let forms = kinds
            .choose_multiple(rng, kinds.len().min(2))
            .map(|kind| form(kind, &arch, keywords, rng))
            .collect();

        let links = links(&arch, signature, keywords, &slugs, rng);
        let dynamic_block = dynamic_block(&arch, keywords, rng)?;
        let script = script(&arch, keywords)?;

        Ok(Self {
            buttons,
            forms,
            links,
            dynamic_block,
            script,
        })
    }
}

fn button_captions(archetype_id: &str) -> &'static [&'static str] {
    match archetype_id {
        ids::VIDEO_PLATFORM => &["View Video", "Like Content", "Share Now", "Play Sound", "Trending"],
        ids::NEWS_CRAWLER => &["Read More", "Subscribe", "View Stats", "Analysis", "Latest"],
        ids::SHOPPING_BOT => &["Add to Cart", "Buy Now", "Add to Wishlist", "View Price", "Get Deal"],
        ids::MODEL_TRAINER => &["Download Dataset", "Train Model", "View Results", "Configure", "Deploy"],
        ids::ACADEMIC_CRAWLER => &["Read Paper", "Cite This", "Abstract", "Methodology", "Download PDF"],
        _ => &["Click Here", "Learn More", "Download", "View Details"],
    }
}

fn form_kinds(archetype_id: &str) -> &'static [&'static str] {
    match archetype_id {
        ids::VIDEO_PLATFORM => &["video_upload", "comment_form", "hashtag_suggestion", "challenge_participation"],
        ids::NEWS_CRAWLER => &["newsletter_signup", "comment_form", "tip_submission", "reader_poll"],
        ids::SHOPPING_BOT => &["checkout_form", "newsletter_signup", "review_form", "wishlist_add"],
        ids::MODEL_TRAINER => &["dataset_request", "model_training", "api_key_request", "feedback_form"],
        ids::ACADEMIC_CRAWLER => &["paper_submission", "citation_request", "data_request", "peer_review"],
        _ => &["contact_form", "signup_form", "feedback_form"],
    }
}

/// (name, label, input type, placeholder)
type Field = (&'static str, &'static str, &'static str, &'static str);

fn form_fields(kind: &str) -> &'static [Field] {
    match kind {
        "newsletter_signup" => &[
            ("email", "Email Address", "email", "Enter your email"),
            ("name", "Full Name", "text", "Your name"),
        ],
        "comment_form" => &[
            ("comment", "Your Comment", "textarea", "Share your thoughts..."),
            ("name", "Name (optional)", "text", ""),
            ("email", "Email (optional)", "email", ""),
        ],
        "dataset_request" => &[
            ("purpose", "Research Purpose", "textarea", "Describe your research..."),
            ("institution", "Institution", "text", "University/Company"),
            ("email", "Academic Email", "email", ""),
            ("dataset_type", "Dataset Type", "select", ""),
        ],
        "checkout_form" => &[
            ("name", "Full Name", "text", ""),
            ("address", "Shipping Address", "textarea", ""),
            ("card", "Card Number", "text", "XXXX-XXXX-XXXX-XXXX"),
            ("expiry", "Expiry Date", "text", "MM/YY"),
        ],
        _ => &[
            ("input1", "Field 1", "text", "Enter text"),
            ("input2", "Field 2", "email", "Email address"),
        ],
    }
}

fn button<R: Rng + ?Sized>(arch: &str, slugs: &[String], rng: &mut R) -> String {
    let caption = pick(rng, button_captions(arch));
    let style = pick(rng, BUTTON_STYLES);
    let keyword = &slugs[rng.gen_range(0..slugs.len())];
    let action = match rng.gen_range(0..5) {
        0 => format!("window.location.href='/download/{arch}/{keyword}.pdf'"),
        1 => format!("fetch('/api/data?archetype={arch}').then(r => r.json()).then(console.log)"),
        2 => format!("localStorage.setItem('tp_{arch}', Date.now())"),
        3 => format!("document.cookie='tp_interaction={arch}_'+Date.now()+'; path=/'"),
        _ => format!("window.open('/{arch}/page/{}', '_blank')", rng.gen_range(1..=100)),
    };
    format!(r#"<button style="{style}" onclick="{action}" data-archetype="{arch}">{caption}</button>"#)
}

fn form<R: Rng + ?Sized>(kind: &str, arch: &str, keywords: &[String], rng: &mut R) -> String {
    let digest = Sha256::digest(format!("{kind}-{arch}").as_bytes());
    let form_id = format!("form-{}", &hex::encode(digest)[..8]);
    let style = pick(rng, FORM_STYLES);
    let heading = kind
        .split('_')
        .map(crate::content::lexicon::title_case)
        .collect::<Vec<_>>()
        .join(" ");

    let mut html = format!("<div style=\"{style}\" id=\"{form_id}\">\n<h3>{heading}</h3>\n");
    for (name, label, input, placeholder) in form_fields(kind) {
        let field = match *input {
            "textarea" => format!(
                r#"<textarea name="{name}" placeholder="{placeholder}" rows="3" style="width:100%;"></textarea>"#
            ),
            "select" => format!(
                r#"<select name="{name}" style="width:100%;padding:8px;"><option value="training">Training</option><option value="validation">Validation</option><option value="test">Test</option></select>"#
            ),
            _ => format!(
                r#"<input type="{input}" name="{name}" placeholder="{placeholder}" style="width:100%;padding:8px;margin:5px 0;">"#
            ),
        };
        html.push_str(&format!("<div><label>{label}:</label><br>{field}</div>\n"));
    }

    let keyword = escape(&keywords[rng.gen_range(0..keywords.len())].replace(['\'', '\\'], ""));
    html.push_str(&format!(
        "<br><button onclick=\"document.getElementById('{form_id}').innerHTML='<p>Thank you! Preparing {keyword} data...</p>'; \
         setTimeout(() => window.location.href='/download/{arch}/{kind}_bundle.zip', 2000);\" \
         style=\"padding:10px 20px;background:#007bff;color:white;border:none;border-radius:5px;\">Submit</button>\n</div>"
    ));
    html
}

fn links<R: Rng + ?Sized>(
    arch: &str,
    signature: Option<&ArchetypeSignature>,
    keywords: &[String],
    slugs: &[String],
    rng: &mut R,
) -> Vec<String> {
    let fallback = ["page", "section", "item", "resource"].map(String::from);
    let kinds: &[String] = match signature {
        Some(s) if !s.content_affinities.is_empty() => &s.content_affinities,
        _ => &fallback,
    };

    let mut links = Vec::new();
    for i in 0..rng.gen_range(5..=15) {
        let kind = &kinds[rng.gen_range(0..kinds.len())];
        let at = rng.gen_range(0..keywords.len());
        links.push(format!(
            r#"<a href="/{arch}/{kind}/{slug}_{i}" class="interactive-link" data-archetype="{arch}" data-type="{kind}">{label} {kind_label} {n}</a>"#,
            kind = slug(kind),
            slug = slugs[at],
            label = escape(&crate::content::lexicon::title_case(&keywords[at])),
            kind_label = crate::content::lexicon::title_case(kind),
            n = i + 1,
        ));
    }

    for _ in 0..rng.gen_range(2..=5) {
        let format = pick(rng, DOWNLOAD_FORMATS);
        let at = rng.gen_range(0..keywords.len());
        links.push(format!(
            r#"<a href="/download/{arch}/{slug}_dataset.{format}" class="download-link" data-archetype="{arch}" data-filetype="{format}">Download {label} Data ({upper})</a>"#,
            slug = slugs[at],
            label = escape(&crate::content::lexicon::title_case(&keywords[at])),
            upper = format.to_uppercase(),
        ));
    }
    links
}

fn dynamic_block<R: Rng + ?Sized>(arch: &str, keywords: &[String], rng: &mut R) -> Result<String> {
    let id = format!("dynamic-content-{}", rng.gen_range(1000..10000));
    let keyword = escape(&keywords[rng.gen_range(0..keywords.len())]);
    let keywords_json = serde_json::to_string(keywords)?;
    Ok(format!(
        r#"<div id="{id}" class="tp-dynamic">
<h4>Live Updates</h4>
<div id="{id}-updates"><p>Initializing {keyword} data stream...</p></div>
<button onclick="tpRefresh('{id}')">Refresh Data</button>
</div>
<script>
function tpRefresh(id) {{
  var keywords = {keywords_json};
  var html = '';
  for (var i = 0; i < 3; i++) {{
    var k = keywords[Math.floor(Math.random() * keywords.length)];
    html += '<div><strong>' + k.toUpperCase() + ' UPDATE</strong><br>New data available at ' + new Date().toISOString() + '</div>';
  }}
  document.getElementById(id + '-updates').innerHTML = html;
  fetch('/api/data?refresh=' + id + '&archetype={arch}').catch(function() {{}});
}}
setInterval(function() {{ tpRefresh('{id}'); }}, 10000);
</script>"#
    ))
}

fn script(arch: &str, keywords: &[String]) -> Result<String> {
    let keywords_json = serde_json::to_string(keywords)?;
    Ok(format!(
        r#"<script>
document.addEventListener('DOMContentLoaded', function() {{
  setInterval(function() {{
    fetch('/api/analytics/track', {{
      method: 'POST',
      headers: {{'Content-Type': 'application/json'}},
      body: JSON.stringify({{archetype: '{arch}', keywords: {keywords_json}, page: window.location.pathname, at: new Date().toISOString()}})
    }}).catch(function() {{}});
  }}, 5000);
  function loadMore() {{
    var container = document.createElement('div');
    container.innerHTML = '<p>Loading more content...</p>';
    document.body.appendChild(container);
    setTimeout(function() {{
      container.innerHTML = '<h4>Additional Content Loaded</h4><a href="/api/data?archetype={arch}">More</a>';
    }}, 1000);
  }}
  setTimeout(loadMore, 2000);
  document.cookie = 'tp_visited_{arch}=true; path=/; max-age=86400';
}});
</script>"#
    ))
}
