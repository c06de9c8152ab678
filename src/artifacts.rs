//! Synthetic bait files.
//!
//! Every artifact is well-formed for its format and entirely meaningless.

use crate::error::{Result, TarpitError};
use crate::render::escape;
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A generated file ready to be served.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Formats with a dedicated generator. Anything else is served as plain text.
pub const KNOWN_FORMATS: &[&str] = &["pdf", "csv", "json", "xml", "zip"];

/// Builds bait files by format.
#[derive(Debug, Clone)]
pub struct ArtifactGenerator {
    /// Rows in a standalone CSV
    pub csv_rows: usize,
    /// Rows in the CSV bundled inside archives
    pub archive_csv_rows: usize,
}

impl Default for ArtifactGenerator {
    fn default() -> Self {
        Self {
            csv_rows: 500,
            archive_csv_rows: 100,
        }
    }
}

impl ArtifactGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate an artifact for a file extension.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        format: &str,
        archetype_id: &str,
        keywords: &[String],
        rng: &mut R,
    ) -> Result<Artifact> {
        let format = format.to_ascii_lowercase();
        let artifact = match format.as_str() {
            "pdf" => Artifact {
                bytes: pdf(archetype_id, keywords),
                content_type: "application/pdf",
                filename: format!("generated_{archetype_id}_data.pdf"),
            },
            "csv" => Artifact {
                bytes: csv(self.csv_rows, rng)?.into_bytes(),
                content_type: "text/csv",
                filename: format!("generated_{archetype_id}_data.csv"),
            },
            "json" => Artifact {
                bytes: serde_json::to_vec_pretty(&json_feed(rng))?,
                content_type: "application/json",
                filename: format!("generated_{archetype_id}_data.json"),
            },
            "xml" => Artifact {
                bytes: xml(rng).into_bytes(),
                content_type: "application/xml",
                filename: format!("generated_{archetype_id}_data.xml"),
            },
            "zip" => Artifact {
                bytes: self.archive(archetype_id, keywords, rng)?,
                content_type: "application/zip",
                filename: format!("{archetype_id}_dataset_collection.zip"),
            },
            _ => Artifact {
                bytes: text(archetype_id, keywords).into_bytes(),
                content_type: "text/plain; charset=utf-8",
                filename: format!("generated_{archetype_id}_data.txt"),
            },
        };
        Ok(artifact)
    }

    fn archive<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        keywords: &[String],
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        let zip_err = |e: zip::result::ZipError| TarpitError::artifact("zip", e);
        let io_err = |e: std::io::Error| TarpitError::artifact("zip", e);

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        let readme = format!(
            "# {} Dataset Collection\nGenerated: {}\nPurpose: Research and analysis\nFiles: {archetype_id}_users.csv, {archetype_id}_data.json, {archetype_id}_metadata.json\n\nThis dataset contains algorithmically generated data for research purposes.\n",
            archetype_id.to_uppercase(),
            Utc::now().to_rfc3339()
        );
        let metadata = json!({
            "generated_at": Utc::now().to_rfc3339(),
            "archetype": archetype_id,
            "file_count": 3,
            "data_type": "synthetic",
            "keywords": keywords.iter().take(10).collect::<Vec<_>>(),
        });

        let entries: [(String, Vec<u8>); 4] = [
            (
                format!("{archetype_id}_users.csv"),
                csv(self.archive_csv_rows, rng)?.into_bytes(),
            ),
            (
                format!("{archetype_id}_data.json"),
                serde_json::to_vec_pretty(&json_feed(rng))?,
            ),
            ("README.txt".to_string(), readme.into_bytes()),
            (
                format!("{archetype_id}_metadata.json"),
                serde_json::to_vec_pretty(&metadata)?,
            ),
        ];

        for (name, bytes) in entries {
            writer.start_file(name, options).map_err(zip_err)?;
            writer.write_all(&bytes).map_err(io_err)?;
        }
        Ok(writer.finish().map_err(zip_err)?.into_inner())
    }
}

fn csv<R: Rng + ?Sized>(rows: usize, rng: &mut R) -> Result<String> {
    let now = Utc::now();
    let mut lines = Vec::with_capacity(rows + 1);
    lines.push("user_id,username,email,signup_date,last_login,activity_score,preferences".to_string());
    for i in 0..rows {
        let username = format!("user_{}", rng.gen_range(1000..10000));
        let signup = now - Duration::days(rng.gen_range(0..=365));
        let login = now - Duration::hours(rng.gen_range(0..=24));
        let theme = ["dark", "light"].choose(rng);
        let prefs = serde_json::to_string(&json!({
            "theme": theme,
            "notifications": rng.gen_bool(0.5),
        }))?;
        lines.push(format!(
            "USER{},{username},{username}@example.com,{},{},{},\"{}\"",
            10000 + i,
            signup.format("%Y-%m-%d"),
            login.format("%Y-%m-%d %H:%M:%S"),
            rng.gen_range(0..=100),
            prefs.replace('"', "\"\"")
        ));
    }
    Ok(lines.join("\n"))
}

fn json_feed<R: Rng + ?Sized>(rng: &mut R) -> serde_json::Value {
    let now = Utc::now();
    let users: Vec<_> = (0..50)
        .map(|i| {
            let preferences = ["dark", "light", "auto"].choose(rng);
            let language = ["en", "es", "fr", "de"].choose(rng);
            json!({
                "id": i,
                "name": format!("User {i}"),
                "email": format!("user{i}@example.com"),
                "created_at": (now - Duration::days(rng.gen_range(0..=365))).to_rfc3339(),
                "metadata": {
                    "preferences": preferences,
                    "notifications": rng.gen_bool(0.5),
                    "language": language,
                },
            })
        })
        .collect();
    json!({
        "status": "success",
        "data": {
            "users": users,
            "pagination": {
                "page": 1,
                "total_pages": 100,
                "total_items": 5000,
                "next_page": "/api/data?page=2",
            },
        },
        "generated_at": now.to_rfc3339(),
        "version": "2.0.1",
    })
}

fn xml<R: Rng + ?Sized>(rng: &mut R) -> String {
    let now = Utc::now().to_rfc3339();
    let mut out = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<data_feed version=\"1.0\" generated=\"{now}\">\n");
    for i in 0..20 {
        let category = ["news", "research", "data", "analysis"]
            .choose(rng)
            .copied()
            .unwrap_or("data");
        out.push_str(&format!(
            "  <item><id>{}</id><title>Generated Content Item {}</title><description>{}</description><timestamp>{now}</timestamp><category>{category}</category></item>\n",
            1000 + i,
            i + 1,
            escape("Algorithmically generated content & analysis for research purposes.")
        ));
    }
    out.push_str("</data_feed>\n");
    out
}

fn text(archetype_id: &str, keywords: &[String]) -> String {
    let keywords: Vec<&str> = keywords.iter().take(5).map(String::as_str).collect();
    format!(
        "Data export for {archetype_id} crawlers\nGenerated: {}\nKeywords: {}\n",
        Utc::now().to_rfc3339(),
        keywords.join(", ")
    )
}

/// Single-page PDF with a valid cross-reference table.
fn pdf(archetype_id: &str, keywords: &[String]) -> Vec<u8> {
    let mut lines = vec![
        "RESEARCH DATASET SUMMARY".to_string(),
        format!("Collection: {archetype_id}"),
    ];
    if !keywords.is_empty() {
        let topics: Vec<&str> = keywords.iter().take(6).map(String::as_str).collect();
        lines.push(format!("Topics: {}", topics.join(", ")));
    }
    lines.push("All records in this document are generated algorithmically.".to_string());

    let mut stream = String::from("BT\n/F1 12 Tf\n50 700 Td\n");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            stream.push_str("0 -20 Td\n");
        }
        stream.push_str(&format!("({}) Tj\n", pdf_string(line)));
    }
    stream.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
        format!("<< /Length {} >>\nstream\n{stream}\nendstream", stream.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }
    let xref = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    ));
    out.into_bytes()
}

/// PDF literal strings are ASCII here; parentheses and backslashes need escaping.
fn pdf_string(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .fold(String::new(), |mut s, c| {
            if matches!(c, '(' | ')' | '\\') {
                s.push('\\');
            }
            s.push(c);
            s
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Read;

    fn keywords() -> Vec<String> {
        vec!["dataset".into(), "benchmark (v2)".into()]
    }

    fn generate(format: &str) -> Artifact {
        ArtifactGenerator::new()
            .generate(format, "model-trainer", &keywords(), &mut StdRng::seed_from_u64(1))
            .unwrap()
    }

    #[test]
    fn test_content_types() {
        assert_eq!(generate("pdf").content_type, "application/pdf");
        assert_eq!(generate("csv").content_type, "text/csv");
        assert_eq!(generate("json").content_type, "application/json");
        assert_eq!(generate("xml").content_type, "application/xml");
        assert_eq!(generate("zip").content_type, "application/zip");
        assert_eq!(generate("mp4").content_type, "text/plain; charset=utf-8");
        assert_eq!(generate("PDF").content_type, "application/pdf");
    }

    #[test]
    fn test_unknown_format_is_plain_text() {
        let artifact = generate("exe");
        assert_eq!(artifact.filename, "generated_model-trainer_data.txt");
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("dataset, benchmark (v2)"));
    }

    #[test]
    fn test_pdf_structure() {
        let bytes = generate("pdf").bytes;
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("benchmark \\(v2\\)"));

        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[startxref..].starts_with("xref"));
    }

    #[test]
    fn test_csv_rows() {
        let artifact = ArtifactGenerator {
            csv_rows: 10,
            ..Default::default()
        }
        .generate("csv", "shopping-bot", &keywords(), &mut StdRng::seed_from_u64(2))
        .unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert_eq!(text.lines().count(), 11);
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("USER10000,"));
        assert!(row.contains(r#"""theme"":""dark""#) || row.contains(r#"""theme"":""light""#));
    }

    #[test]
    fn test_json_and_xml_are_well_formed() {
        let value: serde_json::Value = serde_json::from_slice(&generate("json").bytes).unwrap();
        assert_eq!(value["data"]["users"].as_array().unwrap().len(), 50);
        let metadata = &value["data"]["users"][0]["metadata"];
        assert!(["dark", "light", "auto"].contains(&metadata["preferences"].as_str().unwrap()));
        assert!(["en", "es", "fr", "de"].contains(&metadata["language"].as_str().unwrap()));

        let xml = String::from_utf8(generate("xml").bytes).unwrap();
        assert_eq!(xml.matches("<item>").count(), 20);
        assert!(xml.contains("&amp;"));
    }

    #[test]
    fn test_zip_contents() {
        let bytes = generate("zip").bytes;
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 4);

        let mut readme = String::new();
        archive
            .by_name("README.txt")
            .unwrap()
            .read_to_string(&mut readme)
            .unwrap();
        assert!(readme.contains("MODEL-TRAINER Dataset Collection"));

        let mut metadata = String::new();
        archive
            .by_name("model-trainer_metadata.json")
            .unwrap()
            .read_to_string(&mut metadata)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&metadata).unwrap();
        assert_eq!(value["keywords"][0], "dataset");
    }
}
