use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use ragsearch::processing::Document;
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "index-documents",
    about = "Upload JSON Lines or JSON array documents to a ragsearch server"
)]
struct Cli {
    /// File holding one JSON object per line, or a single JSON array of objects.
    #[arg(long)]
    input: PathBuf,
    /// Base URL of the ragsearch server.
    #[arg(long, env = "RAGSEARCH_URL", default_value = "http://127.0.0.1:8000")]
    server_url: String,
    /// Field holding the document id; the zero-based row number is used when absent.
    #[arg(long, default_value = "id")]
    id_field: String,
    /// Field holding the document body.
    #[arg(long, default_value = "body")]
    body_field: String,
    /// Field holding the source URL.
    #[arg(long, default_value = "url")]
    url_field: String,
    /// Documents per request.
    #[arg(long, default_value_t = 100)]
    batch_size: usize,
    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

struct FieldMapping<'a> {
    id: &'a str,
    body: &'a str,
    url: &'a str,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.batch_size == 0 {
        bail!("--batch-size must be greater than zero");
    }

    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let rows = parse_rows(&raw)?;
    let mapping = FieldMapping {
        id: &cli.id_field,
        body: &cli.body_field,
        url: &cli.url_field,
    };
    let documents = rows
        .iter()
        .enumerate()
        .map(|(position, row)| map_document(position, row, &mapping))
        .collect::<Result<Vec<_>>>()?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let endpoint = format!("{}/index/document", cli.server_url.trim_end_matches('/'));

    let mut uploaded = 0;
    for batch in documents.chunks(cli.batch_size) {
        let response = client
            .post(&endpoint)
            .json(batch)
            .send()
            .await
            .with_context(|| format!("Failed to reach {endpoint}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Server rejected batch ({status}): {body}");
        }
        uploaded += batch.len();
        println!("Uploaded: {uploaded}/{}", documents.len());
    }
    Ok(())
}

fn parse_rows(raw: &str) -> Result<Vec<Value>> {
    if raw.trim_start().starts_with('[') {
        let rows: Vec<Value> = serde_json::from_str(raw).context("Invalid JSON array")?;
        return Ok(rows);
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", line_no + 1))
        })
        .collect()
}

fn map_document(position: usize, row: &Value, mapping: &FieldMapping<'_>) -> Result<Document> {
    let id = match row.get(mapping.id) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Number(value)) => value.to_string(),
        Some(Value::Null) | None => position.to_string(),
        Some(other) => bail!("Row {position}: unsupported id value {other}"),
    };
    let body = row
        .get(mapping.body)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Row {position}: missing string field '{}'", mapping.body))?
        .to_string();
    let url = row
        .get(mapping.url)
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(Document { id, body, url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAPPING: FieldMapping<'static> = FieldMapping {
        id: "id",
        body: "text",
        url: "url",
    };

    #[test]
    fn parses_json_lines_and_arrays() {
        let lines = "{\"text\": \"a\"}\n\n{\"text\": \"b\"}\n";
        assert_eq!(parse_rows(lines).expect("lines").len(), 2);

        let array = "[{\"text\": \"a\"}, {\"text\": \"b\"}, {\"text\": \"c\"}]";
        assert_eq!(parse_rows(array).expect("array").len(), 3);

        assert!(parse_rows("{not json}").is_err());
    }

    #[test]
    fn row_number_is_the_fallback_id() {
        let document = map_document(3, &json!({ "text": "body" }), &MAPPING).expect("doc");
        assert_eq!(document.id, "3");
        assert_eq!(document.url, None);
    }

    #[test]
    fn numeric_ids_and_urls_are_mapped() {
        let row = json!({ "id": 42, "text": "body", "url": "http://bbc.co.uk/a" });
        let document = map_document(0, &row, &MAPPING).expect("doc");
        assert_eq!(document.id, "42");
        assert_eq!(document.body, "body");
        assert_eq!(document.url.as_deref(), Some("http://bbc.co.uk/a"));
    }

    #[test]
    fn missing_body_is_an_error() {
        assert!(map_document(0, &json!({ "id": "1" }), &MAPPING).is_err());
    }
}
