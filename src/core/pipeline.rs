use crate::config::ApiConfig;
use crate::core::fetch::Fetcher;
use crate::core::{OutputBundle, Pipeline, Record, Storage};
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

pub struct FetchPipeline<S: Storage> {
    storage: S,
    config: ApiConfig,
    fetcher: Fetcher,
}

impl<S: Storage> FetchPipeline<S> {
    pub fn new(storage: S, config: ApiConfig) -> Self {
        Self {
            storage,
            config,
            fetcher: Fetcher::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for FetchPipeline<S> {
    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::info!("Processing {}...", self.config.name);
        self.fetcher.fetch(&self.config).await
    }

    async fn transform(&self, records: Vec<Record>) -> Result<OutputBundle> {
        let json_output = to_pretty_json(&records)?;
        let csv_output = to_csv(&records)?;
        let stem = output_stem(&self.config);

        Ok(OutputBundle {
            json_filename: format!("{}.json", stem),
            csv_filename: format!("{}.csv", stem),
            records,
            json_output,
            csv_output,
        })
    }

    async fn load(&self, bundle: OutputBundle) -> Result<String> {
        self.storage
            .write_file(&bundle.json_filename, bundle.json_output.as_bytes())
            .await?;
        tracing::info!("Data saved to {}", bundle.json_filename);

        self.storage
            .write_file(&bundle.csv_filename, bundle.csv_output.as_bytes())
            .await?;
        tracing::info!("Data saved to {}", bundle.csv_filename);

        Ok(bundle.json_filename)
    }
}

/// Filename stem `<name>_orders_<start>_to_<end>`, with colons (from precise
/// timestamps) replaced by underscores and stray leading/trailing underscores
/// stripped so the name stays filesystem-safe across platforms.
fn output_stem(config: &ApiConfig) -> String {
    let start = config.start_date.as_deref().unwrap_or("");
    let end = config.end_date.as_deref().unwrap_or("");

    let date_range = format!("{}_to_{}", start, end).replace(':', "_");
    let date_range = date_range.trim_matches('_');

    format!("{}_orders_{}", config.name, date_range)
        .trim_matches('_')
        .to_string()
}

/// Pretty-prints the result set with 4-space indentation.
fn to_pretty_json(records: &[Record]) -> Result<String> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer).expect("serde_json emits UTF-8"))
}

/// Flattens the result set into CSV. Columns are the union of all record
/// keys in first-appearance order; missing fields become empty cells and
/// nested values are written as JSON text.
fn to_csv(records: &[Record]) -> Result<String> {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for record in records {
        for key in record.data.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| render_cell(record.data.get(column)))
            .collect();
        writer.write_record(&row)?;
    }

    let buffer = writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("CSV buffer flush failed: {}", e),
    })?;
    Ok(String::from_utf8(buffer).expect("csv emits UTF-8"))
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(nested) => nested.to_string(),
    }
}
