//! Inspect command implementation.

use super::{load_store, CommandResult, Format};
use recpatch_core::{build_fingerprint, MemoryRecordStore, Record, RecordId, RecordStore};
use serde::Serialize;
use std::path::Path;

/// Table inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Table path.
    pub path: String,
    /// Store fingerprint.
    pub fingerprint: String,
    /// Number of records.
    pub record_count: usize,
    /// Number of active records.
    pub active_count: usize,
    /// Number of records carrying a script.
    pub script_count: usize,
    /// Records in pre-order.
    pub records: Vec<RecordSummary>,
}

/// One line of the record listing.
#[derive(Debug, Serialize)]
pub struct RecordSummary {
    /// Pre-order index.
    pub index: usize,
    /// Record ID.
    pub id: u64,
    /// Nesting depth, 0 for roots.
    pub depth: usize,
    /// Description.
    pub description: String,
    /// Variable type name.
    #[serde(rename = "type")]
    pub var_type: String,
    /// Address expression.
    pub address: String,
    /// Custom field names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<String>,
}

/// Inspects the table at `path`.
pub fn inspect(path: &Path) -> CommandResult<InspectResult> {
    let store = load_store(path)?;
    let records: Vec<RecordSummary> = store
        .ids()
        .into_iter()
        .enumerate()
        .filter_map(|(index, id)| store.record(id).map(|r| summarize(&store, index, r)))
        .collect();
    let all = || store.ids().into_iter().filter_map(|id| store.record(id));

    Ok(InspectResult {
        path: path.display().to_string(),
        fingerprint: build_fingerprint(&store)?.to_string(),
        record_count: records.len(),
        active_count: all().filter(|r| r.active).count(),
        script_count: all().filter(|r| r.script.is_some()).count(),
        records,
    })
}

fn summarize(store: &MemoryRecordStore, index: usize, record: &Record) -> RecordSummary {
    RecordSummary {
        index,
        id: record.id.as_u64(),
        depth: depth_of(store, record.id),
        description: record.description.clone(),
        var_type: record.var_type.name().to_string(),
        address: record.address.clone(),
        custom_fields: record.extra.keys().cloned().collect(),
    }
}

fn depth_of(store: &MemoryRecordStore, id: RecordId) -> usize {
    std::iter::successors(store.parent_of(id), |&parent| store.parent_of(parent)).count()
}

/// Runs the inspect command.
pub fn run(path: &Path, format: Format) -> CommandResult<()> {
    let result = inspect(path)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Record Table Inspection");
    println!("=======================");
    println!();
    println!("Path:        {}", result.path);
    println!("Fingerprint: {}", result.fingerprint);
    println!();
    println!("Records: {}", result.record_count);
    println!("  Active:  {}", result.active_count);
    println!("  Scripts: {}", result.script_count);
    println!();
    for record in &result.records {
        println!(
            "  [{:>3}] #{:<5} {}{} ({}){}",
            record.index,
            record.id,
            "  ".repeat(record.depth),
            record.description,
            record.var_type,
            if record.address.is_empty() {
                String::new()
            } else {
                format!(" @ {}", record.address)
            }
        );
    }
}
