//! Registry snapshots and mapping output.
//!
//! A snapshot carries the used-name sets between runs as
//! `{"usernames": [...], "group_names": [...]}`. Paths ending in `.gz` are
//! gzip-compressed.

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::registry::{InMemoryStore, NameSet, NameStore, GROUP_NAMES_KEY, USERNAMES_KEY};
use crate::sanitize::fold_key;
use crate::ResolvedName;

fn is_gzip(path: &Path) -> bool {
	path.extension().map(|ext| ext == "gz").unwrap_or(false)
}

fn read_names(json: &Value, key: &str) -> Result<NameSet> {
	match json.get(key) {
		None | Some(Value::Null) => Ok(NameSet::new()),
		Some(Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str()
					.map(fold_key)
					.ok_or_else(|| anyhow::anyhow!("'{}' entries must be strings", key))
			})
			.collect::<Result<NameSet>>(),
		Some(_) => bail!("'{}' must be an array", key),
	}
}

/// Parse snapshot JSON into a fresh store.
pub fn parse_snapshot(content: &str) -> Result<InMemoryStore> {
	let json: Value = serde_json::from_str(content)?;
	if !json.is_object() {
		bail!("snapshot must be a JSON object");
	}

	let store = InMemoryStore::new();
	store.insert_set(USERNAMES_KEY, read_names(&json, USERNAMES_KEY)?);
	store.insert_set(GROUP_NAMES_KEY, read_names(&json, GROUP_NAMES_KEY)?);
	Ok(store)
}

/// Load a snapshot file. A missing file yields an empty store.
pub fn load_snapshot(path: &Path) -> Result<InMemoryStore> {
	if !path.exists() {
		return Ok(InMemoryStore::new());
	}

	let content = if is_gzip(path) {
		let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
		let mut content = String::new();
		GzDecoder::new(file)
			.read_to_string(&mut content)
			.with_context(|| format!("Failed to decompress {}", path.display()))?;
		content
	} else {
		fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
	};

	parse_snapshot(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Render the store's sets as snapshot JSON (sorted, for stable diffs).
pub fn snapshot_content(store: &dyn NameStore) -> String {
	let snapshot = json!({
		USERNAMES_KEY: store.load(USERNAMES_KEY).to_sorted_vec(),
		GROUP_NAMES_KEY: store.load(GROUP_NAMES_KEY).to_sorted_vec(),
	});
	let mut content = snapshot.to_string();
	content.push('\n');
	content
}

/// Write the store's sets to a snapshot file.
pub fn save_snapshot(path: &Path, store: &dyn NameStore) -> Result<()> {
	let content = snapshot_content(store);

	if is_gzip(path) {
		let file =
			File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
		let mut encoder = GzEncoder::new(file, Compression::default());
		encoder.write_all(content.as_bytes())?;
		encoder.finish()?;
	} else {
		fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
	}

	Ok(())
}

/// Write one `raw<TAB>resolved` line per record.
pub fn write_mapping<W: Write>(out: W, raws: &[String], resolved: &[ResolvedName]) -> Result<()> {
	let mut out = BufWriter::new(out);
	for (raw, resolved) in raws.iter().zip(resolved) {
		// Tabs and newlines in the raw name would break the format
		let raw = raw.replace(['\t', '\n', '\r'], " ");
		writeln!(out, "{}\t{}", raw, resolved.name)?;
	}
	out.flush()?;
	Ok(())
}
