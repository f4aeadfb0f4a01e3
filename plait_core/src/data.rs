use std::path::Path;

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

use crate::PlaitError;
use crate::PlaitResult;

/// Read a data file, inferring its format from the file extension.
pub fn load_data_file(path: &Path) -> PlaitResult<Value> {
	let format = path
		.extension()
		.and_then(|extension| extension.to_str())
		.unwrap_or("")
		.to_ascii_lowercase();

	load_data_file_as(path, &format)
}

/// Read a data file in an explicit format.
pub fn load_data_file_as(path: &Path, format: &str) -> PlaitResult<Value> {
	let path_display = path.display().to_string();
	let content = std::fs::read_to_string(path).map_err(|e| {
		PlaitError::DataFile {
			path: path_display.clone(),
			reason: e.to_string(),
		}
	})?;

	tracing::debug!(path = %path_display, format, "loading data file");
	parse_data_file(&content, format.trim(), &path_display)
}

/// Parse a data file's content into a `serde_json::Value` based on its
/// format.
pub fn parse_data_file(content: &str, format: &str, path_display: &str) -> PlaitResult<Value> {
	let data_error = |reason: String| {
		PlaitError::DataFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format.to_ascii_lowercase().as_str() {
		"text" | "string" | "raw" | "txt" => Ok(Value::String(content.to_string())),
		"json" => serde_json::from_str(content).map_err(|e| data_error(e.to_string())),
		"toml" => {
			let toml_value: toml::Value =
				toml::from_str(content).map_err(|e| data_error(e.to_string()))?;
			toml_to_json(toml_value, path_display)
		}
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| data_error(e.to_string())),
		"kdl" => {
			let doc: kdl::KdlDocument = content
				.parse()
				.map_err(|e: kdl::KdlError| data_error(e.to_string()))?;
			kdl_document_to_value(&doc, path_display)
		}
		"ini" => serde_ini::from_str(content).map_err(|e| data_error(e.to_string())),
		other => Err(PlaitError::UnsupportedDataFormat(other.to_string())),
	}
}

fn float_to_json(value: f64, path_display: &str) -> PlaitResult<Value> {
	Number::from_f64(value).map(Value::Number).ok_or_else(|| {
		PlaitError::UnconvertibleFloat {
			path: path_display.to_string(),
			value: value.to_string(),
		}
	})
}

/// Convert a `toml::Value` to a `serde_json::Value`.
pub(crate) fn toml_to_json(value: toml::Value, path_display: &str) -> PlaitResult<Value> {
	let json = match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::from(i),
		toml::Value::Float(f) => float_to_json(f, path_display)?,
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(arr) => {
			let items: PlaitResult<Vec<Value>> = arr
				.into_iter()
				.map(|v| toml_to_json(v, path_display))
				.collect();
			Value::Array(items?)
		}
		toml::Value::Table(table) => {
			let mut map = Map::new();
			for (k, v) in table {
				map.insert(k, toml_to_json(v, path_display)?);
			}
			Value::Object(map)
		}
	};

	Ok(json)
}

/// Convert a KDL document to a `serde_json::Value`.
fn kdl_document_to_value(doc: &kdl::KdlDocument, path_display: &str) -> PlaitResult<Value> {
	let mut map = Map::new();

	for node in doc.nodes() {
		let name = node.name().value().to_string();
		let value = kdl_node_to_value(node, path_display)?;
		map.insert(name, value);
	}

	Ok(Value::Object(map))
}

/// Convert a KDL node to a `serde_json::Value`.
fn kdl_node_to_value(node: &kdl::KdlNode, path_display: &str) -> PlaitResult<Value> {
	// children make an object
	if let Some(children) = node.children() {
		return kdl_document_to_value(children, path_display);
	}

	let entries: Vec<&kdl::KdlEntry> = node.entries().iter().collect();

	if entries.is_empty() {
		return Ok(Value::Null);
	}

	if entries.len() == 1 && entries[0].name().is_none() {
		return kdl_entry_value_to_json(entries[0].value(), path_display);
	}

	if entries.iter().all(|e| e.name().is_some()) {
		let mut map = Map::new();
		for entry in &entries {
			if let Some(name) = entry.name() {
				map.insert(
					name.value().to_string(),
					kdl_entry_value_to_json(entry.value(), path_display)?,
				);
			}
		}
		return Ok(Value::Object(map));
	}

	// mixed or multiple positional entries
	let values: PlaitResult<Vec<Value>> = entries
		.iter()
		.map(|e| kdl_entry_value_to_json(e.value(), path_display))
		.collect();
	Ok(Value::Array(values?))
}

/// Convert a KDL entry value to a `serde_json::Value`.
fn kdl_entry_value_to_json(value: &kdl::KdlValue, path_display: &str) -> PlaitResult<Value> {
	match value {
		kdl::KdlValue::String(s) => Ok(Value::String(s.clone())),
		kdl::KdlValue::Integer(i) => {
			match i64::try_from(*i) {
				Ok(integer) => Ok(Value::from(integer)),
				Err(_) => float_to_json(*i as f64, path_display),
			}
		}
		kdl::KdlValue::Float(f) => float_to_json(*f, path_display),
		kdl::KdlValue::Bool(b) => Ok(Value::Bool(*b)),
		kdl::KdlValue::Null => Ok(Value::Null),
	}
}
