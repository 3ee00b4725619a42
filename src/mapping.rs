//! Schema-driven decoding of search entries into normalized records.
//!
//! An [`EntryMap`] describes how the raw attributes on a [`SearchEntry`] are
//! translated into a [`Record`]: which source attribute feeds which target
//! field, and whether the field collapses to a single string or keeps every
//! value. Every map implicitly carries `distinguishedName -> dn`, so a
//! decoded record always contains the entry's distinguished name under `dn`.

use std::collections::HashMap;

use ldap3::SearchEntry;

/// How the raw values of an attribute are decoded into a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
	/// Collapse to the first non-empty value, or the empty string.
	Single,
	/// Keep every non-empty value, in order.
	List,
}

/// One source attribute to target field decode rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
	/// The attribute name on the directory entry.
	pub source: String,
	/// The field name on the decoded record.
	pub target: String,
	/// How the attribute values are decoded.
	pub decode: Decode,
}

impl FieldMapping {
	/// Create a mapping with an explicit target name and decode strategy.
	pub fn new(source: impl Into<String>, target: impl Into<String>, decode: Decode) -> Self {
		Self { source: source.into(), target: target.into(), decode }
	}

	/// A [`Decode::Single`] mapping keeping the source name as target.
	pub fn single(source: impl Into<String>) -> Self {
		let source = source.into();
		Self { target: source.clone(), source, decode: Decode::Single }
	}

	/// A [`Decode::Single`] mapping with a renamed target.
	pub fn single_as(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self::new(source, target, Decode::Single)
	}

	/// A [`Decode::List`] mapping keeping the source name as target.
	pub fn list(source: impl Into<String>) -> Self {
		let source = source.into();
		Self { target: source.clone(), source, decode: Decode::List }
	}

	/// A [`Decode::List`] mapping with a renamed target.
	pub fn list_as(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self::new(source, target, Decode::List)
	}
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	/// A single string, possibly empty.
	One(String),
	/// An ordered sequence of strings, possibly empty.
	Many(Vec<String>),
}

/// A normalized record decoded from one directory entry.
///
/// Always contains the field `dn` holding the entry's distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
	fields: HashMap<String, Value>,
}

impl Record {
	/// The distinguished name of the entry this record was decoded from.
	#[must_use]
	pub fn dn(&self) -> &str {
		match self.fields.get("dn") {
			Some(Value::One(dn)) => dn,
			_ => "",
		}
	}

	/// Get a decoded field by target name.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.fields.get(name)
	}

	/// Get a [`Decode::Single`] field as a string slice.
	#[must_use]
	pub fn one(&self, name: &str) -> Option<&str> {
		match self.fields.get(name) {
			Some(Value::One(value)) => Some(value),
			_ => None,
		}
	}

	/// Get a [`Decode::List`] field as a slice of strings.
	#[must_use]
	pub fn many(&self, name: &str) -> Option<&[String]> {
		match self.fields.get(name) {
			Some(Value::Many(values)) => Some(values),
			_ => None,
		}
	}

	/// The number of fields on the record.
	#[must_use]
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Whether the record carries no fields.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}

/// An ordered set of [`FieldMapping`]s applied to search entries.
#[derive(Debug, Clone)]
pub struct EntryMap {
	/// The registered mappings, in registration order. The first entry is
	/// always `distinguishedName -> dn` and cannot be removed.
	mappings: Vec<FieldMapping>,
}

impl Default for EntryMap {
	fn default() -> Self {
		Self::new()
	}
}

impl EntryMap {
	/// Create a map containing only the implicit `distinguishedName -> dn`
	/// mapping.
	#[must_use]
	pub fn new() -> Self {
		Self { mappings: vec![FieldMapping::single_as("distinguishedName", "dn")] }
	}

	/// Create a map seeded with the given mappings, after the implicit `dn`
	/// mapping.
	pub fn with_mappings<I: IntoIterator<Item = FieldMapping>>(mappings: I) -> Self {
		let mut map = Self::new();
		for mapping in mappings {
			map.add(mapping);
		}
		map
	}

	/// Register a mapping, or override the existing rule for the same source
	/// attribute in place.
	pub fn add(&mut self, mapping: FieldMapping) -> &mut Self {
		match self.mappings.iter_mut().find(|existing| existing.source == mapping.source) {
			Some(existing) => *existing = mapping,
			None => self.mappings.push(mapping),
		}
		self
	}

	/// Decode one entry into a [`Record`] by applying every registered
	/// mapping in registration order.
	#[must_use]
	pub fn decode(&self, entry: &SearchEntry) -> Record {
		let mut record = Record::default();
		for mapping in &self.mappings {
			let values = attr_values(entry, &mapping.source);
			let value = match mapping.decode {
				Decode::Single => Value::One(
					values
						.and_then(|values| values.into_iter().find(|value| !value.is_empty()))
						.unwrap_or_default(),
				),
				Decode::List => Value::Many(
					values
						.unwrap_or_default()
						.into_iter()
						.filter(|value| !value.is_empty())
						.collect(),
				),
			};
			record.fields.insert(mapping.target.clone(), value);
		}
		record
	}

	/// Decode a sequence of entries, preserving input order.
	#[must_use]
	pub fn decode_many(&self, entries: &[SearchEntry]) -> Vec<Record> {
		entries.iter().map(|entry| self.decode(entry)).collect()
	}
}

/// Look up the raw values of an attribute, decoding binary values as UTF-8.
///
/// Servers do not always materialize `distinguishedName` as an attribute, so
/// that source falls back to the entry's own dn.
fn attr_values(entry: &SearchEntry, source: &str) -> Option<Vec<String>> {
	if let Some(values) = entry.attrs.get(source) {
		return Some(values.clone());
	}
	if let Some(values) = entry.bin_attrs.get(source) {
		return Some(values.iter().map(|raw| String::from_utf8_lossy(raw).into_owned()).collect());
	}
	if source.eq_ignore_ascii_case("distinguishedName") {
		return Some(vec![entry.dn.clone()]);
	}
	None
}
