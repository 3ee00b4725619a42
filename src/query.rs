//! Filtered searches and batched distinguished-name resolution.
//!
//! [`Query`] runs one filtered search against a [`BoundSession`] and decodes
//! the results through an [`EntryMap`]. [`DnResolver`] builds on it to turn
//! a large set of known distinguished names into records without exceeding
//! server-side filter size limits, splitting the set into blocks and
//! reporting which names no block returned.

use std::collections::HashSet;

use ldap3::{LdapError, Scope, SearchEntry};
use tracing::{error, info, warn};

use crate::{
	config::DEFAULT_BLOCK_SIZE,
	conn::BoundSession,
	error::Error,
	filter,
	mapping::{EntryMap, Record},
};

/// How many characters of a filter are shown in the pre-search log line.
const FILTER_LOG_LIMIT: usize = 100;

/// A single filtered search against a search base.
#[derive(Debug, Clone)]
pub struct Query {
	/// The base distinguished name searched under.
	base: String,
	/// The breadth of the search relative to the base.
	scope: Scope,
	/// The filter used when [`Query::run`] is called without an override.
	filter: Option<String>,
	/// How entries are decoded into records.
	entry_map: Option<EntryMap>,
}

impl Query {
	/// Create a subtree query under the given base.
	#[must_use]
	pub fn new(base: impl Into<String>) -> Self {
		Self { base: base.into(), scope: Scope::Subtree, filter: None, entry_map: None }
	}

	/// Set the search scope.
	#[must_use]
	pub fn with_scope(mut self, scope: Scope) -> Self {
		self.scope = scope;
		self
	}

	/// Set the default filter from fragments, composed with
	/// [`filter::compose`].
	#[must_use]
	pub fn with_filter<I, S>(mut self, fragments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.filter = Some(filter::compose(fragments));
		self
	}

	/// The entry map used to decode results, created on first access.
	pub fn entry_map(&mut self) -> &mut EntryMap {
		self.entry_map.get_or_insert_with(EntryMap::new)
	}

	/// Execute the query's own filter and decode the results.
	pub async fn run(&self, session: &mut BoundSession) -> Result<Vec<Record>, Error> {
		let entries = self.search(session, self.filter.as_deref().unwrap_or_default()).await?;
		Ok(self.decode(&entries))
	}

	/// Execute the given filter and decode the results.
	pub async fn run_with(
		&self,
		session: &mut BoundSession,
		filter: &str,
	) -> Result<Vec<Record>, Error> {
		let entries = self.search(session, filter).await?;
		Ok(self.decode(&entries))
	}

	/// Execute the query's own filter and return the raw entries.
	pub async fn run_raw(&self, session: &mut BoundSession) -> Result<Vec<SearchEntry>, Error> {
		self.search(session, self.filter.as_deref().unwrap_or_default()).await
	}

	/// Perform one search, treating an empty filter as a no-op and a
	/// rejected filter as zero results.
	///
	/// Swallowing filter-syntax failures trades strict error propagation for
	/// availability of partial results; the offending filter is logged with
	/// clause boundaries made visible so it can be diagnosed.
	async fn search(
		&self,
		session: &mut BoundSession,
		filter: &str,
	) -> Result<Vec<SearchEntry>, Error> {
		if filter.is_empty() {
			info!("Skipping search under {}: no filter given", self.base);
			return Ok(Vec::new());
		}

		let shown = filter.get(..FILTER_LOG_LIMIT).unwrap_or(filter);
		info!("Searching[{}] for {shown}...", self.base);

		match session.search(&self.base, self.scope, filter).await {
			Ok(entries) => Ok(entries),
			Err(err) if is_filter_syntax(&err) => {
				error!("{err}");
				error!("{}", filter.replace(")(", ")\n("));
				Ok(Vec::new())
			}
			Err(err) => Err(err.into()),
		}
	}

	/// Decode entries through the attached entry map, or pass them through a
	/// fresh one (dn only) when none was attached.
	fn decode(&self, entries: &[SearchEntry]) -> Vec<Record> {
		match &self.entry_map {
			Some(map) => map.decode_many(entries),
			None => EntryMap::new().decode_many(entries),
		}
	}
}

/// Whether a search failure means the filter itself was rejected.
fn is_filter_syntax(err: &LdapError) -> bool {
	/// The LDAP result code for a filter the server could not process.
	const RC_FILTER_ERROR: u32 = 87;
	match err {
		LdapError::FilterParsing => true,
		LdapError::LdapResult { result } => result.rc == RC_FILTER_ERROR,
		_ => false,
	}
}

/// The outcome of a batched distinguished-name resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
	/// The decoded records for every entry a block returned.
	pub records: Vec<Record>,
	/// The searched-for distinguished names no block returned, in request
	/// order.
	pub missing: Vec<String>,
}

/// Resolves a set of known distinguished names in bounded-size blocks.
///
/// Names not lying under the base are excluded up front and never searched
/// for, so they are not reported as missing either. The remaining names are
/// split into blocks of at most `block_size` and each block is resolved with
/// one search combining the type filter with an OR over the block's names.
#[derive(Debug, Clone)]
pub struct DnResolver {
	/// The query every block is executed through.
	query: Query,
	/// The type filter clause ANDed into every block's filter.
	type_filter: String,
	/// The names to resolve, in request order.
	targets: Vec<String>,
	/// The maximum number of names per search.
	block_size: usize,
}

impl DnResolver {
	/// Create a resolver for the given names under `base`.
	///
	/// `type_filter` is a single clause such as `objectClass=person`.
	/// `block_size` is clamped to at least 1; batching cannot be disabled.
	pub fn new<I, S>(
		base: impl Into<String>,
		type_filter: impl Into<String>,
		dns: I,
		block_size: usize,
	) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let base = base.into();
		let targets = dns
			.into_iter()
			.map(Into::into)
			.filter(|dn| !dn.is_empty() && dn.ends_with(&base))
			.collect();
		Self {
			query: Query::new(base),
			type_filter: type_filter.into(),
			targets,
			block_size: block_size.max(1),
		}
	}

	/// Create a resolver with the default block size of 1000.
	pub fn with_default_block_size<I, S>(
		base: impl Into<String>,
		type_filter: impl Into<String>,
		dns: I,
	) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(base, type_filter, dns, DEFAULT_BLOCK_SIZE)
	}

	/// The entry map applied to resolved entries, created on first access.
	pub fn entry_map(&mut self) -> &mut EntryMap {
		self.query.entry_map()
	}

	/// Whether any of the requested names lie under the base.
	#[must_use]
	pub fn has_targets(&self) -> bool {
		!self.targets.is_empty()
	}

	/// The names that will be searched for, in request order.
	#[must_use]
	pub fn targets(&self) -> &[String] {
		&self.targets
	}

	/// Resolve every target name, block by block.
	///
	/// Missing names are data, not an error: the resolution always completes
	/// with whatever was found, and names no block returned are collected in
	/// [`Resolution::missing`] and reported once as a warning.
	pub async fn resolve(&self, session: &mut BoundSession) -> Result<Resolution, Error> {
		let mut resolution = Resolution::default();
		if !self.has_targets() {
			return Ok(resolution);
		}

		let block_count = self.targets.chunks(self.block_size).len();
		for (index, block) in self.targets.chunks(self.block_size).enumerate() {
			let found = self.resolve_block(session, block).await?;
			let found_dns: HashSet<&str> = found.iter().map(Record::dn).collect();
			resolution
				.missing
				.extend(block.iter().filter(|dn| !found_dns.contains(dn.as_str())).cloned());

			info!(
				"Retrieved {} of {} records in block [{}/{block_count}].",
				found.len(),
				block.len(),
				index + 1,
			);
			resolution.records.extend(found);
		}

		if !resolution.missing.is_empty() {
			warn!("Referenced entries not found in directory:\n{}", resolution.missing.join("\n"));
		}

		Ok(resolution)
	}

	/// Resolve one block of names with a single search.
	async fn resolve_block(
		&self,
		session: &mut BoundSession,
		block: &[String],
	) -> Result<Vec<Record>, Error> {
		self.query.run_with(session, &self.block_filter(block)).await
	}

	/// Build the filter for one block: the type filter ANDed with an OR over
	/// the block's escaped names.
	fn block_filter(&self, block: &[String]) -> String {
		let escaped = filter::escape_values(block);
		let dn_clauses = filter::compose(
			std::iter::once("distinguishedName={}".to_owned()).chain(escaped),
		);
		let alternatives = filter::or([dn_clauses.as_str()]);
		filter::and([self.type_filter.as_str(), alternatives.as_str()])
	}
}
