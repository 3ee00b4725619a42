//! A resilient query client for LDAP-style directory services.
//!
//! The client solves three problems for callers: binding an authenticated
//! session against one of several candidate hosts with automatic failover,
//! composing well-formed search filters from ad-hoc fragments, and resolving
//! large sets of known distinguished names into normalized records without
//! exceeding server-side filter size limits, while reporting which names
//! could not be found.
//!
//! The wire protocol is handled by the [`ldap3`] crate; for a general primer
//! on LDAP, its [introduction] is an excellent resource.
//!
//! [introduction]: https://github.com/inejge/ldap3/blob/master/LDAP-primer.md
//!
//! # Getting started
//! A minimal example of resolving a set of distinguished names:
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use ldap_resolver::{
//!     ConnectionConfig, ConnectionManager, Credentials, DirectoryEndpoint, DnResolver,
//!     FieldMapping,
//! };
//!
//! let manager = ConnectionManager::new(ConnectionConfig::default());
//! let mut session = manager
//!     .connect(
//!         &Credentials::new("cn=admin,dc=example,dc=org", "verysecret"),
//!         &DirectoryEndpoint::new(["dc1.example.org", "dc2.example.org"]),
//!     )
//!     .await?;
//!
//! let mut resolver = DnResolver::with_default_block_size(
//!     "ou=people,dc=example,dc=org",
//!     "objectClass=inetOrgPerson",
//!     ["cn=jdoe,ou=people,dc=example,dc=org".to_owned()],
//! );
//! resolver.entry_map().add(FieldMapping::single_as("mail", "email"));
//!
//! let resolution = resolver.resolve(&mut session).await?;
//! for record in &resolution.records {
//!     println!("{}: {:?}", record.dn(), record.one("email"));
//! }
//! for dn in &resolution.missing {
//!     println!("not found: {dn}");
//! }
//!
//! session.unbind().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//! * A [`BoundSession`] is not safe for concurrent use; searches take
//!   `&mut self` and callers wanting parallel block resolution must bind one
//!   session per worker.
//! * A filter the server rejects as malformed is logged and treated as zero
//!   results rather than propagated, favoring partial results over strict
//!   error propagation.
//! * [secrecy](https://docs.rs/secrecy) is not used for storing the bind
//!   secret, it probably should be.
//! * Connection pooling, TLS configuration and schema discovery are out of
//!   scope.

pub mod config;
pub mod conn;
pub mod error;
pub mod filter;
pub mod mapping;
pub mod query;

pub use ldap3::{self, Scope, SearchEntry};

pub use crate::{
	config::{ConnectionConfig, Credentials, DirectoryEndpoint, DEFAULT_BLOCK_SIZE},
	conn::{BoundSession, ConnectionManager},
	error::Error,
	mapping::{Decode, EntryMap, FieldMapping, Record, Value},
	query::{DnResolver, Query, Resolution},
};
