//! Config for the LDAP client.
use std::time::Duration;

use ldap3::LdapConnSettings;
use serde::{Deserialize, Serialize};

/// Default number of distinguished names resolved per search when splitting
/// a large identifier set into blocks.
pub const DEFAULT_BLOCK_SIZE: usize = 1000;

/// An ordered list of candidate directory hosts.
///
/// Hosts are given as `host` or `host:port` and tried in order when
/// connecting; blank entries are skipped. The list is immutable once
/// constructed.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DirectoryEndpoint {
	/// The candidate host addresses, in failover order.
	pub hosts: Vec<String>,
}

impl DirectoryEndpoint {
	/// Create an endpoint from a list of host addresses.
	pub fn new<I, S>(hosts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { hosts: hosts.into_iter().map(Into::into).collect() }
	}

	/// The candidate hosts with blank entries filtered out, in order.
	#[must_use]
	pub fn usable_hosts(&self) -> Vec<&str> {
		self.hosts.iter().map(|host| host.trim()).filter(|host| !host.is_empty()).collect()
	}
}

/// The username and secret used to bind to the directory service.
///
/// Supplied once per connection attempt and never persisted by the client.
/// [secrecy](https://docs.rs/secrecy) is not used for storing the secret, it
/// probably should be.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Credentials {
	/// The bind username, usually itself a distinguished name.
	pub username: String,
	/// The bind secret.
	pub secret: String,
}

impl Credentials {
	/// Create credentials from a username and secret.
	pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { username: username.into(), secret: secret.into() }
	}
}

/// Configuration for how to connect to the LDAP server.
///
/// The underlying protocol library always speaks LDAPv3 and does not chase
/// referrals, matching the behavior this client requires.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// Timeout to establish a connection, in seconds.
	pub timeout: u64,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self { timeout: 10 }
	}
}

impl ConnectionConfig {
	/// Create a [`LdapConnSettings`] based on this [`ConnectionConfig`]
	pub(crate) fn to_settings(&self) -> LdapConnSettings {
		LdapConnSettings::new().set_conn_timeout(Duration::from_secs(self.timeout))
	}
}
