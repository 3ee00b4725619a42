//! Connecting and binding to a directory server with host failover.
//!
//! A [`ConnectionManager`] walks an ordered list of candidate hosts and
//! returns a [`BoundSession`] for the first one that accepts the bind.
//! Only an unreachable host triggers failover; rejected credentials and
//! other protocol failures are terminal, since retrying them against the
//! remaining hosts would only repeat the same outcome.

use ldap3::{LdapConnAsync, LdapError, Scope, SearchEntry};
use tracing::{info, warn};
use url::Url;

use crate::{
	config::{ConnectionConfig, Credentials, DirectoryEndpoint},
	error::Error,
};

/// The LDAP result code for a bind rejected due to invalid credentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Establishes authenticated sessions against an ordered list of candidate
/// hosts.
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager {
	/// Connection settings applied to every attempt.
	config: ConnectionConfig,
}

/// An authenticated connection to one directory host.
///
/// Exclusively owned by whoever received it from
/// [`ConnectionManager::connect`]; searches take `&mut self`, so a session
/// cannot be used for two searches concurrently. Release it with
/// [`BoundSession::unbind`] when done.
#[derive(Debug)]
pub struct BoundSession {
	/// The address of the host the session is bound to.
	host: String,
	/// The handle to the driven connection.
	ldap: ldap3::Ldap,
}

impl ConnectionManager {
	/// Create a manager with the given connection settings.
	#[must_use]
	pub fn new(config: ConnectionConfig) -> Self {
		Self { config }
	}

	/// Bind a session against the first reachable host of the endpoint.
	///
	/// Validates the endpoint and credentials before any network activity.
	/// Hosts are tried in order; an unreachable host is dropped and the next
	/// one tried. Rejected credentials ([`Error::Auth`]) and protocol-level
	/// failures ([`Error::Protocol`]) are terminal and never retried against
	/// the remaining hosts. When every host is unreachable the error names
	/// the last host tried.
	pub async fn connect(
		&self,
		credentials: &Credentials,
		endpoint: &DirectoryEndpoint,
	) -> Result<BoundSession, Error> {
		let hosts = endpoint.usable_hosts();
		if hosts.is_empty() {
			return Err(Error::Config("Unable to resolve a directory host address".to_owned()));
		}
		if credentials.username.trim().is_empty() {
			return Err(Error::Config("Unable to resolve a directory username".to_owned()));
		}
		if credentials.secret.is_empty() {
			return Err(Error::Config("Unable to resolve a directory secret".to_owned()));
		}

		let last = hosts.len() - 1;
		let mut tried = String::new();
		for (index, host) in hosts.into_iter().enumerate() {
			let address = format!("ldap://{host}");
			let url = Url::parse(&address)
				.map_err(|err| Error::Config(format!("Invalid host address {address}: {err}")))?;
			tried.clone_from(&address);

			let settings = self.config.to_settings();
			let (conn, mut ldap) =
				match LdapConnAsync::from_url_with_settings(settings, &url).await {
					Ok(conn) => conn,
					Err(err) if is_unreachable(&err) => {
						if index < last {
							warn!("Server is down at {address}. Trying next host...");
						}
						continue;
					}
					Err(err) => return Err(Error::Protocol(describe(&err))),
				};
			tokio::spawn(async move {
				if let Err(err) = conn.drive().await {
					warn!("LDAP connection error {err}");
				}
			});

			match ldap.simple_bind(&credentials.username, &credentials.secret).await {
				Ok(result) if result.rc == 0 => {
					info!("Successfully authenticated to {address}");
					return Ok(BoundSession { host: address, ldap });
				}
				Ok(result) if result.rc == RC_INVALID_CREDENTIALS => {
					return Err(Error::Auth {
						username: credentials.username.clone(),
						host: address,
					});
				}
				Ok(result) => return Err(Error::Protocol(describe_result(&result))),
				Err(err) if is_unreachable(&err) => {
					if index < last {
						warn!("Server is down at {address}. Trying next host...");
					}
					continue;
				}
				Err(err) => return Err(Error::Protocol(describe(&err))),
			}
		}

		Err(Error::Unavailable { host: tried })
	}
}

impl BoundSession {
	/// The address of the host this session is bound to.
	#[must_use]
	pub fn host(&self) -> &str {
		&self.host
	}

	/// Execute one search and construct its entries.
	pub(crate) async fn search(
		&mut self,
		base: &str,
		scope: Scope,
		filter: &str,
	) -> Result<Vec<SearchEntry>, LdapError> {
		let (entries, _res) = self.ldap.search(base, scope, filter, vec!["*"]).await?.success()?;
		Ok(entries.into_iter().map(SearchEntry::construct).collect())
	}

	/// Release the session.
	pub async fn unbind(mut self) -> Result<(), Error> {
		self.ldap.unbind().await?;
		Ok(())
	}
}

/// Whether a failure means the host could not be reached, as opposed to the
/// host answering with an error.
fn is_unreachable(err: &LdapError) -> bool {
	matches!(
		err,
		LdapError::Io { .. }
			| LdapError::Timeout { .. }
			| LdapError::EndOfStream
			| LdapError::OpSend { .. }
			| LdapError::ResultRecv { .. }
	)
}

/// Extract a human-readable description from a protocol failure, preferring
/// the server's diagnostic text when one is present.
fn describe(err: &LdapError) -> String {
	match err {
		LdapError::LdapResult { result } => describe_result(result),
		other => other.to_string(),
	}
}

/// The server's diagnostic text for a failed operation, or its result code
/// when the server sent none.
fn describe_result(result: &ldap3::LdapResult) -> String {
	if result.text.is_empty() {
		format!("Operation failed with result code {}", result.rc)
	} else {
		result.text.clone()
	}
}
