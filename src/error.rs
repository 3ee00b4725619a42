//! Error codes

/// Errors that can occur when using this library
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// The connection configuration was unusable: empty host list, username
	/// or secret, or a host address that does not form a valid URL. Raised
	/// before any network activity.
	#[error("Invalid configuration: {0}")]
	Config(String),
	/// The directory service rejected the credentials. Never retried against
	/// remaining hosts, since the credentials are assumed invalid for the
	/// whole endpoint.
	#[error("Invalid credentials for {username} on {host}")]
	Auth {
		/// The username the bind was attempted with.
		username: String,
		/// The address of the host that rejected the bind.
		host: String,
	},
	/// Every candidate host was unreachable.
	#[error("Server is down at {host}")]
	Unavailable {
		/// The address of the last host tried.
		host: String,
	},
	/// Any other protocol-level failure, carrying a best-effort
	/// human-readable description.
	#[error("LDAP error: {0}")]
	Protocol(String),
	/// An underlying protocol error or similar occurred, or the LDAP library
	/// was used incorrectly.
	#[error(transparent)]
	Ldap(#[from] ldap3::LdapError),
}
