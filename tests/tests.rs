#![allow(
	clippy::dbg_macro,
	clippy::expect_used,
	clippy::missing_docs_in_private_items,
	clippy::print_stderr,
	clippy::print_stdout,
	clippy::unwrap_used
)]
use std::error::Error;

use ldap_resolver::{
	ConnectionConfig, ConnectionManager, Credentials, DirectoryEndpoint, DnResolver, FieldMapping,
	Query, Scope,
};
use serial_test::serial;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod common;

use common::{
	ldap_add_organizational_unit, ldap_add_user, ldap_connect,
	ldap_delete_organizational_unit, ldap_delete_user, ldap_user_add_attribute, ADMIN_DN,
	ADMIN_PASSWORD, BASE,
};

fn init_tracing() {
	let tracing_filter = EnvFilter::default().add_directive(LevelFilter::DEBUG.into());
	let _ = tracing_subscriber::fmt().with_env_filter(tracing_filter).try_init();
}

#[ignore = "docker"]
#[tokio::test]
#[serial]
async fn connect_fails_over_to_reachable_host() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let manager = ConnectionManager::new(ConnectionConfig { timeout: 2 });
	let endpoint =
		DirectoryEndpoint::new(["localhost:1390", "localhost:1391", "localhost:1389"]);
	let session =
		manager.connect(&Credentials::new(ADMIN_DN, ADMIN_PASSWORD), &endpoint).await?;

	assert_eq!(session.host(), "ldap://localhost:1389");
	session.unbind().await?;

	Ok(())
}

#[ignore = "docker"]
#[tokio::test]
#[serial]
async fn connect_rejects_bad_credentials_without_failover() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let manager = ConnectionManager::new(ConnectionConfig { timeout: 2 });
	// The second host does not exist; a credentials rejection on the first
	// must fail immediately instead of trying it.
	let endpoint = DirectoryEndpoint::new(["localhost:1389", "localhost:1390"]);
	let err = manager
		.connect(&Credentials::new(ADMIN_DN, "wrongpassword"), &endpoint)
		.await
		.expect_err("bad credentials must not bind");

	assert!(matches!(err, ldap_resolver::Error::Auth { .. }), "got {err:?}");

	Ok(())
}

#[ignore = "docker"]
#[tokio::test]
#[serial]
async fn query_decodes_entries() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let mut ldap = ldap_connect().await?;
	let _ = ldap_delete_organizational_unit(&mut ldap, "users").await;
	ldap_add_organizational_unit(&mut ldap, "users").await?;
	ldap_add_user(&mut ldap, "user01", "User1").await?;
	ldap_user_add_attribute(&mut ldap, "user01", "displayName", "MyName1").await?;
	ldap_user_add_attribute(&mut ldap, "user01", "mail", "user01@example.org").await?;

	let manager = ConnectionManager::new(ConnectionConfig::default());
	let mut session = manager
		.connect(
			&Credentials::new(ADMIN_DN, ADMIN_PASSWORD),
			&DirectoryEndpoint::new(["localhost:1389"]),
		)
		.await?;

	let mut query = Query::new(format!("ou=users,{BASE}"))
		.with_scope(Scope::Subtree)
		.with_filter(["objectClass=inetOrgPerson"]);
	query
		.entry_map()
		.add(FieldMapping::single_as("displayName", "name"))
		.add(FieldMapping::list_as("mail", "emails"));

	let records = query.run(&mut session).await?;
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].dn(), format!("cn=user01,ou=users,{BASE}"));
	assert_eq!(records[0].one("name"), Some("MyName1"));
	assert_eq!(records[0].many("emails"), Some(&["user01@example.org".to_owned()][..]));

	session.unbind().await?;
	ldap_delete_user(&mut ldap, "user01").await?;
	ldap_delete_organizational_unit(&mut ldap, "users").await?;
	ldap.unbind().await?;

	Ok(())
}

#[ignore = "docker"]
#[tokio::test]
#[serial]
async fn query_returns_empty_on_bad_filter() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let manager = ConnectionManager::new(ConnectionConfig::default());
	let mut session = manager
		.connect(
			&Credentials::new(ADMIN_DN, ADMIN_PASSWORD),
			&DirectoryEndpoint::new(["localhost:1389"]),
		)
		.await?;

	let query = Query::new(BASE).with_filter(["((((malformed"]);
	let records = query.run(&mut session).await?;
	assert!(records.is_empty(), "rejected filter degrades to zero results");

	session.unbind().await?;
	Ok(())
}

// Requires a server that materializes the distinguishedName attribute on
// entries (Active Directory or Samba AD); plain OpenLDAP only carries the
// operational entryDN.
#[ignore = "docker"]
#[tokio::test]
#[serial]
async fn resolver_reports_found_and_missing() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let mut ldap = ldap_connect().await?;
	let _ = ldap_delete_organizational_unit(&mut ldap, "users").await;
	ldap_add_organizational_unit(&mut ldap, "users").await?;
	ldap_add_user(&mut ldap, "user01", "User1").await?;
	ldap_add_user(&mut ldap, "user02", "User2").await?;
	ldap_add_user(&mut ldap, "user03", "User3").await?;

	let manager = ConnectionManager::new(ConnectionConfig::default());
	let mut session = manager
		.connect(
			&Credentials::new(ADMIN_DN, ADMIN_PASSWORD),
			&DirectoryEndpoint::new(["localhost:1389"]),
		)
		.await?;

	let users = format!("ou=users,{BASE}");
	let ghost = format!("cn=ghost,{users}");
	let outside = "cn=user01,ou=users,dc=elsewhere,dc=net".to_owned();
	// Block size 2 forces multiple blocks over the four searched names.
	let mut resolver = DnResolver::new(
		users.as_str(),
		"objectClass=inetOrgPerson",
		[
			format!("cn=user01,{users}"),
			format!("cn=user02,{users}"),
			format!("cn=user03,{users}"),
			ghost.clone(),
			outside,
		],
		2,
	);
	resolver.entry_map().add(FieldMapping::single("sn"));
	assert_eq!(resolver.targets().len(), 4, "names outside the base are never searched");

	let resolution = resolver.resolve(&mut session).await?;
	assert_eq!(resolution.records.len(), 3);
	assert_eq!(resolution.missing, [ghost]);

	let sns: Vec<_> =
		resolution.records.iter().filter_map(|record| record.one("sn")).collect();
	assert!(sns.contains(&"User1") && sns.contains(&"User2") && sns.contains(&"User3"));

	session.unbind().await?;
	ldap_delete_user(&mut ldap, "user01").await?;
	ldap_delete_user(&mut ldap, "user02").await?;
	ldap_delete_user(&mut ldap, "user03").await?;
	ldap_delete_organizational_unit(&mut ldap, "users").await?;
	ldap.unbind().await?;

	Ok(())
}
