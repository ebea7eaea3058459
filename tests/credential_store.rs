// crates.io
use time::{Duration, OffsetDateTime, macros::datetime};
// self
use bearer_guard::{
	auth::{IdentityId, TokenSecret},
	credential::{self, CredentialUpdate},
	store::{CredentialStore, MemoryCredentialStore},
};

fn identity(email: &str) -> IdentityId {
	IdentityId::new(email).expect("Identity fixture should be valid.")
}

#[tokio::test]
async fn upsert_replaces_every_field_and_keeps_one_record() {
	let store = MemoryCredentialStore::default();
	let ada = identity("ada@example.com");
	let first = store
		.upsert(
			&ada,
			CredentialUpdate::new("access-1")
				.refresh_token("refresh-1")
				.expires_at(OffsetDateTime::now_utc() + Duration::hours(1)),
		)
		.await
		.expect("First upsert should succeed.");
	let second = store
		.upsert(&ada, CredentialUpdate::new("access-2"))
		.await
		.expect("Second upsert should succeed.");

	assert_eq!(store.len(), 1);
	assert_eq!(second.created_at, first.created_at);
	assert_eq!(second.access_token.expose(), "access-2");
	assert!(second.refresh_token.is_none());
	assert!(second.expires_at.is_none());
	assert!(second.is_stale(), "A credential without expiry is always stale.");
}

#[tokio::test]
async fn delete_reports_whether_a_record_existed() {
	let store = MemoryCredentialStore::default();
	let ada = identity("ada@example.com");

	store.upsert(&ada, CredentialUpdate::new("access")).await.expect("Upsert should succeed.");

	assert!(store.delete(&ada).await.expect("Delete should succeed."));
	assert!(!store.delete(&ada).await.expect("Delete should succeed."));
	assert!(store.get(&ada).await.expect("Lookup should succeed.").is_none());
}

#[tokio::test]
async fn identities_are_isolated() {
	let store = MemoryCredentialStore::default();

	store
		.upsert(&identity("ada@example.com"), CredentialUpdate::new("ada"))
		.await
		.expect("Upsert should succeed.");
	store
		.upsert(&identity("bob@example.com"), CredentialUpdate::new("bob"))
		.await
		.expect("Upsert should succeed.");

	let ada = store
		.get(&identity("ada@example.com"))
		.await
		.expect("Lookup should succeed.")
		.expect("Ada's credential should exist.");

	assert_eq!(ada.access_token, TokenSecret::new("ada"));
}

#[tokio::test]
async fn update_existing_writes_only_over_the_same_record() {
	let store = MemoryCredentialStore::default();
	let ada = identity("ada@example.com");

	assert!(
		store
			.update_existing(&ada, OffsetDateTime::now_utc(), CredentialUpdate::new("ghost"))
			.await
			.expect("Conditional update should succeed.")
			.is_none(),
		"A missing record must not be created."
	);
	assert!(store.is_empty());

	let original =
		store.upsert(&ada, CredentialUpdate::new("access-1")).await.expect("Upsert should succeed.");
	let updated = store
		.update_existing(&ada, original.created_at, CredentialUpdate::new("access-2"))
		.await
		.expect("Conditional update should succeed.")
		.expect("The matching record should be replaced.");

	assert_eq!(updated.access_token.expose(), "access-2");
	assert_eq!(updated.created_at, original.created_at);

	let stale_generation = original.created_at - Duration::seconds(1);

	assert!(
		store
			.update_existing(&ada, stale_generation, CredentialUpdate::new("access-3"))
			.await
			.expect("Conditional update should succeed.")
			.is_none(),
		"A recreated record must not be overwritten."
	);

	let current = store
		.get(&ada)
		.await
		.expect("Lookup should succeed.")
		.expect("Ada's credential should exist.");

	assert_eq!(current.access_token.expose(), "access-2");
}

#[test]
fn staleness_boundary_is_inclusive() {
	let now = datetime!(2025-11-10 12:00 UTC);
	let update = CredentialUpdate::new("access").expires_at(now);
	let credential = update.apply(&identity("ada@example.com"), None, now - Duration::hours(1));

	assert!(credential::is_stale_at(Some(&credential), now));
	assert!(!credential::is_stale_at(Some(&credential), now - Duration::seconds(1)));
	assert!(credential::is_stale_at(None, now));
}
