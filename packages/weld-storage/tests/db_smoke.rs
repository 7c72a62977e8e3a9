use time::OffsetDateTime;

use weld_config::Postgres;
use weld_domain::LinkPrecedence;
use weld_storage::{contacts, db::Db, models::NewContact};
use weld_testkit::TestDatabase;

async fn bootstrapped_db(base_dsn: &str) -> (TestDatabase, Db) {
	let test_db = TestDatabase::new(base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	(test_db, db)
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WELD_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = weld_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set WELD_PG_DSN to run this test.");

		return;
	};
	let (test_db, db) = bootstrapped_db(&base_dsn).await;

	// Bootstrap must be idempotent.
	db.ensure_schema().await.expect("Failed to re-ensure schema.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'contacts'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WELD_PG_DSN to run."]
async fn store_roundtrip_orders_and_filters() {
	let Some(base_dsn) = weld_testkit::env_dsn() else {
		eprintln!("Skipping store_roundtrip_orders_and_filters; set WELD_PG_DSN to run this test.");

		return;
	};
	let (test_db, db) = bootstrapped_db(&base_dsn).await;
	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");
	let t0 = OffsetDateTime::from_unix_timestamp(1_000).expect("Timestamp in range.");
	let t1 = OffsetDateTime::from_unix_timestamp(2_000).expect("Timestamp in range.");

	let first = contacts::insert(&mut tx, NewContact {
		email: Some("a@x.com".to_string()),
		phone_number: Some("1".to_string()),
		linked_id: None,
		link_precedence: LinkPrecedence::Primary,
		created_at: t0,
	})
	.await
	.expect("Failed to insert contact.");
	let second = contacts::insert(&mut tx, NewContact {
		email: Some("b@x.com".to_string()),
		phone_number: Some("1".to_string()),
		linked_id: Some(first.id),
		link_precedence: LinkPrecedence::Secondary,
		created_at: t1,
	})
	.await
	.expect("Failed to insert contact.");

	assert!(first.is_primary());
	assert_eq!(second.linked_id, Some(first.id));

	let matched = contacts::find_by_email_or_phone(&mut tx, None, Some("1"))
		.await
		.expect("Failed to query contacts.");

	assert_eq!(
		matched.iter().map(|contact| contact.id).collect::<Vec<_>>(),
		vec![first.id, second.id],
	);

	let by_email = contacts::find_by_email_or_phone(&mut tx, Some("b@x.com"), None)
		.await
		.expect("Failed to query contacts.");

	assert_eq!(by_email.len(), 1);
	assert_eq!(by_email[0].id, second.id);

	let group = contacts::find_group(&mut tx, &[first.id])
		.await
		.expect("Failed to load contact group.");

	assert_eq!(group.len(), 2);

	assert!(contacts::find_by_email_or_phone(&mut tx, None, None).await.is_err());

	tx.commit().await.expect("Failed to commit transaction.");
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WELD_PG_DSN to run."]
async fn store_excludes_soft_deleted_rows() {
	let Some(base_dsn) = weld_testkit::env_dsn() else {
		eprintln!("Skipping store_excludes_soft_deleted_rows; set WELD_PG_DSN to run this test.");

		return;
	};
	let (test_db, db) = bootstrapped_db(&base_dsn).await;
	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");
	let t0 = OffsetDateTime::from_unix_timestamp(1_000).expect("Timestamp in range.");

	let created = contacts::insert(&mut tx, NewContact {
		email: Some("a@x.com".to_string()),
		phone_number: None,
		linked_id: None,
		link_precedence: LinkPrecedence::Primary,
		created_at: t0,
	})
	.await
	.expect("Failed to insert contact.");

	sqlx::query("UPDATE contacts SET deleted_at = now() WHERE id = $1")
		.bind(created.id)
		.execute(&mut *tx)
		.await
		.expect("Failed to tombstone contact.");

	let matched = contacts::find_by_email_or_phone(&mut tx, Some("a@x.com"), None)
		.await
		.expect("Failed to query contacts.");

	assert!(matched.is_empty());
	assert!(
		contacts::find_by_id(&mut tx, created.id)
			.await
			.expect("Failed to query contact.")
			.is_none()
	);

	tx.commit().await.expect("Failed to commit transaction.");
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set WELD_PG_DSN to run."]
async fn set_link_rewrites_precedence_and_target() {
	let Some(base_dsn) = weld_testkit::env_dsn() else {
		eprintln!("Skipping set_link_rewrites_precedence_and_target; set WELD_PG_DSN to run.");

		return;
	};
	let (test_db, db) = bootstrapped_db(&base_dsn).await;
	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");
	let t0 = OffsetDateTime::from_unix_timestamp(1_000).expect("Timestamp in range.");
	let t1 = OffsetDateTime::from_unix_timestamp(2_000).expect("Timestamp in range.");

	let older = contacts::insert(&mut tx, NewContact {
		email: Some("a@x.com".to_string()),
		phone_number: None,
		linked_id: None,
		link_precedence: LinkPrecedence::Primary,
		created_at: t0,
	})
	.await
	.expect("Failed to insert contact.");
	let newer = contacts::insert(&mut tx, NewContact {
		email: None,
		phone_number: Some("2".to_string()),
		linked_id: None,
		link_precedence: LinkPrecedence::Primary,
		created_at: t1,
	})
	.await
	.expect("Failed to insert contact.");

	contacts::set_link(&mut tx, newer.id, LinkPrecedence::Secondary, Some(older.id), t1)
		.await
		.expect("Failed to relink contact.");

	let demoted = contacts::find_by_id(&mut tx, newer.id)
		.await
		.expect("Failed to query contact.")
		.expect("Contact must exist.");

	assert_eq!(demoted.link_precedence, LinkPrecedence::Secondary);
	assert_eq!(demoted.linked_id, Some(older.id));

	let group = contacts::find_group_of(&mut tx, older.id)
		.await
		.expect("Failed to load contact group.");

	assert_eq!(group.len(), 2);

	tx.commit().await.expect("Failed to commit transaction.");
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
