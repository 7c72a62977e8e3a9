//! The Contact Store: the exact read/write primitives the identity resolver
//! needs. Every function takes the caller's open transaction connection and
//! every query excludes soft-deleted rows.

use sqlx::{PgConnection, QueryBuilder};
use time::OffsetDateTime;

use weld_domain::{Contact, LinkPrecedence};

use crate::{
	Error, Result,
	models::{ContactRow, NewContact},
};

const COLUMNS: &str =
	"id, email, phone_number, linked_id, link_precedence, created_at, updated_at, deleted_at";

/// Live rows whose email or phone number equals one of the given values,
/// ordered by seniority. At least one predicate must be present.
pub async fn find_by_email_or_phone(
	conn: &mut PgConnection,
	email: Option<&str>,
	phone: Option<&str>,
) -> Result<Vec<Contact>> {
	if email.is_none() && phone.is_none() {
		return Err(Error::InvalidArgument(
			"find_by_email_or_phone requires an email or a phone number.".to_string(),
		));
	}

	let mut builder = QueryBuilder::new(format!(
		"SELECT {COLUMNS} FROM contacts WHERE deleted_at IS NULL AND ("
	));
	let mut first = true;

	if let Some(email) = email {
		builder.push("email = ");
		builder.push_bind(email);

		first = false;
	}
	if let Some(phone) = phone {
		if !first {
			builder.push(" OR ");
		}

		builder.push("phone_number = ");
		builder.push_bind(phone);
	}

	builder.push(") ORDER BY created_at, id");

	let rows: Vec<ContactRow> = builder.build_query_as().fetch_all(conn).await?;

	rows.into_iter().map(ContactRow::into_contact).collect()
}

pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> Result<Option<Contact>> {
	let row: Option<ContactRow> = sqlx::query_as(&format!(
		"SELECT {COLUMNS} FROM contacts WHERE deleted_at IS NULL AND id = $1"
	))
	.bind(id)
	.fetch_optional(conn)
	.await?;

	row.map(ContactRow::into_contact).transpose()
}

/// Every live row belonging to any of the given primaries: the primaries
/// themselves plus all rows linked at them, ordered by seniority.
pub async fn find_group(conn: &mut PgConnection, primary_ids: &[i64]) -> Result<Vec<Contact>> {
	let rows: Vec<ContactRow> = sqlx::query_as(&format!(
		"\
SELECT {COLUMNS}
FROM contacts
WHERE deleted_at IS NULL AND (id = ANY($1) OR linked_id = ANY($1))
ORDER BY created_at, id"
	))
	.bind(primary_ids)
	.fetch_all(conn)
	.await?;

	rows.into_iter().map(ContactRow::into_contact).collect()
}

/// Post-merge membership of a single group, keyed by its primary.
pub async fn find_group_of(conn: &mut PgConnection, primary_id: i64) -> Result<Vec<Contact>> {
	let rows: Vec<ContactRow> = sqlx::query_as(&format!(
		"\
SELECT {COLUMNS}
FROM contacts
WHERE deleted_at IS NULL AND (id = $1 OR linked_id = $1)
ORDER BY created_at, id"
	))
	.bind(primary_id)
	.fetch_all(conn)
	.await?;

	rows.into_iter().map(ContactRow::into_contact).collect()
}

pub async fn insert(conn: &mut PgConnection, contact: NewContact) -> Result<Contact> {
	let row: ContactRow = sqlx::query_as(&format!(
		"\
INSERT INTO contacts (email, phone_number, linked_id, link_precedence, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $5)
RETURNING {COLUMNS}"
	))
	.bind(contact.email)
	.bind(contact.phone_number)
	.bind(contact.linked_id)
	.bind(contact.link_precedence.as_str())
	.bind(contact.created_at)
	.fetch_one(conn)
	.await?;

	row.into_contact()
}

/// Rewrites a contact's linking fields. The only mutation the resolver ever
/// issues: demotion, relinking, and in-place promotion all go through here.
pub async fn set_link(
	conn: &mut PgConnection,
	id: i64,
	link_precedence: LinkPrecedence,
	linked_id: Option<i64>,
	updated_at: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE contacts
SET link_precedence = $1, linked_id = $2, updated_at = $3
WHERE id = $4",
	)
	.bind(link_precedence.as_str())
	.bind(linked_id)
	.bind(updated_at)
	.bind(id)
	.execute(conn)
	.await?;

	Ok(())
}
