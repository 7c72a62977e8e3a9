use std::str::FromStr;

use time::OffsetDateTime;

use weld_domain::{Contact, LinkPrecedence};

use crate::{Error, Result};

/// Raw `contacts` row. Decoded with sqlx, then converted into the domain
/// [`Contact`], which rejects precedence values the CHECK constraint should
/// have made impossible.
#[derive(Debug, sqlx::FromRow)]
pub struct ContactRow {
	pub id: i64,
	pub email: Option<String>,
	pub phone_number: Option<String>,
	pub linked_id: Option<i64>,
	pub link_precedence: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}
impl ContactRow {
	pub fn into_contact(self) -> Result<Contact> {
		let link_precedence = LinkPrecedence::from_str(&self.link_precedence)
			.map_err(|err| Error::CorruptRow(format!("Contact {}: {err}", self.id)))?;

		Ok(Contact {
			id: self.id,
			email: self.email,
			phone_number: self.phone_number,
			linked_id: self.linked_id,
			link_precedence,
			created_at: self.created_at,
			updated_at: self.updated_at,
			deleted_at: self.deleted_at,
		})
	}
}

#[derive(Debug)]
pub struct NewContact {
	pub email: Option<String>,
	pub phone_number: Option<String>,
	pub linked_id: Option<i64>,
	pub link_precedence: LinkPrecedence,
	pub created_at: OffsetDateTime,
}
