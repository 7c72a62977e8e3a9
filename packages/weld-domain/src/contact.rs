use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One stored observation of an (email, phone) pair with linking metadata.
///
/// A `Primary` contact is the canonical, oldest record of an identity group
/// and carries no `linked_id`; every `Secondary` points directly at its
/// group's current primary.
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
	pub id: i64,
	pub email: Option<String>,
	pub phone_number: Option<String>,
	pub linked_id: Option<i64>,
	pub link_precedence: LinkPrecedence,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}
impl Contact {
	pub fn is_primary(&self) -> bool {
		self.link_precedence == LinkPrecedence::Primary
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkPrecedence {
	Primary,
	Secondary,
}
impl LinkPrecedence {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Primary => "primary",
			Self::Secondary => "secondary",
		}
	}
}
impl FromStr for LinkPrecedence {
	type Err = UnknownLinkPrecedence;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"primary" => Ok(Self::Primary),
			"secondary" => Ok(Self::Secondary),
			_ => Err(UnknownLinkPrecedence { value: value.to_string() }),
		}
	}
}

#[derive(Debug)]
pub struct UnknownLinkPrecedence {
	pub value: String,
}
impl std::fmt::Display for UnknownLinkPrecedence {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Unknown link precedence {:?}.", self.value)
	}
}
impl std::error::Error for UnknownLinkPrecedence {}

/// Canonical view of one identity group, as returned to callers.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
	pub primary_contact_id: i64,
	pub emails: Vec<String>,
	pub phone_numbers: Vec<String>,
	pub secondary_contact_ids: Vec<i64>,
}
