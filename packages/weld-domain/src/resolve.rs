//! Pure decision logic for identity resolution.
//!
//! Everything here operates on in-memory row snapshots; the service layer
//! owns the transaction and interleaves these decisions with store reads and
//! writes.

use std::collections::BTreeSet;

use crate::contact::{Contact, ContactSummary};

/// Collapses an optional identifier to canonical form: trimmed, with empty
/// strings treated as absent. An empty string is never a valid identifier.
pub fn normalize_identifier(value: Option<&str>) -> Option<String> {
	let trimmed = value?.trim();

	if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// The set of primary ids implicated by a batch of matched rows: the id of
/// every primary match plus the `linked_id` of every secondary match.
///
/// A dangling `linked_id` (pointing at a row that no longer resolves) is kept
/// in the set; it matches nothing by id but still pulls in sibling rows that
/// share the same stale link.
pub fn implicated_primary_ids(matches: &[Contact]) -> BTreeSet<i64> {
	let mut ids = BTreeSet::new();

	for contact in matches {
		if contact.is_primary() {
			ids.insert(contact.id);
		} else if let Some(linked_id) = contact.linked_id {
			ids.insert(linked_id);
		}
	}

	ids
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Election {
	pub primary_id: i64,
	/// True when the elected record is not currently a primary and must be
	/// promoted in place before the merge (self-heal of inconsistent data).
	pub needs_promotion: bool,
}

/// Elects the ultimate primary of a loaded group: the primary with the
/// earliest `created_at`, ties broken by lowest id. A group without any
/// primary elects its oldest record overall, flagged for promotion.
pub fn elect_primary(group: &[Contact]) -> Option<Election> {
	if let Some(primary) =
		group.iter().filter(|contact| contact.is_primary()).min_by_key(seniority)
	{
		return Some(Election { primary_id: primary.id, needs_promotion: false });
	}

	group.iter().min_by_key(seniority).map(|oldest| Election {
		primary_id: oldest.id,
		needs_promotion: true,
	})
}

/// Ids of group members that must be rewritten to point at the ultimate
/// primary: every other primary (demotion) and every secondary whose
/// `linked_id` differs, including ones left with no link at all.
pub fn merge_relinks(group: &[Contact], primary_id: i64) -> Vec<i64> {
	group
		.iter()
		.filter(|contact| contact.id != primary_id)
		.filter(|contact| contact.is_primary() || contact.linked_id != Some(primary_id))
		.map(|contact| contact.id)
		.collect()
}

/// Whether the submitted observation carries information the group does not
/// already hold. True only when the email or phone is new to the group and
/// no live row holds the exact submitted pair; repeating a previously seen
/// observation therefore writes nothing.
pub fn needs_new_secondary(
	group: &[Contact],
	email: Option<&str>,
	phone: Option<&str>,
) -> bool {
	let new_email = match email {
		Some(email) => !group.iter().any(|contact| contact.email.as_deref() == Some(email)),
		None => false,
	};
	let new_phone = match phone {
		Some(phone) =>
			!group.iter().any(|contact| contact.phone_number.as_deref() == Some(phone)),
		None => false,
	};

	if !new_email && !new_phone {
		return false;
	}

	!group
		.iter()
		.any(|contact| contact.email.as_deref() == email && contact.phone_number.as_deref() == phone)
}

/// Builds the canonical group view: the primary's email and phone lead their
/// lists, the remainder follows in ascending `(created_at, id)` of the owning
/// record, de-duplicated; secondary ids come in the same order. Returns
/// `None` when `primary_id` is not a member of `group`.
pub fn assemble_summary(group: &[Contact], primary_id: i64) -> Option<ContactSummary> {
	let primary = group.iter().find(|contact| contact.id == primary_id)?;
	let mut ordered = group.iter().collect::<Vec<_>>();

	ordered.sort_by_key(|contact| seniority(contact));

	let mut emails = Vec::new();
	let mut phone_numbers = Vec::new();
	let mut secondary_contact_ids = Vec::new();

	if let Some(email) = primary.email.as_deref() {
		emails.push(email.to_string());
	}
	if let Some(phone) = primary.phone_number.as_deref() {
		phone_numbers.push(phone.to_string());
	}

	for contact in ordered {
		if let Some(email) = contact.email.as_deref()
			&& !emails.iter().any(|seen| seen == email)
		{
			emails.push(email.to_string());
		}
		if let Some(phone) = contact.phone_number.as_deref()
			&& !phone_numbers.iter().any(|seen| seen == phone)
		{
			phone_numbers.push(phone.to_string());
		}
		if contact.id != primary_id && !secondary_contact_ids.contains(&contact.id) {
			secondary_contact_ids.push(contact.id);
		}
	}

	Some(ContactSummary {
		primary_contact_id: primary_id,
		emails,
		phone_numbers,
		secondary_contact_ids,
	})
}

fn seniority(contact: &&Contact) -> (time::OffsetDateTime, i64) {
	(contact.created_at, contact.id)
}
