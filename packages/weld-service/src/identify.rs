use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use weld_domain::{Contact, ContactSummary, LinkPrecedence, resolve};
use weld_storage::{contacts, db, models::NewContact};

use crate::{Error, Result, WeldService};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IdentifyRequest {
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default, rename = "phoneNumber")]
	pub phone_number: Option<PhoneField>,
}

/// Phone numbers arrive as JSON strings or bare numbers; numbers are coerced
/// to their decimal string form before any matching.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PhoneField {
	Text(String),
	Number(serde_json::Number),
}
impl PhoneField {
	fn to_text(&self) -> String {
		match self {
			Self::Text(value) => value.clone(),
			Self::Number(value) => value.to_string(),
		}
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IdentifyResponse {
	pub contact: ContactSummary,
}

impl WeldService {
	/// Resolves one (email, phone) observation into its consolidated contact
	/// group, merging groups the observation bridges and appending a new
	/// secondary when it carries unseen information.
	///
	/// Runs entirely inside one transaction; on any failure nothing is
	/// persisted.
	pub async fn identify(&self, req: IdentifyRequest) -> Result<IdentifyResponse> {
		let email = resolve::normalize_identifier(req.email.as_deref());
		let phone_raw = req.phone_number.as_ref().map(PhoneField::to_text);
		let phone = resolve::normalize_identifier(phone_raw.as_deref());

		if email.is_none() && phone.is_none() {
			return Err(Error::InvalidRequest {
				message: "Either email or phoneNumber must be provided.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();
		let mut tx = self.db.pool.begin().await?;

		// Serialize against concurrent identifies sharing an identifier for the
		// whole read-decide-write sequence; without this, two identical calls
		// can both observe "no match" and each create a primary. Keys are
		// sorted so overlapping calls acquire in the same order.
		let mut lock_keys = Vec::new();

		if let Some(email) = email.as_deref() {
			lock_keys.push(format!("contact:email:{email}"));
		}
		if let Some(phone) = phone.as_deref() {
			lock_keys.push(format!("contact:phone:{phone}"));
		}

		lock_keys.sort();

		for key in &lock_keys {
			db::xact_lock_key(&mut tx, key).await?;
		}

		let matches =
			contacts::find_by_email_or_phone(&mut tx, email.as_deref(), phone.as_deref()).await?;

		if matches.is_empty() {
			let created = contacts::insert(&mut tx, NewContact {
				email,
				phone_number: phone,
				linked_id: None,
				link_precedence: LinkPrecedence::Primary,
				created_at: now,
			})
			.await?;
			let summary = summarize(std::slice::from_ref(&created), created.id)?;

			tx.commit().await?;

			tracing::info!(contact_id = created.id, "Created new primary contact.");

			return Ok(IdentifyResponse { contact: summary });
		}

		let mut primary_ids =
			resolve::implicated_primary_ids(&matches).into_iter().collect::<Vec<_>>();

		if !matches.iter().any(Contact::is_primary) {
			// Every match is a secondary. If the oldest one's link does not
			// resolve to a live row, the group lost its primary; repair by
			// promoting the oldest match in place.
			let oldest = &matches[0];
			let target = match oldest.linked_id {
				Some(linked_id) => contacts::find_by_id(&mut tx, linked_id).await?,
				None => None,
			};

			if target.is_none() {
				contacts::set_link(&mut tx, oldest.id, LinkPrecedence::Primary, None, now)
					.await?;

				if !primary_ids.contains(&oldest.id) {
					primary_ids.push(oldest.id);
				}

				tracing::warn!(contact_id = oldest.id, "Promoted orphaned secondary to primary.");
			}
		}

		let group = contacts::find_group(&mut tx, &primary_ids).await?;
		let election = resolve::elect_primary(&group).ok_or_else(|| Error::Storage {
			message: "Loaded an empty contact group.".to_string(),
		})?;

		if election.needs_promotion {
			contacts::set_link(&mut tx, election.primary_id, LinkPrecedence::Primary, None, now)
				.await?;

			tracing::warn!(
				contact_id = election.primary_id,
				"Promoted oldest group member to primary."
			);
		}

		let relinks = resolve::merge_relinks(&group, election.primary_id);

		if !relinks.is_empty() {
			tracing::debug!(
				primary_id = election.primary_id,
				relinked = relinks.len(),
				"Merging contact groups."
			);
		}

		for id in relinks {
			contacts::set_link(
				&mut tx,
				id,
				LinkPrecedence::Secondary,
				Some(election.primary_id),
				now,
			)
			.await?;
		}

		let mut group = contacts::find_group_of(&mut tx, election.primary_id).await?;

		if resolve::needs_new_secondary(&group, email.as_deref(), phone.as_deref()) {
			let created = contacts::insert(&mut tx, NewContact {
				email: email.clone(),
				phone_number: phone.clone(),
				linked_id: Some(election.primary_id),
				link_precedence: LinkPrecedence::Secondary,
				created_at: now,
			})
			.await?;

			tracing::info!(
				contact_id = created.id,
				primary_id = election.primary_id,
				"Appended new secondary contact."
			);

			group.push(created);
		}

		let summary = summarize(&group, election.primary_id)?;

		tx.commit().await?;

		Ok(IdentifyResponse { contact: summary })
	}
}

fn summarize(group: &[Contact], primary_id: i64) -> Result<ContactSummary> {
	resolve::assemble_summary(group, primary_id).ok_or_else(|| Error::Storage {
		message: "Ultimate primary missing from its own group.".to_string(),
	})
}
