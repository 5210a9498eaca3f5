use std::collections::HashSet;

use ridepool_core::{CoreError, CoreResult};

use crate::drafts::{EventDraft, ListingBase, OfferDraft, RequestDraft};

pub const MAX_NOTES_CHARS: usize = 1000;
pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_SEATS: u32 = 64;

pub fn validate_notes(notes: Option<&str>) -> CoreResult<()> {
    match notes {
        Some(text) if text.chars().count() > MAX_NOTES_CHARS => Err(CoreError::Validation(format!(
            "notes are limited to {} characters",
            MAX_NOTES_CHARS
        ))),
        _ => Ok(()),
    }
}

pub fn validate_base(base: &ListingBase) -> CoreResult<()> {
    base.contact.validate()?;
    validate_notes(base.notes.as_deref())
}

pub fn validate_seats(total_seats: u32) -> CoreResult<()> {
    if total_seats == 0 {
        return Err(CoreError::Validation("an offer needs at least one seat".to_string()));
    }
    if total_seats > MAX_SEATS {
        return Err(CoreError::Validation(format!(
            "an offer can have at most {} seats",
            MAX_SEATS
        )));
    }
    Ok(())
}

pub fn validate_passenger_count(passenger_count: u32) -> CoreResult<()> {
    if passenger_count == 0 {
        return Err(CoreError::Validation("passenger count must be at least 1".to_string()));
    }
    if passenger_count > MAX_SEATS {
        return Err(CoreError::Validation(format!(
            "passenger count is limited to {}",
            MAX_SEATS
        )));
    }
    Ok(())
}

/// One or two legs, at most one per direction.
pub fn validate_offer_draft(draft: &OfferDraft) -> CoreResult<()> {
    validate_base(&draft.base)?;
    validate_seats(draft.total_seats)?;

    if draft.legs.is_empty() || draft.legs.len() > 2 {
        return Err(CoreError::Validation(
            "an offer needs a going leg, a return leg, or both".to_string(),
        ));
    }

    let mut kinds = HashSet::new();
    for leg in &draft.legs {
        if !kinds.insert(leg.kind) {
            return Err(CoreError::Validation(format!(
                "duplicate {} leg",
                leg.kind.as_str()
            )));
        }
        if leg.endpoint.address.trim().is_empty() && leg.endpoint.point.is_none() {
            return Err(CoreError::Validation(format!(
                "the {} leg needs an address",
                leg.kind.as_str()
            )));
        }
    }

    Ok(())
}

pub fn validate_request_draft(draft: &RequestDraft) -> CoreResult<()> {
    validate_base(&draft.base)?;
    validate_passenger_count(draft.passenger_count)
}

pub fn validate_event_name(name: &str) -> CoreResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("event name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(CoreError::Validation(format!(
            "event name is limited to {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(())
}

pub fn validate_event_draft(draft: &EventDraft) -> CoreResult<()> {
    validate_event_name(&draft.name)?;

    if let Some(ends_at) = draft.ends_at {
        if ends_at <= draft.starts_at {
            return Err(CoreError::Validation("an event must end after it starts".to_string()));
        }
    }

    validate_privacy(draft.is_private, draft.access_code.as_deref())
}

pub fn validate_privacy(is_private: bool, access_code: Option<&str>) -> CoreResult<()> {
    if is_private && access_code.map_or(true, |c| c.trim().is_empty()) {
        return Err(CoreError::Validation(
            "a private event needs an access code".to_string(),
        ));
    }
    Ok(())
}
