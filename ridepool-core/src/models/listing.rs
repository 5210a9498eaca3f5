use serde::{Deserialize, Serialize};
use ridepool_shared::Masked;

use crate::identity::Identity;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Who a listing is willing to ride with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    #[default]
    Any,
    Male,
    Female,
}

impl Preference {
    /// Unknown gender only passes an unrestricted filter.
    pub fn admits(&self, gender: Option<Gender>) -> bool {
        match self {
            Preference::Any => true,
            Preference::Male => gender == Some(Gender::Male),
            Preference::Female => gender == Some(Gender::Female),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Going,
    Return,
}

impl LegKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegKind::Going => "going",
            LegKind::Return => "return",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    Going,
    Return,
    Both,
}

impl TripType {
    pub fn covers(&self, leg: LegKind) -> bool {
        matches!(
            (self, leg),
            (TripType::Both, _) | (TripType::Going, LegKind::Going) | (TripType::Return, LegKind::Return)
        )
    }

    pub fn legs(&self) -> Vec<LegKind> {
        match self {
            TripType::Going => vec![LegKind::Going],
            TripType::Return => vec![LegKind::Return],
            TripType::Both => vec![LegKind::Going, LegKind::Return],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactVisibility {
    pub show_name: bool,
    pub show_phone: bool,
    pub show_email: bool,
}

impl Default for ContactVisibility {
    fn default() -> Self {
        Self {
            show_name: true,
            show_phone: true,
            show_email: true,
        }
    }
}

pub const HIDDEN_NAME: &str = "Hidden";

/// Contact details attached to a listing. Each channel can be hidden from other attendees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactCard {
    pub name: String,
    pub phone: Option<Masked<String>>,
    pub email: Option<Masked<String>>,
    #[serde(default)]
    pub visibility: ContactVisibility,
}

impl ContactCard {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            name: identity.name.clone(),
            phone: identity.phone.clone().map(Masked::new),
            email: identity.email.clone().map(Masked::new),
            visibility: ContactVisibility::default(),
        }
    }

    /// A name and at least one way to reach the person.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("contact name is required".to_string()));
        }

        let has_phone = self.phone.as_ref().is_some_and(|p| !p.expose().trim().is_empty());
        let has_email = self.email.as_ref().is_some_and(|e| !e.expose().trim().is_empty());
        if !has_phone && !has_email {
            return Err(CoreError::Validation(
                "a phone number or an email address is required".to_string(),
            ));
        }

        if let Some(email) = &self.email {
            if !email.expose().trim().is_empty() && !email.expose().contains('@') {
                return Err(CoreError::Validation("email address is malformed".to_string()));
            }
        }

        Ok(())
    }

    /// The card as other attendees see it.
    pub fn redacted(&self) -> Self {
        Self {
            name: if self.visibility.show_name {
                self.name.clone()
            } else {
                HIDDEN_NAME.to_string()
            },
            phone: self.phone.clone().filter(|_| self.visibility.show_phone),
            email: self.email.clone().filter(|_| self.visibility.show_email),
            visibility: self.visibility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> ContactCard {
        ContactCard {
            name: "Ola".to_string(),
            phone: Some(Masked::from("+48 600 000 000")),
            email: Some(Masked::from("ola@example.com")),
            visibility: ContactVisibility::default(),
        }
    }

    #[test]
    fn test_preference_admits() {
        assert!(Preference::Any.admits(None));
        assert!(Preference::Female.admits(Some(Gender::Female)));
        assert!(!Preference::Female.admits(Some(Gender::Male)));
        assert!(!Preference::Male.admits(None));
    }

    #[test]
    fn test_trip_type_covers() {
        assert!(TripType::Both.covers(LegKind::Return));
        assert!(TripType::Going.covers(LegKind::Going));
        assert!(!TripType::Going.covers(LegKind::Return));
    }

    #[test]
    fn test_contact_requires_a_channel() {
        let mut c = card();
        assert!(c.validate().is_ok());

        c.phone = None;
        c.email = None;
        assert!(matches!(c.validate(), Err(CoreError::Validation(_))));

        let mut c = card();
        c.name = "  ".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_redaction_hides_each_channel_independently() {
        let mut c = card();
        c.visibility.show_phone = false;
        let public = c.redacted();
        assert_eq!(public.name, "Ola");
        assert!(public.phone.is_none());
        assert!(public.email.is_some());

        c.visibility.show_name = false;
        assert_eq!(c.redacted().name, HIDDEN_NAME);
    }
}
