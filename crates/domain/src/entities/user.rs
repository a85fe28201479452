use crate::entities::Patch;
use crate::validation::{
    check_birth_date, check_email, check_not_blank, AgePolicy, ValidationErrors,
    BIRTH_DATE_EMPTY, EMAIL_EMPTY, FIRST_NAME_EMPTY, LAST_NAME_EMPTY,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Core User entity - represents the business domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// A validated user that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl User {
    /// Overwrites every field except `id`.
    pub fn replace_with(&mut self, replacement: NewUser) {
        self.email = replacement.email;
        self.first_name = replacement.first_name;
        self.last_name = replacement.last_name;
        self.birth_date = replacement.birth_date;
        self.address = replacement.address;
        self.phone_number = replacement.phone_number;
    }

    /// Merges a validated patch. Unset fields are left as they are.
    pub fn apply_patch(&mut self, patch: UserPatch) {
        if let Patch::Value(email) = patch.email {
            self.email = email;
        }
        if let Patch::Value(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Patch::Value(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Patch::Value(birth_date) = patch.birth_date {
            self.birth_date = birth_date;
        }
        patch.address.apply_to(&mut self.address);
        patch.phone_number.apply_to(&mut self.phone_number);
    }
}

/// Payload for create and full replace. Every field is optional at the
/// serde level so that missing fields surface as validation messages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl UserRequest {
    /// Full-write profile. Lower-cases the email on success.
    pub fn validate(self, policy: &AgePolicy, today: NaiveDate) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = self.email.unwrap_or_default();
        check_email(&mut errors, &email);

        let first_name = self.first_name.unwrap_or_default();
        check_not_blank(&mut errors, "firstName", &first_name, FIRST_NAME_EMPTY);

        let last_name = self.last_name.unwrap_or_default();
        check_not_blank(&mut errors, "lastName", &last_name, LAST_NAME_EMPTY);

        match self.birth_date {
            Some(birth_date) => check_birth_date(&mut errors, policy, birth_date, today),
            None => errors.add("birthDate", BIRTH_DATE_EMPTY),
        }

        let Some(birth_date) = self.birth_date.filter(|_| errors.is_empty()) else {
            return Err(errors);
        };

        Ok(NewUser {
            email: email.to_lowercase(),
            first_name,
            last_name,
            birth_date,
            address: self.address,
            phone_number: self.phone_number,
        })
    }
}

/// Payload for a partial update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub first_name: Patch<String>,
    #[serde(default)]
    pub last_name: Patch<String>,
    #[serde(default)]
    pub birth_date: Patch<NaiveDate>,
    #[serde(default)]
    pub address: Patch<String>,
    #[serde(default)]
    pub phone_number: Patch<String>,
}

impl UserPatch {
    /// Partial-update profile: only present fields are checked. Explicit
    /// `null` is rejected on fields the record cannot be without.
    pub fn validate(self, policy: &AgePolicy, today: NaiveDate) -> Result<UserPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self.email.as_ref() {
            Patch::Unset => {}
            Patch::Null => errors.add("email", EMAIL_EMPTY),
            Patch::Value(email) => check_email(&mut errors, email),
        }

        match self.first_name.as_ref() {
            Patch::Unset => {}
            Patch::Null => errors.add("firstName", FIRST_NAME_EMPTY),
            Patch::Value(name) => check_not_blank(&mut errors, "firstName", name, FIRST_NAME_EMPTY),
        }

        match self.last_name.as_ref() {
            Patch::Unset => {}
            Patch::Null => errors.add("lastName", LAST_NAME_EMPTY),
            Patch::Value(name) => check_not_blank(&mut errors, "lastName", name, LAST_NAME_EMPTY),
        }

        match self.birth_date.as_ref() {
            Patch::Unset => {}
            Patch::Null => errors.add("birthDate", BIRTH_DATE_EMPTY),
            Patch::Value(birth_date) => check_birth_date(&mut errors, policy, *birth_date, today),
        }

        errors.into_result()?;

        Ok(UserPatch {
            email: self.email.map(|email| email.to_lowercase()),
            ..self
        })
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_unset()
            && self.first_name.is_unset()
            && self.last_name.is_unset()
            && self.birth_date.is_unset()
            && self.address.is_unset()
            && self.phone_number.is_unset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 6, 15)
    }

    fn stored_user() -> User {
        User {
            id: 7,
            email: "b@x.com".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Builder".to_string(),
            birth_date: date(1985, 3, 2),
            address: Some("1 Main St".to_string()),
            phone_number: Some("555-0100".to_string()),
        }
    }

    #[test]
    fn test_full_profile_reports_every_violation() {
        let request = UserRequest {
            email: Some("not-an-email".to_string()),
            first_name: Some("   ".to_string()),
            last_name: None,
            birth_date: Some(date(2030, 1, 1)),
            ..Default::default()
        };

        let errors = request.validate(&AgePolicy::default(), today()).unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("email"), Some("Email is not valid"));
        assert_eq!(errors.get("firstName"), Some(FIRST_NAME_EMPTY));
        assert_eq!(errors.get("lastName"), Some(LAST_NAME_EMPTY));
        assert_eq!(errors.get("birthDate"), Some("Birth date should be in past"));
    }

    #[test]
    fn test_full_profile_lowercases_email() {
        let request = UserRequest {
            email: Some("Alice@Example.COM".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: Some("Smith".to_string()),
            birth_date: Some(date(1990, 1, 1)),
            address: None,
            phone_number: Some("555-0199".to_string()),
        };

        let user = request.validate(&AgePolicy::default(), today()).unwrap();

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.address, None);
        assert_eq!(user.phone_number.as_deref(), Some("555-0199"));
    }

    #[test]
    fn test_full_profile_applies_configured_age() {
        let request = UserRequest {
            email: Some("kid@example.com".to_string()),
            first_name: Some("Kid".to_string()),
            last_name: Some("Young".to_string()),
            birth_date: Some(date(2010, 1, 1)),
            ..Default::default()
        };

        let errors = request
            .clone()
            .validate(&AgePolicy::new(21), today())
            .unwrap_err();
        assert_eq!(errors.get("birthDate"), Some("User must be at least 21 years old"));

        assert!(request.validate(&AgePolicy::new(10), today()).is_ok());
    }

    #[test]
    fn test_empty_patch_is_valid() {
        let patch = UserPatch::default();
        assert!(patch.is_empty());
        assert!(patch.validate(&AgePolicy::default(), today()).is_ok());
    }

    #[test]
    fn test_patch_checks_present_fields_only() {
        let patch: UserPatch = serde_json::from_value(serde_json::json!({
            "email": "broken",
            "lastName": "",
            "birthDate": "2020-01-01"
        }))
        .unwrap();

        let errors = patch.validate(&AgePolicy::default(), today()).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("email"), Some("Email is not valid"));
        assert_eq!(errors.get("lastName"), Some(LAST_NAME_EMPTY));
        assert_eq!(errors.get("birthDate"), Some("User must be at least 18 years old"));
        assert_eq!(errors.get("firstName"), None);
    }

    #[test]
    fn test_patch_rejects_null_on_required_fields() {
        let patch: UserPatch =
            serde_json::from_value(serde_json::json!({ "firstName": null, "address": null }))
                .unwrap();

        let errors = patch.validate(&AgePolicy::default(), today()).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("firstName"), Some(FIRST_NAME_EMPTY));
    }

    #[test]
    fn test_apply_patch_touches_only_present_fields() {
        let mut user = stored_user();
        let before = user.clone();

        let patch: UserPatch =
            serde_json::from_value(serde_json::json!({ "firstName": "Z" })).unwrap();
        user.apply_patch(patch.validate(&AgePolicy::default(), today()).unwrap());

        assert_eq!(user.first_name, "Z");
        assert_eq!(user.email, before.email);
        assert_eq!(user.last_name, before.last_name);
        assert_eq!(user.birth_date, before.birth_date);
        assert_eq!(user.address, before.address);
        assert_eq!(user.phone_number, before.phone_number);
        assert_eq!(user.id, before.id);
    }

    #[test]
    fn test_apply_patch_clears_optional_fields_on_null() {
        let mut user = stored_user();

        let patch: UserPatch = serde_json::from_value(serde_json::json!({
            "address": null,
            "phoneNumber": "555-0123",
            "email": "New@X.com"
        }))
        .unwrap();
        user.apply_patch(patch.validate(&AgePolicy::default(), today()).unwrap());

        assert_eq!(user.address, None);
        assert_eq!(user.phone_number.as_deref(), Some("555-0123"));
        assert_eq!(user.email, "new@x.com");
    }

    #[test]
    fn test_replace_with_resets_optional_fields() {
        let mut user = stored_user();

        user.replace_with(NewUser {
            email: "c@x.com".to_string(),
            first_name: "Carl".to_string(),
            last_name: "Cook".to_string(),
            birth_date: date(1970, 7, 7),
            address: None,
            phone_number: None,
        });

        assert_eq!(user.id, 7);
        assert_eq!(user.email, "c@x.com");
        assert_eq!(user.address, None);
        assert_eq!(user.phone_number, None);
    }
}
