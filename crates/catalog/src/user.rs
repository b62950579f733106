use serde::{Deserialize, Serialize};

use libris_core::{Entity, UserId};

use crate::error::{LibraryError, LibraryResult};

/// Entity: a registered borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    phone: String,
    active: bool,
}

impl User {
    /// A new, active user. Performs no validation.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            active: true,
        }
    }

    pub fn id_typed(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `<name> (<email>) - <Active|Inactive>`
    pub fn summary(&self) -> String {
        let status = if self.active { "Active" } else { "Inactive" };
        format!("{} ({}) - {}", self.name, self.email, status)
    }

    /// Invariant helper: only active users with a name and email may borrow.
    pub fn may_borrow(&self) -> bool {
        self.active && !self.name.is_empty() && !self.email.is_empty()
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn update_contact(
        &mut self,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> LibraryResult<()> {
        let email = email.into();
        validate_email(&email)?;
        self.replace_contact(email, phone.into());
        Ok(())
    }

    pub(crate) fn replace_contact(&mut self, email: String, phone: String) {
        self.email = email;
        self.phone = phone;
    }
}

/// Basic format check: must contain `@`.
pub(crate) fn validate_email(email: &str) -> LibraryResult<()> {
    if !email.contains('@') {
        return Err(LibraryError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_user() -> User {
        User::new(UserId::new(2), "Carlos", "carlos@example.com", "+56 999")
    }

    #[test]
    fn new_users_are_active_and_may_borrow() {
        let user = test_user();
        assert!(user.is_active());
        assert!(user.may_borrow());
        assert_eq!(user.summary(), "Carlos (carlos@example.com) - Active");
    }

    #[test]
    fn deactivated_user_may_not_borrow() {
        let mut user = test_user();
        user.deactivate();
        assert!(!user.may_borrow());
        assert_eq!(user.summary(), "Carlos (carlos@example.com) - Inactive");
    }

    #[test]
    fn nameless_user_may_not_borrow() {
        let user = User::new(UserId::new(1), "", "a@b", "");
        assert!(!user.may_borrow());
    }

    #[test]
    fn update_contact_rejects_email_without_at() {
        let mut user = test_user();
        let err = user.update_contact("stillbad", "1").unwrap_err();
        assert_eq!(err, LibraryError::InvalidEmail("stillbad".to_string()));
        assert_eq!(user.email(), "carlos@example.com");
        assert_eq!(user.phone(), "+56 999");
    }

    #[test]
    fn update_contact_overwrites_both_fields() {
        let mut user = test_user();
        user.update_contact("new@example.com", "123").unwrap();
        assert_eq!(user.email(), "new@example.com");
        assert_eq!(user.phone(), "123");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for a user with name and email, eligibility always
        /// tracks the active flag.
        #[test]
        fn may_borrow_tracks_activation(toggles in prop::collection::vec(any::<bool>(), 0..40)) {
            let mut user = test_user();
            for activate in toggles {
                if activate {
                    user.activate();
                } else {
                    user.deactivate();
                }
                prop_assert_eq!(user.may_borrow(), user.is_active());
            }
        }
    }
}
