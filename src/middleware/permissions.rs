//! Per-action permission rules for the catalog endpoints.
//!
//! Reads are open to everyone, writes need a staff account. Which products a
//! caller may see is decided separately by [`Visibility`].

use crate::{error::AppError, middleware::auth::AuthUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Featured,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    pub fn is_read(self) -> bool {
        matches!(self, Action::List | Action::Retrieve | Action::Featured)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    AllowAny,
    IsAdminUser,
}

impl Permission {
    pub fn for_action(action: Action) -> Self {
        if action.is_read() {
            Permission::AllowAny
        } else {
            Permission::IsAdminUser
        }
    }

    pub fn check(self, caller: Option<&AuthUser>) -> Result<(), AppError> {
        match (self, caller) {
            (Permission::AllowAny, _) => Ok(()),
            (Permission::IsAdminUser, None) => Err(AppError::Unauthorized(
                "Authentication credentials were not provided".into(),
            )),
            (Permission::IsAdminUser, Some(user)) if user.is_staff => Ok(()),
            (Permission::IsAdminUser, Some(_)) => Err(AppError::Forbidden),
        }
    }
}

/// Checks `action` for `caller` and hands back the staff user on success.
pub fn staff_for<'a>(action: Action, caller: Option<&'a AuthUser>) -> Result<&'a AuthUser, AppError> {
    Permission::for_action(action).check(caller)?;
    caller.ok_or_else(|| AppError::Unauthorized("Authentication credentials were not provided".into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    ActiveOnly,
}

impl Visibility {
    pub fn for_caller(caller: Option<&AuthUser>) -> Self {
        match caller {
            Some(user) if user.is_staff => Visibility::All,
            _ => Visibility::ActiveOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(is_staff: bool) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            is_staff,
        }
    }

    #[test]
    fn reads_are_open_and_writes_need_staff() {
        for action in [Action::List, Action::Retrieve, Action::Featured] {
            assert_eq!(Permission::for_action(action), Permission::AllowAny);
        }
        for action in [
            Action::Create,
            Action::Update,
            Action::PartialUpdate,
            Action::Destroy,
        ] {
            assert_eq!(Permission::for_action(action), Permission::IsAdminUser);
        }
    }

    #[test]
    fn admin_permission_rejects_anonymous_and_customers() {
        let customer = user(false);
        let staff = user(true);

        assert!(matches!(
            Permission::IsAdminUser.check(None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            Permission::IsAdminUser.check(Some(&customer)),
            Err(AppError::Forbidden)
        ));
        assert!(Permission::IsAdminUser.check(Some(&staff)).is_ok());
        assert!(Permission::AllowAny.check(None).is_ok());
    }

    #[test]
    fn staff_for_returns_the_staff_caller() {
        let staff = user(true);
        let resolved = staff_for(Action::Destroy, Some(&staff)).expect("staff allowed");
        assert_eq!(resolved.user_id, staff.user_id);
        assert!(staff_for(Action::Create, Some(&user(false))).is_err());
    }

    #[test]
    fn only_staff_see_inactive_products() {
        assert_eq!(Visibility::for_caller(None), Visibility::ActiveOnly);
        assert_eq!(
            Visibility::for_caller(Some(&user(false))),
            Visibility::ActiveOnly
        );
        assert_eq!(Visibility::for_caller(Some(&user(true))), Visibility::All);
    }
}
