use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::model::User;

/// Who is logged in. Holds the id only; the user record is looked up live so
/// edits and deletions show through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Ulid,
    pub started_at: DateTime<Utc>,
}

/// Find the user whose login and password match exactly.
///
/// Passwords are stored and compared in plaintext.
pub fn authenticate<'a>(users: &'a [User], login: &str, password: &str) -> Option<&'a User> {
    users.iter().find(|u| u.login == login && u.password == password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewUser, Role};

    fn users() -> Vec<User> {
        vec![
            User::from_draft(Ulid::new(), NewUser::new("Admin", "admin", "admin123", Role::Admin).unwrap(), Utc::now()),
            User::from_draft(Ulid::new(), NewUser::new("Ana", "ana", "secret", Role::Standard).unwrap(), Utc::now()),
        ]
    }

    #[test]
    fn matches_login_and_password() {
        let users = users();
        assert_eq!(authenticate(&users, "ana", "secret").map(|u| u.id), Some(users[1].id));
    }

    #[test]
    fn wrong_password_or_unknown_login() {
        let users = users();
        assert!(authenticate(&users, "ana", "Secret").is_none());
        assert!(authenticate(&users, "bob", "secret").is_none());
        assert!(authenticate(&users, "", "").is_none());
    }
}
