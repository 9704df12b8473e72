use std::sync::RwLock;

use tangle_shared::User;

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    user: User,
}

/// Current viewer identity. Constructed once at the composition root and
/// injected into the API client and stores — no ambient singleton lookup.
#[derive(Debug, Default)]
pub struct Session {
    creds: RwLock<Option<Credentials>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_credentials(&self, token: impl Into<String>, user: User) {
        *self.creds.write().unwrap() = Some(Credentials {
            token: token.into(),
            user,
        });
    }

    pub fn clear(&self) {
        *self.creds.write().unwrap() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.creds
            .read()
            .unwrap()
            .as_ref()
            .map(|c| c.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.creds.read().unwrap().as_ref().map(|c| c.user.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.creds
            .read()
            .unwrap()
            .as_ref()
            .map(|c| c.user.id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.creds.read().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "Asha".into(),
            email: None,
            profile_image: None,
            emoji: None,
        }
    }

    #[test]
    fn credentials_round_trip() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.user_id(), None);

        session.set_credentials("tok", user());
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.user_id().as_deref(), Some("u1"));

        session.clear();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }
}
