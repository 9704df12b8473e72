use std::sync::{Arc, Mutex};

use tangle_shared::{RegisterRequest, ResetPasswordRequest};

use crate::api::TangleApi;
use crate::error::ApiError;
use crate::events::{Notifier, UiEvent};
use crate::session::Session;

#[derive(Debug, Default)]
struct AuthFlowState {
    loading: bool,
    error: Option<String>,
    avatars: Vec<String>,
}

/// Login and the three-step signup flow (send OTP, verify, complete),
/// plus password recovery. Successful credentials land in the shared
/// `Session` and are announced on the event channel.
pub struct AuthStore {
    api: Arc<dyn TangleApi>,
    session: Arc<Session>,
    events: Notifier,
    state: Mutex<AuthFlowState>,
}

impl AuthStore {
    pub fn new(api: Arc<dyn TangleApi>, session: Arc<Session>, events: Notifier) -> Self {
        Self {
            api,
            session,
            events,
            state: Mutex::new(AuthFlowState::default()),
        }
    }

    fn begin(&self) {
        let mut state = self.state.lock().unwrap();
        state.loading = true;
        state.error = None;
    }

    fn finish(&self) {
        self.state.lock().unwrap().loading = false;
    }

    fn fail(&self, err: &ApiError) {
        let mut state = self.state.lock().unwrap();
        state.loading = false;
        state.error = Some(err.user_message());
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        self.begin();
        match self.api.login(email, password).await {
            Ok(auth) => {
                self.session.set_credentials(auth.token, auth.user.clone());
                self.finish();
                self.events.emit(UiEvent::LoginSucceeded { user: auth.user });
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub async fn send_signup_otp(&self, email: &str) -> Result<(), ApiError> {
        self.begin();
        match self.api.register_otp(email).await {
            Ok(()) => {
                self.finish();
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub async fn verify_signup_otp(&self, email: &str, otp: &str) -> Result<(), ApiError> {
        self.begin();
        match self.api.verify_register_otp(email, otp).await {
            Ok(()) => {
                self.finish();
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Final signup step; behaves like a login on success.
    pub async fn complete_signup(&self, profile: RegisterRequest) -> Result<(), ApiError> {
        self.begin();
        match self.api.register(profile).await {
            Ok(auth) => {
                self.session.set_credentials(auth.token, auth.user.clone());
                self.finish();
                self.events.emit(UiEvent::LoginSucceeded { user: auth.user });
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.begin();
        match self.api.forgot_password(email).await {
            Ok(()) => {
                self.finish();
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), ApiError> {
        self.begin();
        match self.api.reset_password(request).await {
            Ok(()) => {
                self.finish();
                Ok(())
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub async fn load_avatars(&self) -> Result<Vec<String>, ApiError> {
        self.begin();
        match self.api.get_avatars().await {
            Ok(avatars) => {
                let mut state = self.state.lock().unwrap();
                state.loading = false;
                state.avatars = avatars.clone();
                Ok(avatars)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub fn logout(&self) {
        self.session.clear();
    }

    pub fn clear_error(&self) {
        self.state.lock().unwrap().error = None;
    }

    // ── Snapshots ──

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error.clone()
    }

    pub fn avatars(&self) -> Vec<String> {
        self.state.lock().unwrap().avatars.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::StubApi;

    fn fixture() -> (
        Arc<StubApi>,
        Arc<Session>,
        AuthStore,
        tokio::sync::mpsc::UnboundedReceiver<UiEvent>,
    ) {
        let api = StubApi::new();
        let session = Arc::new(Session::new());
        let (events, rx) = Notifier::channel();
        let store = AuthStore::new(api.clone(), session.clone(), events);
        (api, session, store, rx)
    }

    #[tokio::test]
    async fn login_stores_credentials_and_announces() {
        let (_api, session, store, mut rx) = fixture();
        store.login("a@b.c", "pw").await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.user_id().as_deref(), Some("u1"));
        assert!(!store.is_loading());
        assert!(matches!(
            rx.try_recv().unwrap(),
            UiEvent::LoginSucceeded { user } if user.id == "u1"
        ));
    }

    #[tokio::test]
    async fn failed_login_surfaces_the_server_message() {
        let (api, session, store, mut rx) = fixture();
        *api.login_result.lock().unwrap() = Some(Err(ApiError::Server {
            status: 401,
            message: Some("Invalid credentials".into()),
        }));

        assert!(store.login("a@b.c", "wrong").await.is_err());
        assert!(!session.is_authenticated());
        assert_eq!(store.error().as_deref(), Some("Invalid credentials"));
        assert!(rx.try_recv().is_err());

        store.clear_error();
        assert_eq!(store.error(), None);
    }

    #[tokio::test]
    async fn signup_flow_calls_each_endpoint_in_turn() {
        let (api, session, store, _rx) = fixture();
        store.send_signup_otp("a@b.c").await.unwrap();
        store.verify_signup_otp("a@b.c", "123456").await.unwrap();
        store
            .complete_signup(RegisterRequest {
                name: "Asha".into(),
                email: "a@b.c".into(),
                password: "pw".into(),
                emoji: None,
                location: None,
                interests: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(api.call_count("register_otp:"), 1);
        assert_eq!(api.call_count("verify_otp:"), 1);
        assert_eq!(api.call_count("register:"), 1);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_the_session() {
        let (_api, session, store, _rx) = fixture();
        store.login("a@b.c", "pw").await.unwrap();
        assert!(session.is_authenticated());
        store.logout();
        assert!(!session.is_authenticated());
    }
}
