use shared::types::User;

/// Authentication status of one request. There is no step-up: a request is
/// resolved once and stays in that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Authenticated,
}

/// Request-scoped context handed to every operation and to both gate layers.
///
/// Built once per request from the resolved session and shared read-only
/// (behind an `Arc`) for the rest of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    session: Option<User>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { session: None }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            session: Some(user),
        }
    }

    pub fn from_session(session: Option<User>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> Option<&User> {
        self.session.as_ref()
    }

    pub fn status(&self) -> AuthStatus {
        match self.session {
            Some(_) => AuthStatus::Authenticated,
            None => AuthStatus::Anonymous,
        }
    }
}
