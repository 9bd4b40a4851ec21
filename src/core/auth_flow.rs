use crate::domain::model::{Session, User};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unknown,
    SignedOut,
    SignedIn(User),
}

impl AuthState {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => AuthState::SignedIn(session.user.clone()),
            None => AuthState::SignedOut,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// 頁面對登入狀態的要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Dashboard-like pages.
    RequireSignedIn,
    /// Landing and login pages.
    RequireSignedOut,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    ToLogin,
    ToDashboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: AuthState,
    pub to: AuthState,
    pub redirect: Option<Redirect>,
}

/// Auth state machine driven only by session-change events.
///
/// Re-delivering the current state yields no transition. A redirect is
/// produced only on the transition into a state the guard forbids.
#[derive(Debug, Clone)]
pub struct AuthFlow {
    guard: RouteGuard,
    state: AuthState,
}

impl AuthFlow {
    pub fn new(guard: RouteGuard) -> Self {
        Self {
            guard,
            state: AuthState::Unknown,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_settled(&self) -> bool {
        self.state != AuthState::Unknown
    }

    pub fn apply(&mut self, session: Option<&Session>) -> Option<Transition> {
        let next = AuthState::from_session(session);
        if next == self.state {
            return None;
        }

        let redirect = match (&next, self.guard) {
            (AuthState::SignedOut, RouteGuard::RequireSignedIn) => Some(Redirect::ToLogin),
            (AuthState::SignedIn(_), RouteGuard::RequireSignedOut) => Some(Redirect::ToDashboard),
            _ => None,
        };

        let from = std::mem::replace(&mut self.state, next.clone());
        tracing::debug!(?from, to = ?next, ?redirect, "auth state transition");

        Some(Transition {
            from,
            to: next,
            redirect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: &str) -> Session {
        Session {
            access_token: format!("token-{}", user_id),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_at: None,
            user: User {
                id: user_id.to_string(),
                email: Some(format!("{}@example.com", user_id)),
            },
        }
    }

    #[test]
    fn test_starts_unknown() {
        let flow = AuthFlow::new(RouteGuard::RequireSignedIn);
        assert_eq!(flow.state(), &AuthState::Unknown);
        assert!(!flow.is_settled());
    }

    #[test]
    fn test_signed_out_on_guarded_page_redirects_to_login() {
        let mut flow = AuthFlow::new(RouteGuard::RequireSignedIn);
        let transition = flow.apply(None).unwrap();

        assert_eq!(transition.from, AuthState::Unknown);
        assert_eq!(transition.to, AuthState::SignedOut);
        assert_eq!(transition.redirect, Some(Redirect::ToLogin));
    }

    #[test]
    fn test_repeated_event_is_noop() {
        let mut flow = AuthFlow::new(RouteGuard::RequireSignedIn);
        let ana = session("ana");

        assert!(flow.apply(Some(&ana)).is_some());
        assert!(flow.apply(Some(&ana)).is_none());
        assert!(flow.apply(None).is_some());
        assert!(flow.apply(None).is_none());
    }

    #[test]
    fn test_signed_in_on_landing_redirects_to_dashboard() {
        let mut flow = AuthFlow::new(RouteGuard::RequireSignedOut);
        assert_eq!(flow.apply(None).unwrap().redirect, None);

        let transition = flow.apply(Some(&session("ana"))).unwrap();
        assert_eq!(transition.redirect, Some(Redirect::ToDashboard));
        assert_eq!(flow.state().user().unwrap().id, "ana");
    }

    #[test]
    fn test_public_guard_never_redirects() {
        let mut flow = AuthFlow::new(RouteGuard::Public);
        assert_eq!(flow.apply(Some(&session("ana"))).unwrap().redirect, None);
        assert_eq!(flow.apply(None).unwrap().redirect, None);
    }

    #[test]
    fn test_switching_users_is_a_transition() {
        let mut flow = AuthFlow::new(RouteGuard::RequireSignedIn);
        flow.apply(Some(&session("ana")));

        let transition = flow.apply(Some(&session("bia"))).unwrap();
        assert_eq!(transition.redirect, None);
        assert_eq!(transition.to.user().unwrap().id, "bia");
    }
}
