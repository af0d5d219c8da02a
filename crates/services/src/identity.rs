//! Identity gate seam. The store never looks inside it; front ends ask it
//! whether to proceed or send the user to sign in.

use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
}

impl Identity {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed(Identity),
    Redirect,
}

pub trait IdentityGate: Send + Sync {
    fn current_user(&self) -> Option<Identity>;

    /// Receiver that observes every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Decide whether a page may load for the current identity.
#[must_use]
pub fn gate(identity: &dyn IdentityGate) -> GateDecision {
    identity
        .current_user()
        .map_or(GateDecision::Redirect, GateDecision::Proceed)
}

/// Process-local gate with no credential checks.
pub struct LocalIdentityGate {
    state: watch::Sender<Option<Identity>>,
}

impl LocalIdentityGate {
    #[must_use]
    pub fn new(initial: Option<Identity>) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state }
    }

    pub fn sign_in(&self, identity: Identity) {
        self.state.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        self.state.send_replace(None);
    }
}

impl IdentityGate for LocalIdentityGate {
    fn current_user(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }
}
