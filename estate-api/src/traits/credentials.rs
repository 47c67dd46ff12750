/// Read-side of the session token, plus the one write the transport layer
/// is allowed to trigger.
///
/// The session store is the sole owner of the token. A gateway observing a
/// 401 calls [`CredentialStore::invalidate`] instead of touching the token
/// itself; the store clears state and broadcasts the logout.
pub trait CredentialStore: Send + Sync {
    /// Current bearer token, if a session exists.
    fn bearer_token(&self) -> Option<String>;

    /// The server no longer accepts the token. Clears the session
    /// everywhere; safe to call more than once.
    fn invalidate(&self);
}
