/// Identity of the account the store is keyed by.
///
/// Passed explicitly into every store call; nothing in the crate holds a
/// global "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    user: String,
}

impl SessionToken {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}
