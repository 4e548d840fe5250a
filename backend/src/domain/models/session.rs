/// The signed-in user on whose behalf a call is made.
///
/// Passed explicitly into every owner-scoped operation; the domain layer never
/// reads an ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionContext {
    user_id: String,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}
