//! The signed-in user, as far as the board needs to know.
//!
//! Authentication and token storage live outside this crate; the engine only
//! asks for a display name to attribute new comments to.

/// Identity of the current user.
pub trait SessionProvider {
    /// Display name of the signed-in user, if anyone is signed in.
    fn current_user_display_name(&self) -> Option<String>;
}

/// Session with a fixed (possibly absent) user name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSession {
    name: Option<String>,
}

impl StaticSession {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.filter(|n| !n.trim().is_empty()),
        }
    }

    /// No one signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl SessionProvider for StaticSession {
    fn current_user_display_name(&self) -> Option<String> {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_is_anonymous() {
        assert_eq!(
            StaticSession::new(Some("  ".to_string())).current_user_display_name(),
            None
        );
        assert_eq!(StaticSession::anonymous().current_user_display_name(), None);
        assert_eq!(
            StaticSession::new(Some("Ada".to_string())).current_user_display_name(),
            Some("Ada".to_string())
        );
    }
}
