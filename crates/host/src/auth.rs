//! Capability checks for privileged routes.

/// Named permissions, after the host platform's capability names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageOptions,
    EditPosts,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ManageOptions => "manage_options",
            Capability::EditPosts => "edit_posts",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthResult {
    Ok,
    /// No bearer token on the request
    MissingCredentials,
    Invalid,
    /// No admin token configured, so nobody holds any capability
    NotConfigured,
}

impl AuthResult {
    pub fn is_ok(self) -> bool {
        self == AuthResult::Ok
    }
}

/// The configured admin token grants every capability.
#[derive(Clone, Default)]
pub struct Credentials {
    admin_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn new(admin_token: Option<String>) -> Self {
        Credentials { admin_token: admin_token.filter(|t| !t.is_empty()) }
    }

    pub fn is_configured(&self) -> bool {
        self.admin_token.is_some()
    }

    pub fn check(&self, bearer: Option<&str>, capability: Capability) -> AuthResult {
        let Some(expected) = &self.admin_token else {
            return AuthResult::NotConfigured;
        };
        let Some(bearer) = bearer else {
            return AuthResult::MissingCredentials;
        };
        if constant_time_eq(bearer.as_bytes(), expected.as_bytes()) {
            debug!("granted {}", capability);
            AuthResult::Ok
        } else {
            AuthResult::Invalid
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_denies_everything() {
        let creds = Credentials::new(None);
        assert_eq!(creds.check(Some("anything"), Capability::ManageOptions), AuthResult::NotConfigured);
        let creds = Credentials::new(Some(String::new()));
        assert!(!creds.is_configured());
    }

    #[test]
    fn token_grants_all_capabilities() {
        let creds = Credentials::new(Some("s3cret".into()));
        assert!(creds.check(Some("s3cret"), Capability::ManageOptions).is_ok());
        assert!(creds.check(Some("s3cret"), Capability::EditPosts).is_ok());
        assert_eq!(creds.check(Some("s3cre"), Capability::EditPosts), AuthResult::Invalid);
        assert_eq!(creds.check(Some("s3creT"), Capability::EditPosts), AuthResult::Invalid);
        assert_eq!(creds.check(None, Capability::EditPosts), AuthResult::MissingCredentials);
    }

    #[test]
    fn debug_hides_token() {
        let creds = Credentials::new(Some("s3cret".into()));
        assert!(!format!("{creds:?}").contains("s3cret"));
    }
}
