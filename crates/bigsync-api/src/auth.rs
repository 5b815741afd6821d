use secrecy::SecretString;

/// Credentials for authenticating with a BIG-IP management interface.
///
/// iControl REST uses token-based auth: a login request exchanges these
/// credentials for a short-lived token that is sent on every subsequent
/// request via the `X-F5-Auth-Token` header.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    /// Authentication provider on the device. `tmos` for local accounts;
    /// remote-auth deployments (RADIUS, TACACS+, LDAP) use their own
    /// provider names.
    pub login_provider: String,
}

impl Credentials {
    /// Credentials against the local (`tmos`) authentication provider.
    pub fn local(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            login_provider: "tmos".into(),
        }
    }

    /// Credentials against a named remote authentication provider.
    pub fn with_provider(
        username: impl Into<String>,
        password: SecretString,
        login_provider: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password,
            login_provider: login_provider.into(),
        }
    }
}
