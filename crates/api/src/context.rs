use teatrade_auth::{Principal, Role};
use teatrade_trading::EditContext;

/// Correlation id of the current request (the `X-Request-ID` value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Principal context for a request (authenticated identity + roles).
///
/// Inserted by the auth middleware; must be present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn sub(&self) -> &str {
        &self.principal.sub
    }

    pub fn email(&self) -> Option<&str> {
        self.principal.email.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.principal.name.as_deref()
    }

    pub fn roles(&self) -> &[Role] {
        &self.principal.roles
    }

    pub fn is_admin(&self) -> bool {
        self.principal.is_admin()
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Edit context stamped with the caller and the current time.
    pub fn edit_context(&self) -> EditContext {
        EditContext::new(chrono::Utc::now(), self.sub())
    }
}
