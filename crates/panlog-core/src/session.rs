//! Explicit per-profile session state.

/// Credentials and identity for one appliance profile.
///
/// A session is passed explicitly into client and orchestrator calls instead
/// of living in ambient application state, so sessions for different profiles
/// can coexist without cross-contamination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Profile name; also the appliance host the profile was created for.
    pub profile: String,
    /// API token obtained from the keygen exchange.
    pub token: String,
    /// Numeric profile identifier assigned by the registry.
    pub id: u64,
}

impl Session {
    pub fn new(profile: impl Into<String>, token: impl Into<String>, id: u64) -> Self {
        Self {
            profile: profile.into(),
            token: token.into(),
            id,
        }
    }
}
