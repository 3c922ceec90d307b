use crate::host::TargetElement;

/// Data attribute consulted when no token was injected at build time.
pub const TOKEN_ATTRIBUTE: &str = "mapbox-token";

/// Credential required by the map rendering backend.
#[derive(Clone, PartialEq, Eq)]
pub struct CapabilityToken(String);

impl CapabilityToken {
    /// Blank strings are treated as "no token".
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CapabilityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CapabilityToken(***)")
    }
}

/// Resolves the token: injected value first, then the target's
/// `data-mapbox-token` attribute.
#[derive(Debug, Clone, Default)]
pub struct TokenResolver {
    injected: Option<CapabilityToken>,
}

impl TokenResolver {
    pub fn new(injected: Option<&str>) -> Self {
        Self {
            injected: injected.and_then(CapabilityToken::new),
        }
    }

    pub fn resolve(&self, target: &dyn TargetElement) -> Option<CapabilityToken> {
        if let Some(token) = &self.injected {
            return Some(token.clone());
        }
        target
            .data_attribute(TOKEN_ATTRIBUTE)
            .and_then(CapabilityToken::new)
    }
}

#[cfg(test)]
mod tests {
    use super::{CapabilityToken, TOKEN_ATTRIBUTE, TokenResolver};
    use crate::host::TargetElement;
    use crate::testing::FakeElement;

    #[test]
    fn injected_token_wins_over_attribute() {
        let el = FakeElement::new("#map");
        el.set_data_attribute(TOKEN_ATTRIBUTE, "from-attr");
        let token = TokenResolver::new(Some("injected")).resolve(&*el);
        assert_eq!(token.as_ref().map(CapabilityToken::expose), Some("injected"));
    }

    #[test]
    fn falls_back_to_data_attribute() {
        let el = FakeElement::new("#map");
        el.set_data_attribute(TOKEN_ATTRIBUTE, "pk.abc");
        let token = TokenResolver::new(None).resolve(&*el);
        assert_eq!(token.as_ref().map(CapabilityToken::expose), Some("pk.abc"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let el = FakeElement::new("#map");
        el.set_data_attribute(TOKEN_ATTRIBUTE, "   ");
        assert!(TokenResolver::new(Some("")).resolve(&*el).is_none());
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let token = CapabilityToken::new("pk.secret").expect("token");
        assert_eq!(format!("{token:?}"), "CapabilityToken(***)");
    }
}
