//! Domain verification via DNS TXT lookup.
//!
//! Ownership of a domain is proven by publishing the workspace's
//! verification token in a TXT record at `_skyvidya-verification.<domain>`.

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use rand::RngExt;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// DNS label prefix the TXT record must live under.
const VERIFICATION_PREFIX: &str = "_skyvidya-verification";

/// Length of generated verification tokens.
const TOKEN_LENGTH: usize = 32;

/// Generate a fresh verification token for a newly registered domain.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// The DNS name whose TXT records are checked for `domain`.
pub fn record_name(domain: &str) -> String {
    format!("{}.{}", VERIFICATION_PREFIX, domain.trim_end_matches('.'))
}

/// True when any TXT string equals the token (surrounding whitespace ignored).
pub fn token_in_records<I>(records: I, token: &str) -> bool
where
    I: IntoIterator<Item = String>,
{
    records.into_iter().any(|txt| txt.trim() == token)
}

/// DNS-backed domain verifier.
#[derive(Clone)]
pub struct DomainVerifier {
    resolver: TokioAsyncResolver,
}

impl DomainVerifier {
    /// Build a verifier using the system's resolver configuration defaults.
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }

    /// Look up the verification TXT record and check for the token.
    ///
    /// Returns Ok(false) when the record is absent or the token does not
    /// match; network-level resolution failures surface as upstream errors.
    pub async fn verify(&self, domain: &str, token: &str) -> AppResult<bool> {
        let name = record_name(domain);
        debug!(name = %name, "Looking up verification TXT record");

        let lookup = match self.resolver.txt_lookup(name.clone()).await {
            Ok(lookup) => lookup,
            Err(e) => {
                if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                    return Ok(false);
                }
                return Err(AppError::Upstream(format!(
                    "DNS lookup for {} failed: {}",
                    name, e
                )));
            }
        };

        let records = lookup.iter().map(|txt| {
            txt.iter()
                .map(|data| String::from_utf8_lossy(data).into_owned())
                .collect::<Vec<_>>()
                .join("")
        });

        let matched = token_in_records(records, token);
        if matched {
            info!(domain = %domain, "Domain verification token matched");
        }
        Ok(matched)
    }
}

impl Default for DomainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_name() {
        assert_eq!(
            record_name("example.com"),
            "_skyvidya-verification.example.com"
        );
        // Trailing dot is normalized away
        assert_eq!(
            record_name("example.com."),
            "_skyvidya-verification.example.com"
        );
    }

    #[test]
    fn test_token_match() {
        let token = "abc123";
        assert!(token_in_records(vec!["abc123".to_string()], token));
        assert!(token_in_records(vec!["  abc123 ".to_string()], token));
        assert!(!token_in_records(vec!["other".to_string()], token));
        assert!(!token_in_records(Vec::<String>::new(), token));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        // Two tokens should essentially never collide
        assert_ne!(generate_token(), generate_token());
    }
}
