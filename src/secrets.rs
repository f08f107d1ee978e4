//! API key lookup.
//!
//! Keys are resolved once at startup by `(service, account)` and handed to the
//! provider clients explicitly. The OS credential store is consulted first,
//! then the environment.

use crate::config::SecretSettings;
use crate::error::{GitRagError, Result};
use tracing::debug;

/// Fallback environment variable checked after the account-specific one.
pub const FALLBACK_ENV_VAR: &str = "OPENAI_API_KEY";

/// A source of provider secrets.
pub trait SecretSource {
    /// Look up a secret. `Ok(None)` means the source has no entry.
    fn get(&self, service: &str, account: &str) -> Result<Option<String>>;
}

/// Reads secrets from environment variables.
///
/// The account maps to `GITRAG_<ACCOUNT>` (uppercased, non-alphanumerics
/// replaced by `_`); `OPENAI_API_KEY` is used when that is unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretSource;

impl EnvSecretSource {
    /// Environment variable name for an account.
    pub fn var_name(account: &str) -> String {
        let normalized: String = account
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("GITRAG_{}", normalized)
    }

    fn read(name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl SecretSource for EnvSecretSource {
    fn get(&self, _service: &str, account: &str) -> Result<Option<String>> {
        Ok(Self::read(&Self::var_name(account)).or_else(|| Self::read(FALLBACK_ENV_VAR)))
    }
}

/// Reads secrets from the OS credential store (Keychain, Credential
/// Manager, kernel keyutils), keyed on both service and account.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringSecretSource;

impl SecretSource for KeyringSecretSource {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        let lookup = keyring::Entry::new(service, account).and_then(|entry| entry.get_password());
        match lookup {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                // No usable store (headless session, locked keychain): let the next source answer.
                debug!("Credential store lookup for {}/{} failed: {}", service, account, e);
                Ok(None)
            }
        }
    }
}

/// Asks each source in turn and returns the first secret found.
pub struct ChainedSecretSource {
    sources: Vec<Box<dyn SecretSource>>,
}

impl ChainedSecretSource {
    pub fn new(sources: Vec<Box<dyn SecretSource>>) -> Self {
        Self { sources }
    }
}

impl SecretSource for ChainedSecretSource {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
        for source in &self.sources {
            if let Some(secret) = source.get(service, account)? {
                return Ok(Some(secret));
            }
        }
        Ok(None)
    }
}

/// The credential store, falling back to environment variables.
pub fn default_secret_source() -> ChainedSecretSource {
    ChainedSecretSource::new(vec![
        Box::new(KeyringSecretSource),
        Box::new(EnvSecretSource),
    ])
}

/// Resolve the provider API key, failing fast when it is absent.
pub fn resolve_api_key(source: &dyn SecretSource, settings: &SecretSettings) -> Result<String> {
    match source.get(&settings.service, &settings.account)? {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(GitRagError::MissingSecret {
            service: settings.service.clone(),
            account: settings.account.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<(String, String), String>);

    impl SecretSource for MapSource {
        fn get(&self, service: &str, account: &str) -> Result<Option<String>> {
            Ok(self
                .0
                .get(&(service.to_string(), account.to_string()))
                .cloned())
        }
    }

    fn map(entries: &[(&str, &str, &str)]) -> MapSource {
        MapSource(
            entries
                .iter()
                .map(|(service, account, secret)| {
                    ((service.to_string(), account.to_string()), secret.to_string())
                })
                .collect(),
        )
    }

    #[test]
    fn test_chain_prefers_first_source() {
        let chain = ChainedSecretSource::new(vec![
            Box::new(map(&[("openai", "api_token", "sk-keyring")])),
            Box::new(map(&[("openai", "api_token", "sk-env")])),
        ]);
        let key = resolve_api_key(&chain, &SecretSettings::default()).unwrap();
        assert_eq!(key, "sk-keyring");
    }

    #[test]
    fn test_chain_falls_back_when_first_is_empty() {
        let chain = ChainedSecretSource::new(vec![
            Box::new(map(&[])),
            Box::new(map(&[("openai", "api_token", "sk-env")])),
        ]);
        let key = resolve_api_key(&chain, &SecretSettings::default()).unwrap();
        assert_eq!(key, "sk-env");
    }

    #[test]
    fn test_chain_is_keyed_on_service() {
        let chain = ChainedSecretSource::new(vec![Box::new(map(&[(
            "anthropic",
            "api_token",
            "sk-other",
        )]))]);
        let err = resolve_api_key(&chain, &SecretSettings::default()).unwrap_err();
        assert!(matches!(err, GitRagError::MissingSecret { .. }));
    }

    #[test]
    fn test_keyring_missing_entry_is_none() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let secret = KeyringSecretSource.get("gitrag-test", "api_token").unwrap();
        assert_eq!(secret, None);
    }

    #[test]
    fn test_var_name() {
        assert_eq!(EnvSecretSource::var_name("api_token"), "GITRAG_API_TOKEN");
        assert_eq!(EnvSecretSource::var_name("ci-bot.key"), "GITRAG_CI_BOT_KEY");
    }

    #[test]
    fn test_resolve_present_key() {
        let mut map = HashMap::new();
        map.insert(
            ("openai".to_string(), "api_token".to_string()),
            "sk-test".to_string(),
        );
        let key = resolve_api_key(&MapSource(map), &SecretSettings::default()).unwrap();
        assert_eq!(key, "sk-test");
    }

    #[test]
    fn test_missing_key_fails_fast() {
        let err = resolve_api_key(&MapSource(HashMap::new()), &SecretSettings::default())
            .unwrap_err();
        assert!(matches!(err, GitRagError::MissingSecret { .. }));
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn test_blank_key_is_missing() {
        let mut map = HashMap::new();
        map.insert(
            ("openai".to_string(), "api_token".to_string()),
            "   ".to_string(),
        );
        assert!(resolve_api_key(&MapSource(map), &SecretSettings::default()).is_err());
    }
}
