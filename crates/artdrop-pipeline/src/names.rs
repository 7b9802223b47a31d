//! Random character names with a local fallback.
//!
//! The name service is a nicety, not a dependency: when it is down or
//! answers nonsense, names come from a built-in rotation instead. The
//! rotation hands out each name once, then starts numbering ("Aoi 2",
//! "Hikari 2", ...) so a long offline session still gets distinct names.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use artdrop_core::remote::NameSource;

/// Built-in rotation used when the name service is unavailable.
pub const FALLBACK_NAMES: [&str; 16] = [
    "Aoi", "Hikari", "Rin", "Yuki", "Sakura", "Akane", "Mio", "Tsubasa", "Haruka", "Kaede",
    "Sora", "Nagisa", "Rei", "Kanna", "Chihiro", "Mirai",
];

pub struct NameGenerator {
    source: Arc<dyn NameSource>,
    cursor: AtomicUsize,
}

impl NameGenerator {
    pub fn new(source: Arc<dyn NameSource>) -> Self {
        Self {
            source,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Fetch a name from the service, falling back locally on any failure.
    pub async fn next(&self) -> String {
        match self.source.random_name().await {
            Ok(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    tracing::debug!("Name service returned an empty name; using fallback");
                    self.fallback()
                } else {
                    trimmed.to_string()
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "Name service unavailable; using fallback");
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> String {
        let n = self.cursor.fetch_add(1, Ordering::Relaxed);
        let name = FALLBACK_NAMES[n % FALLBACK_NAMES.len()];
        let round = n / FALLBACK_NAMES.len();
        if round == 0 {
            name.to_string()
        } else {
            format!("{} {}", name, round + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use artdrop_core::TransportError;

    use super::*;

    struct ScriptedNames {
        responses: Mutex<Vec<Result<String, TransportError>>>,
    }

    impl ScriptedNames {
        fn always_err() -> Self {
            Self {
                responses: Mutex::new(Vec::new()),
            }
        }

        fn with(responses: Vec<Result<String, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl NameSource for ScriptedNames {
        async fn random_name(&self) -> Result<String, TransportError> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(TransportError::Connect("down".to_string())))
        }
    }

    #[tokio::test]
    async fn test_service_name_passes_through_trimmed() {
        let generator = NameGenerator::new(Arc::new(ScriptedNames::with(vec![Ok(
            "  Shiragiku  ".to_string(),
        )])));
        assert_eq!(generator.next().await, "Shiragiku");
    }

    #[tokio::test]
    async fn test_empty_service_name_falls_back() {
        let generator =
            NameGenerator::new(Arc::new(ScriptedNames::with(vec![Ok("   ".to_string())])));
        assert_eq!(generator.next().await, FALLBACK_NAMES[0]);
    }

    #[tokio::test]
    async fn test_fallback_rotation_is_distinct_then_numbered() {
        let generator = NameGenerator::new(Arc::new(ScriptedNames::always_err()));

        let mut seen = Vec::new();
        for _ in 0..FALLBACK_NAMES.len() {
            seen.push(generator.next().await);
        }
        let expected: Vec<String> = FALLBACK_NAMES.iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);

        // Second pass around the rotation gets a numeric suffix.
        assert_eq!(generator.next().await, "Aoi 2");
        assert_eq!(generator.next().await, "Hikari 2");
    }
}
