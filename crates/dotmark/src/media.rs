use linked_hash_map::LinkedHashMap;
use std::path::Path;

/// Which kinds of media references get stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaStorageOptions {
    pub local: bool,
    pub remote: bool,
}

/// Maps media references found in a document to the locations they're exported to.
pub trait MediaStorage {
    /// Stores `reference` if its kind is enabled, returning its location. Disabled or
    /// unsupported references return `None` and pass through unchanged.
    fn register(&mut self, reference: &str, options: MediaStorageOptions) -> Option<String>;

    fn resolve(&self, reference: &str) -> Option<String>;

    /// Every stored reference with its location, in registration order.
    fn all(&self) -> Vec<(String, String)>;
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Keeps locations in memory. A location is `media/<name>@<hash>.<extension>`, the hash
/// keeping references with equal file names apart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMediaStorage {
    entries: LinkedHashMap<String, String>,
}

impl InMemoryMediaStorage {
    fn location(reference: &str) -> String {
        let path = reference.split(['?', '#']).next().unwrap_or(reference);
        let path = Path::new(path);
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("media");
        let hash = blake3::hash(reference.as_bytes()).to_hex();
        match path.extension().and_then(|e| e.to_str()) {
            Some(extension) => format!("media/{}@{}.{}", name, &hash.as_str()[..8], extension),
            None => format!("media/{}@{}", name, &hash.as_str()[..8]),
        }
    }
}

impl MediaStorage for InMemoryMediaStorage {
    fn register(&mut self, reference: &str, options: MediaStorageOptions) -> Option<String> {
        if reference.is_empty() || reference.starts_with('#') || reference.starts_with("data:") {
            return None;
        }
        let enabled = if is_remote(reference) {
            options.remote
        } else if reference.contains("://") {
            false
        } else {
            options.local
        };
        if !enabled {
            return None;
        }

        let location = self
            .entries
            .entry(reference.to_string())
            .or_insert_with(|| Self::location(reference));
        Some(location.clone())
    }

    fn resolve(&self, reference: &str) -> Option<String> {
        self.entries.get(reference).cloned()
    }

    fn all(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
