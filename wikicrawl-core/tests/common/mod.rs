// Scripted link table standing in for the live site

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use wikicrawl_core::checkpoint::{self, CheckpointError, CheckpointStore};
use wikicrawl_core::MemoryStore;
use wikicrawl_scanner::error::Result;
use wikicrawl_scanner::{FetchError, LinkFetcher};

pub struct ScriptedFetcher {
    links: HashMap<String, Vec<String>>,
    failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
    random: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            random: Mutex::new(Vec::new()),
        }
    }

    /// Script the outbound links of `page`.
    pub fn page(mut self, page: &str, targets: &[&str]) -> Self {
        self.links.insert(
            page.to_string(),
            targets.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    /// Make the next `times` fetches of `page` fail.
    pub fn failing(self, page: &str, times: usize) -> Self {
        self.failures.lock().unwrap().insert(page.to_string(), times);
        self
    }

    /// Pages handed out by `resolve_random`, in order.
    pub fn with_random(self, pages: &[&str]) -> Self {
        *self.random.lock().unwrap() = pages.iter().rev().map(|p| p.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, page: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == page).count()
    }
}

impl LinkFetcher for ScriptedFetcher {
    async fn fetch_links(&self, url: &str) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(url.to_string());

        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(url)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(FetchError::Other(format!("scripted failure for {}", url)));
        }
        drop(failures);

        Ok(self.links.get(url).cloned().unwrap_or_default())
    }

    async fn resolve_random(&self) -> Result<String> {
        self.random
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| FetchError::Other("no random pages scripted".to_string()))
    }

    async fn fetch_title(&self, url: &str) -> Result<String> {
        Ok(format!("Page {}", url))
    }

    fn is_valid(&self, url: &str) -> bool {
        !url.is_empty() && !url.starts_with("bad:")
    }
}

/// A store whose first `failures` saves error out. Loads and later saves go to
/// an inner `MemoryStore`.
pub struct FailingStore {
    inner: MemoryStore,
    failures: Mutex<usize>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl FailingStore {
    pub fn always() -> Self {
        Self::first(usize::MAX)
    }

    pub fn first(failures: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: Mutex::new(failures),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Saves tried at `key`, failed or not.
    pub fn attempts(&self, key: &str) -> usize {
        self.attempts.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl CheckpointStore for FailingStore {
    fn save(&self, key: &str, blob: &[u8]) -> checkpoint::Result<()> {
        *self.attempts.lock().unwrap().entry(key.to_string()).or_default() += 1;

        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(CheckpointError::Io {
                key: key.to_string(),
                source: io::Error::other("disk full"),
            });
        }
        drop(failures);

        self.inner.save(key, blob)
    }

    fn load(&self, key: &str) -> checkpoint::Result<Vec<u8>> {
        self.inner.load(key)
    }

    fn exists(&self, key: &str) -> bool {
        self.inner.exists(key)
    }
}
