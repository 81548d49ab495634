//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fetch::{FetchError, PageFetcher};

/// Serves fixed bodies by request path and remembers what was asked for.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, Result<String, u16>>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, path: &str, body: &str) -> Self {
        self.pages.insert(path.to_string(), Ok(body.to_string()));
        self
    }

    pub fn failing(mut self, path: &str, status: u16) -> Self {
        self.pages.insert(path.to_string(), Err(status));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, request_path: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(request_path.to_string());

        match self.pages.get(request_path) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: request_path.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: request_path.to_string(),
                status: 404,
            }),
        }
    }
}

pub fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
