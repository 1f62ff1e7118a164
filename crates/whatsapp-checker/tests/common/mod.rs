//! Common test utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use whatsapp_checker::{
    api::{create_router, AppState},
    session::{ConnectionManager, PairingDisplay},
    AssetBundle,
};
use whatsapp_client::{ClientError, MessagingNetwork, NumberResult, PairingEvents};

/// A paired network whose lookup answers are set by the test.
pub struct FakeNetwork {
    connected: AtomicBool,
    answer: Mutex<Result<Vec<NumberResult>, String>>,
    queries: AtomicUsize,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(false),
            answer: Mutex::new(Ok(Vec::new())),
            queries: AtomicUsize::new(0),
        })
    }

    pub fn answer_with(&self, results: Vec<NumberResult>) {
        *self.answer.lock().unwrap() = Ok(results);
    }

    pub fn fail_with(&self, message: &str) {
        *self.answer.lock().unwrap() = Err(message.to_string());
    }

    /// Simulate the live session dropping.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingNetwork for FakeNetwork {
    async fn restore_identity(&self) -> Result<bool, ClientError> {
        Ok(true)
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    async fn pairing_events(&self) -> Result<PairingEvents, ClientError> {
        Err(ClientError::Api("already paired".into()))
    }

    async fn connect(&self) -> Result<(), ClientError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn query_numbers(&self, _numbers: &[String]) -> Result<Vec<NumberResult>, ClientError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.answer.lock().unwrap().clone().map_err(ClientError::Api)
    }
}

struct NoDisplay;

impl PairingDisplay for NoDisplay {
    fn show_code(&self, _code: &str) {}
}

pub fn registered(query: &str) -> NumberResult {
    NumberResult {
        query: query.to_string(),
        jid: Some(format!("{}@s.whatsapp.net", query.trim_start_matches('+'))),
        is_in: true,
    }
}

pub fn unregistered(query: &str) -> NumberResult {
    NumberResult {
        query: query.to_string(),
        jid: None,
        is_in: false,
    }
}

/// A small frontend bundle.
pub fn test_assets() -> AssetBundle {
    AssetBundle::from_files([
        ("index.html", "<!doctype html><div id=\"root\"></div>"),
        ("static/js/main.js", "console.log('app')"),
        ("favicon.ico", "\0\0\x01\0"),
    ])
}

/// A session over `network` that has not been started.
pub fn session(network: Arc<FakeNetwork>) -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::new(network, Arc::new(NoDisplay)))
}

/// The full router over an established session.
pub async fn connected_app(network: Arc<FakeNetwork>) -> Router {
    let session = session(network);
    session.establish().await.unwrap();
    create_router(AppState::new(session, test_assets()))
}
