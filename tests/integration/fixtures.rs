//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - An in-memory image server speaking the `/api/get` + `/api/post` protocol
//! - Scripted replies and per-request latency
//! - Small image files on disk

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use tempfile::TempDir;

use imagetext::sync::{PostField, RequestGateway, SyncClient, Transport};

/// 1x1 transparent PNG.
pub const TINY_PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub fn tiny_png_bytes() -> Vec<u8> {
    STANDARD.decode(TINY_PNG_B64).unwrap()
}

#[derive(Debug, Default)]
struct ServerState {
    image: Option<String>,
    commands: Vec<String>,
}

/// An image server that keeps its state in memory.
///
/// The "image" is a base64 tag derived from the uploaded bytes and the
/// command history, so every distinct state has a distinct image.
#[derive(Debug, Default)]
pub struct FakeServer {
    state: Mutex<ServerState>,
    /// Raw bodies returned instead of the computed reply, oldest first.
    scripted: Mutex<VecDeque<String>>,
    /// Latency applied to upcoming requests, oldest first.
    delays: Mutex<VecDeque<Duration>>,
    /// Every field posted, in arrival order.
    posted: Mutex<Vec<PostField>>,
    gets: Mutex<usize>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server that already holds an image and `commands`.
    pub fn with_history(commands: &[&str]) -> Self {
        let server = Self::new();
        {
            let mut state = server.state.lock().unwrap();
            state.image = Some(TINY_PNG_B64.to_string());
            state.commands = commands.iter().map(|c| c.to_string()).collect();
        }
        server
    }

    /// Reply with `body` to the next request, without touching server state.
    pub fn script(&self, body: Value) {
        self.scripted.lock().unwrap().push_back(body.to_string());
    }

    pub fn script_raw(&self, body: &str) {
        self.scripted.lock().unwrap().push_back(body.to_string());
    }

    /// Delay the next request by `delay`.
    pub fn delay_next(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    pub fn posted(&self) -> Vec<PostField> {
        self.posted.lock().unwrap().clone()
    }

    pub fn gets(&self) -> usize {
        *self.gets.lock().unwrap()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    async fn wait(&self) {
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn scripted_reply(&self) -> Option<String> {
        self.scripted.lock().unwrap().pop_front()
    }

    fn reply(state: &ServerState, errors: &[&str]) -> String {
        let image = state.image.as_ref().map(|base| {
            if state.commands.is_empty() {
                base.clone()
            } else {
                let tag = format!("{}|{}", base, state.commands.join("|"));
                STANDARD.encode(tag)
            }
        });
        let mut body = json!({
            "image": image,
            "commands": state.commands,
        });
        if !errors.is_empty() {
            body["errors"] = json!(errors);
        }
        body.to_string()
    }

    fn apply(&self, field: &PostField) -> String {
        let mut state = self.state.lock().unwrap();
        match field {
            PostField::File { bytes, .. } => {
                state.image = Some(STANDARD.encode(bytes));
                state.commands.clear();
                Self::reply(&state, &[])
            }
            PostField::Cmd(text) => {
                if state.image.is_none() {
                    return Self::reply(&state, &["upload an image first"]);
                }
                state.commands.push(text.clone());
                Self::reply(&state, &[])
            }
            PostField::Undo => {
                if state.commands.pop().is_none() {
                    return Self::reply(&state, &["nothing to undo"]);
                }
                Self::reply(&state, &[])
            }
            PostField::Revert(raw) => match raw.parse::<usize>() {
                Ok(index) if index <= state.commands.len() => {
                    state.commands.truncate(index);
                    Self::reply(&state, &[])
                }
                _ => Self::reply(&state, &["bad index"]),
            },
        }
    }
}

impl Transport for FakeServer {
    async fn get(&self) -> imagetext::Result<String> {
        self.wait().await;
        *self.gets.lock().unwrap() += 1;
        if let Some(body) = self.scripted_reply() {
            return Ok(body);
        }
        let state = self.state.lock().unwrap();
        Ok(Self::reply(&state, &[]))
    }

    async fn post(&self, field: PostField) -> imagetext::Result<String> {
        self.wait().await;
        self.posted.lock().unwrap().push(field.clone());
        if let Some(body) = self.scripted_reply() {
            return Ok(body);
        }
        Ok(self.apply(&field))
    }
}

/// Transport whose every request fails like a refused connection.
pub struct DownServer;

impl Transport for DownServer {
    async fn get(&self) -> imagetext::Result<String> {
        Err(refused())
    }

    async fn post(&self, _field: PostField) -> imagetext::Result<String> {
        Err(refused())
    }
}

fn refused() -> imagetext::Error {
    imagetext::Error::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

pub fn client(server: FakeServer) -> SyncClient<FakeServer> {
    SyncClient::new(RequestGateway::new(server))
}

/// Client already loaded from a server holding `commands`.
pub async fn loaded_client(commands: &[&str]) -> SyncClient<FakeServer> {
    let mut client = client(FakeServer::with_history(commands));
    client.load().await.unwrap();
    client
}

/// A directory holding a small PNG and a GIF header.
pub struct ImageFiles {
    pub dir: TempDir,
    pub png: PathBuf,
    pub gif: PathBuf,
}

impl ImageFiles {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let png = dir.path().join("tiny.png");
        let gif = dir.path().join("anim.gif");
        std::fs::write(&png, tiny_png_bytes()).expect("Failed to write png");
        std::fs::write(&gif, b"GIF89a").expect("Failed to write gif");
        Self { dir, png, gif }
    }

    pub fn path_str(path: &std::path::Path) -> String {
        path.to_string_lossy().into_owned()
    }
}
