//! The only path to the backend.
//!
//! `RequestGateway` turns operations into one HTTP call each and shapes the
//! reply into a [`Snapshot`]. The wire itself sits behind [`Transport`] so the
//! protocol can be exercised against an in-memory server.

use std::future::Future;

use reqwest::multipart::{Form, Part};

use super::preview::PendingFile;
use super::snapshot::Snapshot;
use crate::config::Config;
use crate::util::clip;
use crate::{ilog_debug, ilog_trace, Result};

const GET_PATH: &str = "/api/get";
const POST_PATH: &str = "/api/post";
const UNDO_MARKER: &str = "undo";

/// The four state-changing requests the backend understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    UploadImage(PendingFile),
    AppendCommand(String),
    Undo,
    RevertTo(usize),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::UploadImage(_) => "upload",
            Operation::AppendCommand(_) => "command",
            Operation::Undo => "undo",
            Operation::RevertTo(_) => "revert",
        }
    }
}

/// Anything the client asks the backend for, including the initial load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Load,
    Mutate(Operation),
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Load => "load",
            Request::Mutate(op) => op.name(),
        }
    }
}

/// The single multipart field carried by a `POST /api/post`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostField {
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
    Cmd(String),
    Undo,
    Revert(String),
}

impl PostField {
    pub fn key(&self) -> &'static str {
        match self {
            PostField::File { .. } => "file",
            PostField::Cmd(_) => "cmd",
            PostField::Undo => "undo",
            PostField::Revert(_) => "revert",
        }
    }

    /// Text value for the non-file fields.
    pub fn text(&self) -> Option<&str> {
        match self {
            PostField::File { .. } => None,
            PostField::Cmd(text) | PostField::Revert(text) => Some(text),
            PostField::Undo => Some(UNDO_MARKER),
        }
    }

    fn into_form(self) -> Result<Form> {
        let key = self.key();
        let form = match self {
            PostField::File {
                file_name,
                mime,
                bytes,
            } => {
                let part = Part::bytes(bytes).file_name(file_name).mime_str(&mime)?;
                Form::new().part(key, part)
            }
            PostField::Cmd(text) | PostField::Revert(text) => Form::new().text(key, text),
            PostField::Undo => Form::new().text(key, UNDO_MARKER),
        };
        Ok(form)
    }
}

/// Raw exchange with the backend: returns response bodies.
pub trait Transport: Send + Sync {
    fn get(&self) -> impl Future<Output = Result<String>> + Send;
    fn post(&self, field: PostField) -> impl Future<Output = Result<String>> + Send;
}

/// reqwest-backed transport against `{server}/api/*`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.effective_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.effective_server_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    async fn get(&self) -> Result<String> {
        let response = self.client.get(self.url(GET_PATH)).send().await?;
        Ok(response.error_for_status()?.text().await?)
    }

    async fn post(&self, field: PostField) -> Result<String> {
        let form = field.into_form()?;
        let response = self
            .client
            .post(self.url(POST_PATH))
            .multipart(form)
            .send()
            .await?;
        Ok(response.error_for_status()?.text().await?)
    }
}

/// Stateless request/response shaping over a transport.
#[derive(Debug, Clone)]
pub struct RequestGateway<T> {
    transport: T,
}

impl<T: Transport> RequestGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET /api/get`, used once to seed state.
    pub async fn fetch(&self) -> Result<Snapshot> {
        ilog_debug!("RequestGateway::fetch");
        let body = self.transport.get().await?;
        parse_body(&body)
    }

    /// One `POST /api/post` for `op`. No retries.
    pub async fn send(&self, op: &Operation) -> Result<Snapshot> {
        let field = post_field(op).await?;
        ilog_debug!("RequestGateway::send op={} field={}", op.name(), field.key());
        let body = self.transport.post(field).await?;
        parse_body(&body)
    }

    pub async fn execute(&self, request: &Request) -> Result<Snapshot> {
        match request {
            Request::Load => self.fetch().await,
            Request::Mutate(op) => self.send(op).await,
        }
    }
}

fn parse_body(body: &str) -> Result<Snapshot> {
    ilog_trace!("RequestGateway: response body {}", clip(body, 120));
    Snapshot::from_body(body)
}

async fn post_field(op: &Operation) -> Result<PostField> {
    let field = match op {
        Operation::UploadImage(file) => PostField::File {
            file_name: file.name.clone(),
            mime: file.mime().to_string(),
            bytes: tokio::fs::read(&file.path).await?,
        },
        Operation::AppendCommand(text) => PostField::Cmd(text.clone()),
        Operation::Undo => PostField::Undo,
        Operation::RevertTo(index) => PostField::Revert(index.to_string()),
    };
    Ok(field)
}
