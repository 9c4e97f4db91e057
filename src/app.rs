use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{self, Event};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::render::RenderState;
use crate::sync::{Dispatch, HttpTransport, LocalPreviewEncoder, PreviewTicket, RequestGateway};
use crate::tea::{update, Command, Message, Model};
use crate::{ilog_debug, ilog_error, Result};

const MAX_BG_MESSAGES: usize = 50;

type Gateway = Arc<RequestGateway<HttpTransport>>;

pub struct LogicThread;

impl LogicThread {
    pub fn run(config: Config, state_tx: Sender<RenderState>, shutdown: Arc<AtomicBool>) -> Result<()> {
        Runtime::new()?.block_on(Self::run_async(config, state_tx, shutdown))
    }

    async fn run_async(
        config: Config,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        ilog_debug!(
            "LogicThread::run_async server={} timeout={:?}",
            config.effective_server_url(),
            config.effective_timeout()
        );
        let gateway: Gateway = Arc::new(RequestGateway::new(HttpTransport::new(&config)?));
        let mut model = Model::new(config);
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Message>();

        for cmd in update(&mut model, Message::Mounted) {
            execute_command(cmd, &msg_tx, &gateway);
        }
        send_state(&state_tx, &model);

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Keyboard input (priority)
            while event::poll(Duration::ZERO)? {
                let msg = match event::read()? {
                    Event::Key(key) => Message::Key(key),
                    Event::Resize(w, h) => Message::Resize(w, h),
                    _ => continue,
                };

                for cmd in update(&mut model, msg) {
                    if execute_command(cmd, &msg_tx, &gateway) {
                        shutdown.store(true, Ordering::Relaxed);
                        return Ok(());
                    }
                }

                if model.dirty {
                    send_state(&state_tx, &model);
                    model.dirty = false;
                }
            }

            // Request and preview completions (bounded)
            for _ in 0..MAX_BG_MESSAGES {
                let Ok(msg) = msg_rx.try_recv() else { break };
                for cmd in update(&mut model, msg) {
                    if execute_command(cmd, &msg_tx, &gateway) {
                        shutdown.store(true, Ordering::Relaxed);
                        return Ok(());
                    }
                }
            }

            if model.dirty {
                send_state(&state_tx, &model);
                model.dirty = false;
            }

            tokio::time::sleep(Duration::from_micros(500)).await;
        }

        Ok(())
    }
}

/// Run a command's side effect. Returns true when the app should quit.
fn execute_command(cmd: Command, msg_tx: &mpsc::UnboundedSender<Message>, gateway: &Gateway) -> bool {
    match cmd {
        Command::Dispatch(dispatch) => {
            ilog_debug!(
                "Command::Dispatch seq={} request={}",
                dispatch.seq,
                dispatch.request.name()
            );
            spawn_dispatch(dispatch, msg_tx.clone(), gateway.clone());
        }

        Command::EncodePreview(ticket) => {
            ilog_debug!("Command::EncodePreview generation={}", ticket.generation);
            spawn_preview(ticket, msg_tx.clone());
        }

        Command::Quit => {
            ilog_debug!("Command::Quit");
            return true;
        }
    }

    false
}

fn spawn_dispatch(dispatch: Dispatch, tx: mpsc::UnboundedSender<Message>, gateway: Gateway) {
    tokio::spawn(async move {
        let Dispatch { seq, request } = dispatch;
        let msg = match gateway.execute(&request).await {
            Ok(snapshot) => Message::SnapshotReceived { seq, snapshot },
            Err(e) => {
                ilog_error!("Request {} failed: seq={} - {}", request.name(), seq, e);
                Message::RequestFailed {
                    seq,
                    error: e.to_string(),
                }
            }
        };
        let _ = tx.send(msg);
    });
}

fn spawn_preview(ticket: PreviewTicket, tx: mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        let generation = ticket.generation;
        let msg = match LocalPreviewEncoder::encode(&ticket.path).await {
            Ok(data_uri) => Message::PreviewReady {
                generation,
                data_uri,
            },
            Err(e) => Message::PreviewFailed {
                generation,
                error: e.to_string(),
            },
        };
        let _ = tx.send(msg);
    });
}

fn send_state(state_tx: &Sender<RenderState>, model: &Model) {
    let _ = state_tx.try_send(model.snapshot());
}
