use std::io::{self, stdout, Stdout};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};

use imagetext::app::LogicThread;
use imagetext::config::Config;
use imagetext::render::{ImageView, RenderState};
use imagetext::sync::{
    DataUri, DocumentState, HttpTransport, RequestGateway, Resolution, SyncClient,
};
use imagetext::{ilog, ui, Error, Result};

const FRAME_DURATION: Duration = Duration::from_micros(16_666); // 60fps

/// imagetext - edit an image by talking to an image-transformation server
#[derive(Parser, Debug)]
#[command(name = "imagetext")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    IMAGETEXT_DEBUG=1     Enable debug logging (alternative to --debug)"
)]
pub struct Cli {
    /// Server base URL (overrides the config file)
    #[arg(short = 's', long)]
    pub server: Option<String>,

    /// Enable debug logging (writes to ~/.imagetext/imagetext.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Print the resulting document as JSON (headless commands only)
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the current history and alerts
    Show {
        /// Also write the current image to this file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Upload an image, starting a new history
    Upload {
        /// Image file to upload
        file: PathBuf,
    },

    /// Append a command to the history
    Apply {
        /// The command text, e.g. `rotate 90`
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// Remove the most recent command
    Undo,

    /// Keep only the first INDEX commands
    Revert {
        /// Number of commands to keep
        index: String,
    },

    /// Print or update the saved configuration
    Config {
        /// Save a new server URL
        #[arg(long)]
        server: Option<String>,

        /// Save a new request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    imagetext::log::init(cli.debug);

    let config = Config::load_with_server(cli.server.clone())?;

    match cli.command {
        Some(Command::Config { server, timeout }) => {
            return run_config(server, timeout);
        }
        Some(cmd) => {
            return run_headless(cmd, config, cli.json);
        }
        None => {
            // No subcommand: launch TUI
        }
    }

    ilog!("imagetext starting: server={}", config.effective_server_url());

    let shutdown = Arc::new(AtomicBool::new(false));
    let (state_tx, state_rx) = crossbeam_channel::bounded::<RenderState>(1);

    let shutdown_clone = shutdown.clone();
    let logic_handle = thread::spawn(move || LogicThread::run(config, state_tx, shutdown_clone));

    let mut terminal = setup_terminal()?;
    let result = render_loop(&mut terminal, state_rx, &shutdown);

    shutdown.store(true, Ordering::SeqCst);
    let logic_result = logic_handle.join();
    restore_terminal(&mut terminal)?;
    result?;
    match logic_result {
        Ok(r) => r,
        Err(_) => Err(Error::TaskJoin("logic thread panicked".to_string())),
    }
}

/// Run one operation without the TUI: seed state, apply, print.
fn run_headless(cmd: Command, config: Config, json: bool) -> Result<()> {
    ilog!("Headless command: {:?}", cmd);
    // Reject a malformed index before anything touches the network
    let revert_index = match &cmd {
        Command::Revert { index } => Some(parse_revert_index(index)?),
        _ => None,
    };
    let rt = tokio::runtime::Runtime::new()?;

    let client = rt.block_on(async {
        let mut client = SyncClient::new(RequestGateway::new(HttpTransport::new(&config)?));
        client.load().await?;
        let resolution = match &cmd {
            Command::Upload { file } => client.upload(&file.to_string_lossy()).await?,
            Command::Apply { words } => client.submit(&words.join(" ")).await?,
            Command::Undo => client.undo().await?,
            Command::Revert { .. } => match revert_index {
                Some(index) => client.revert(index).await?,
                None => Resolution::Failed,
            },
            Command::Show { .. } | Command::Config { .. } => Resolution::Applied,
        };
        ilog!("Headless command finished: {:?}", resolution);
        Ok::<_, Error>(client)
    })?;

    let state = client.state();
    if let Command::Show {
        output: Some(path),
    } = &cmd
    {
        write_image(state, path)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&document_json(state))?);
    } else {
        print!("{}", document_text(state));
    }

    for (slot, message) in state.errors().iter() {
        eprintln!("{} error: {}", slot.label(), message);
    }
    Ok(())
}

fn parse_revert_index(raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Validation(format!("revert index must be a number, got {:?}", raw)))
}

fn write_image(state: &DocumentState, path: &Path) -> Result<()> {
    let Some(uri) = state.image().data_uri() else {
        return Err(Error::Validation("server has no image yet".to_string()));
    };
    let bytes = DataUri::parse(uri)?.decode()?;
    std::fs::write(path, &bytes)?;
    println!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn document_text(state: &DocumentState) -> String {
    let mut out = String::new();
    match ImageView::from_state(state.image()) {
        Some(view) => out.push_str(&format!("Image: {}\n", view.describe())),
        None => out.push_str("Image: none\n"),
    }
    if state.commands().is_empty() {
        out.push_str("History: empty\n");
    } else {
        out.push_str("History:\n");
        for row in state.commands().display_rows() {
            out.push_str(&format!("  {}\n", row));
        }
    }
    out
}

fn document_json(state: &DocumentState) -> serde_json::Value {
    let errors: serde_json::Map<String, serde_json::Value> = state
        .errors()
        .iter()
        .map(|(slot, msg)| (slot.label().to_string(), serde_json::Value::from(msg)))
        .collect();
    serde_json::json!({
        "image": state.image().data_uri(),
        "commands": state.commands().as_slice(),
        "errors": errors,
    })
}

fn run_config(server: Option<String>, timeout: Option<u64>) -> Result<()> {
    let path = Config::config_path()?;
    if server.is_none() && timeout.is_none() {
        let config = Config::load()?;
        println!("Config file: {}", path.display());
        println!("server_url   = {}", config.effective_server_url());
        println!("timeout_secs = {}", config.effective_timeout().as_secs());
        return Ok(());
    }

    let config = Config::load()?.with_overrides(server, timeout);
    config.save()?;
    ilog!("Config saved to {}", path.display());
    println!("Saved {}", path.display());
    Ok(())
}

fn render_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: Receiver<RenderState>,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut state = RenderState::default();
    let mut last_version: u64 = 0;
    let mut last_frame = Instant::now();
    let mut dirty = true;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match state_rx.try_recv() {
            Ok(s) => {
                dirty = dirty || s.version != last_version;
                state = s;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if last_frame.elapsed() < FRAME_DURATION {
            thread::sleep(Duration::from_micros(500));
            continue;
        }
        last_frame = Instant::now();

        if dirty {
            terminal.draw(|f| ui::draw(f, &state))?;
            last_version = state.version;
            dirty = false;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(disable_raw_mode()?)
}
