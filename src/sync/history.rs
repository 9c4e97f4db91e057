//! The confirmed command history.
//!
//! Stored oldest-first (index 0 is the first command ever applied) and shown
//! newest-first. Display row `p` maps to chronological index `len - p - 1`.

/// One row of the newest-first history view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    /// Chronological position in the log.
    pub index: usize,
    pub command: String,
}

impl std::fmt::Display for HistoryRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.) {}", self.index, self.command)
    }
}

/// Mirror of the server's command history. Only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLog {
    commands: Vec<String>,
}

impl CommandLog {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.commands.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.commands
    }

    pub(crate) fn replace(&mut self, commands: Vec<String>) {
        self.commands = commands;
    }

    /// Chronological index for newest-first display row `display_pos`.
    pub fn chronological_index(&self, display_pos: usize) -> Option<usize> {
        self.len().checked_sub(display_pos + 1)
    }

    /// Whether reverting to `index` is a request worth sending.
    ///
    /// Inclusive: `index == len` keeps every command and asks the server to
    /// confirm the current state.
    pub fn accepts_revert(&self, index: usize) -> bool {
        index <= self.len()
    }

    /// Rows newest-first, each labelled with its chronological index.
    pub fn display_rows(&self) -> impl Iterator<Item = HistoryRow> + '_ {
        self.commands
            .iter()
            .enumerate()
            .rev()
            .map(|(index, command)| HistoryRow {
                index,
                command: command.clone(),
            })
    }
}

impl From<Vec<String>> for CommandLog {
    fn from(commands: Vec<String>) -> Self {
        Self { commands }
    }
}
