use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Execution flags of a command, written as a string of attribute characters
/// in menu files (`w`, `t`, `b`, `r`, `p`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attribs {
    pub wait_after_cmd: bool,
    pub run_in_terminal: bool,
    pub run_in_background: bool,
    pub use_root_permissions: bool,
    pub pipe_to_pager: bool,
}

impl Attribs {
    /// Parses and validates an attribute string such as `"tw"`.
    ///
    /// # Errors
    /// Returns a message for unknown characters or contradictory flags.
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut a = Attribs::default();
        for ch in s.chars() {
            match ch {
                'w' => a.wait_after_cmd = true,
                't' => a.run_in_terminal = true,
                'b' => a.run_in_background = true,
                'r' => a.use_root_permissions = true,
                'p' => a.pipe_to_pager = true,
                c if c.is_whitespace() => {}
                c => return Err(format!("Unknown command attribute character: '{c}'")),
            }
        }
        a.validate()?;
        Ok(a)
    }

    /// Attributes implied by the one-letter command kinds of the text format.
    #[must_use]
    pub fn from_kind(kind: char) -> Option<Self> {
        let chars = match kind {
            'N' => "t",
            'W' => "tw",
            'P' => "tp",
            'B' => "b",
            _ => return None,
        };
        Self::parse(chars).ok()
    }

    fn validate(&self) -> Result<(), String> {
        if self.wait_after_cmd && !self.run_in_terminal {
            return Err("Bad combination of attributes: wait without terminal".to_string());
        }
        if self.run_in_background && self.wait_after_cmd {
            return Err("Bad combination of attributes: background and wait".to_string());
        }
        if self.run_in_background && self.run_in_terminal {
            return Err("Bad combination of attributes: background and terminal".to_string());
        }
        if self.pipe_to_pager && !self.run_in_terminal {
            return Err("Bad combination of attributes: pager without terminal".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for Attribs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (set, ch) in [
            (self.wait_after_cmd, 'w'),
            (self.run_in_terminal, 't'),
            (self.run_in_background, 'b'),
            (self.use_root_permissions, 'r'),
            (self.pipe_to_pager, 'p'),
        ] {
            if set {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

/// Shell command carried by a menu entry. An empty command string makes
/// activation a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    cmd_str: String,
    attribs: Attribs,
}

impl Command {
    pub fn new(cmd_str: impl Into<String>, attribs: Attribs) -> Self {
        Self {
            cmd_str: cmd_str.into(),
            attribs,
        }
    }

    #[must_use]
    pub fn cmd_str(&self) -> &str {
        &self.cmd_str
    }

    #[must_use]
    pub fn attribs(&self) -> Attribs {
        self.attribs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cmd_str.trim().is_empty()
    }
}

/// How commands flagged `r` obtain root permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RootMethod {
    Su,
    #[default]
    Sudo,
    Pkexec,
}

/// Exit report of a background command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub label: String,
    pub code: Option<i32>,
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(0) => write!(f, "[✔] {} finished", self.label),
            Some(code) => write!(f, "[✖] {} failed (exit {code})", self.label),
            None => write!(f, "[⛔] {} terminated", self.label),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandExecutor {
    pub root_method: RootMethod,
    pub shell: String,
    pub pager: String,
    pub editor: String,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self {
            root_method: RootMethod::default(),
            shell: "sh".to_string(),
            pager: "less".to_string(),
            editor: std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string()),
        }
    }
}

impl CommandExecutor {
    /// Builds the shell line for `cmd`: pager pipe first, root elevation
    /// around the whole line.
    #[must_use]
    pub fn compile(&self, cmd: &Command) -> String {
        let attribs = cmd.attribs();
        let mut line = cmd.cmd_str().trim().to_string();
        if attribs.pipe_to_pager {
            line = format!("({line}) 2>&1 | {}", self.pager);
        }
        if attribs.use_root_permissions {
            line = match self.root_method {
                RootMethod::Su => format!("su -c {}", shell_quote(&line)),
                RootMethod::Sudo => format!("sudo -- {} -c {}", self.shell, shell_quote(&line)),
                RootMethod::Pkexec => format!("pkexec {} -c {}", self.shell, shell_quote(&line)),
            };
        }
        line
    }

    /// Runs `cmd` attached to the current terminal and blocks until it exits.
    /// The caller must have released the terminal beforehand.
    ///
    /// # Errors
    /// Returns error if the shell cannot be spawned or stdin cannot be read.
    pub fn run_foreground(&self, cmd: &Command) -> io::Result<ExitStatus> {
        let line = self.compile(cmd);
        debug!(attribs = %cmd.attribs(), "run command");
        info!("==> {line}");
        let status = std::process::Command::new(&self.shell)
            .arg("-c")
            .arg(&line)
            .status()?;
        if cmd.attribs().wait_after_cmd {
            let mut out = io::stdout();
            write!(out, "\n\x1b[97;1mPress Enter to return to the menu\x1b[0m")?;
            out.flush()?;
            let mut buf = String::new();
            io::stdin().lock().read_line(&mut buf)?;
        }
        Ok(status)
    }

    /// Spawns `cmd` detached from the terminal. Its exit is reported on `tx`.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns error if the shell cannot be spawned.
    pub fn spawn_background(
        &self,
        label: &str,
        cmd: &Command,
        tx: mpsc::Sender<JobReport>,
    ) -> io::Result<()> {
        let line = self.compile(cmd);
        info!("==> {line} &");
        let mut child = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let label = label.to_string();
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(error = %e, command = %label, "background command lost");
                    None
                }
            };
            let _ = tx.send(JobReport { label, code }).await;
        });
        Ok(())
    }

    /// Opens `path` in the configured editor, attached to the terminal.
    ///
    /// # Errors
    /// Returns error if the editor cannot be spawned.
    pub fn edit(&self, path: &Path) -> io::Result<ExitStatus> {
        let line = format!("{} {}", self.editor, shell_quote(&path.to_string_lossy()));
        info!("==> {line}");
        std::process::Command::new(&self.shell)
            .arg("-c")
            .arg(line)
            .status()
    }
}

#[must_use]
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    let mut out = String::from("'");
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}
