//! Line-oriented local transport used by `sysrpg play`.
//!
//! ```text
//! as 1 Arin        switch to player 1, creating them as "Arin" if new
//! move:north       dispatch an action for the current player
//! hello there      anything else is chat text for the current conversation
//! help / quit
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::game::dispatch::{
    Action, ActionReport, ActionRequest, DeliveryError, Dispatcher, Presenter, ACTION_IDS,
};
use crate::game::errors::GameError;
use crate::game::types::{NotificationEvent, PlayerId, RenderRequest, Severity};

pub const HELP_TEXT: &str = "\
Commands:
  as <id> [name]        act as player <id> (created on first use)
  move:<n|s|e|w>        walk one cell
  go:<exit>             take a named exit
  path:<cultivation|mana>
  train | breakthrough
  attack:<id> | chat:<id>
  status | inventory | quests
  name:<new name>
  help | quit
Any other line is sent to the player you are chatting with.";

/// Writes notifications and screens as plain text.
pub struct ConsolePresenter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsolePresenter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn write_block(&self, player_id: PlayerId, text: &str) -> Result<(), DeliveryError> {
        let mut out = self.out.lock().map_err(|_| DeliveryError {
            player_id,
            reason: "console writer poisoned".to_string(),
        })?;
        writeln!(out, "{}", text)
            .and_then(|_| out.flush())
            .map_err(|e| DeliveryError {
                player_id,
                reason: e.to_string(),
            })
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Warning => "warn",
        Severity::Alert => "ALERT",
    }
}

impl Presenter for ConsolePresenter {
    fn notify(&self, event: &NotificationEvent) -> Result<(), DeliveryError> {
        self.write_block(
            event.target_player_id,
            &format!(
                "[{} -> #{}] {}",
                severity_tag(event.severity),
                event.target_player_id,
                event.text
            ),
        )
    }

    fn render(&self, request: &RenderRequest, screen: &str) -> Result<(), DeliveryError> {
        self.write_block(
            request.player_id,
            &format!("--- #{} ---\n{}\n", request.player_id, screen),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Empty,
    Help,
    Quit,
    Switched(PlayerId),
    Applied(ActionReport),
}

/// Interprets console lines on behalf of whichever player is selected.
pub struct ConsoleSession {
    dispatcher: Arc<Dispatcher>,
    current: Option<PlayerId>,
}

impl ConsoleSession {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            current: None,
        }
    }

    pub fn current(&self) -> Option<PlayerId> {
        self.current
    }

    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome, GameError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineOutcome::Empty);
        }
        match line.to_ascii_lowercase().as_str() {
            "help" | "?" => return Ok(LineOutcome::Help),
            "quit" | "exit" => return Ok(LineOutcome::Quit),
            _ => {}
        }
        if let Some(rest) = line.strip_prefix("as ") {
            return self.switch(rest);
        }

        let player_id = self.current.ok_or_else(|| {
            GameError::InvalidAction("no player selected; use `as <id>` first".to_string())
        })?;
        let action_id = line.split(':').next().unwrap_or(line).trim().to_ascii_lowercase();
        let report = if ACTION_IDS.contains(&action_id.as_str()) {
            let action: Action = line.parse()?;
            self.dispatcher.handle(ActionRequest::new(player_id, action))?
        } else {
            self.dispatcher.handle_text(player_id, line)?
        };
        Ok(LineOutcome::Applied(report))
    }

    fn switch(&mut self, rest: &str) -> Result<LineOutcome, GameError> {
        let mut parts = rest.trim().splitn(2, char::is_whitespace);
        let raw_id = parts.next().unwrap_or_default();
        let player_id = raw_id.parse::<PlayerId>().map_err(|_| {
            GameError::InvalidAction(format!("`{}` is not a player id", raw_id))
        })?;
        let name = parts
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Player {}", player_id));
        self.dispatcher.start(player_id, &name)?;
        self.current = Some(player_id);
        Ok(LineOutcome::Switched(player_id))
    }
}
