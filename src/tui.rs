//! Terminal driver: owns the screen, turns key presses into session events
//! and carries out the effects the session asks for.

use std::io::{self, IsTerminal};
use std::panic;
use std::sync::{Arc, Once};
use std::time::Duration;

use crossterm::cursor::Show;
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{error, info};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::downloader::{DownloadProgress, Downloader, ProgressFn};
use crate::error::{Error, Result};
use crate::release::AssetRecord;
use crate::session::{Effect, Event, Session, TransferId};
use crate::ui;

const TICK: Duration = Duration::from_millis(50);

/// Printed lines kept for the Output panel and the replay on exit.
const MAX_MESSAGES: usize = 100;

static PANIC_HOOK: Once = Once::new();

/// How the interactive session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The user quit.
    Quit,
    /// A download failed under the exit policy; carries the message.
    Failed(String),
}

/// Map a key press to a session event.
pub fn key_event(key: KeyEvent) -> Option<Event> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Event::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Event::Quit),
        KeyCode::Esc => Some(Event::ToggleFocus),
        KeyCode::Up | KeyCode::Char('k') => Some(Event::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Event::MoveDown),
        KeyCode::Home | KeyCode::Char('g') => Some(Event::Top),
        KeyCode::End | KeyCode::Char('G') => Some(Event::Bottom),
        KeyCode::Enter => Some(Event::PrintCommand),
        KeyCode::Char('d') => Some(Event::StartDownload),
        _ => None,
    }
}

/// Run the session on the current terminal until it terminates.
///
/// Downloads are spawned onto `runtime`; this thread only polls input,
/// drains download events and redraws.
pub fn run(session: Session, downloader: Downloader, runtime: &Handle) -> Result<Outcome> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(Error::Terminal(io::Error::other(
            "the asset browser needs an interactive terminal (try --list)",
        )));
    }

    install_panic_hook();
    let mut driver = Driver::new(session, downloader, runtime.clone());
    let res = {
        let _guard = TerminalGuard::enter()?;
        let mut terminal =
            Terminal::new(CrosstermBackend::new(io::stdout())).map_err(Error::Terminal)?;
        terminal.clear().map_err(Error::Terminal)?;
        driver.run_loop(&mut terminal)
    };

    // Printed commands stay useful after the alternate screen is gone.
    for line in &driver.messages {
        println!("{line}");
    }
    res
}

/// Raw mode plus alternate screen, undone on drop whichever way `run` exits.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().map_err(Error::Terminal)?;
        // From here on, dropping the guard restores the terminal.
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen).map_err(Error::Terminal)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Restore the terminal before the panic message is printed, so it is
/// readable and the shell is usable afterwards.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore_terminal();
            previous(info);
        }));
    });
}

struct Driver {
    session: Session,
    downloader: Downloader,
    runtime: Handle,
    messages: Vec<String>,
    outcome: Option<Outcome>,
}

impl Driver {
    fn new(session: Session, downloader: Downloader, runtime: Handle) -> Self {
        Self {
            session,
            downloader,
            runtime,
            messages: Vec::new(),
            outcome: None,
        }
    }

    fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<Outcome> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        loop {
            if let Some(outcome) = self.tick(terminal, &mut rx, &tx)? {
                return Ok(outcome);
            }

            if event::poll(TICK).map_err(Error::Terminal)? {
                if let TermEvent::Key(key) = event::read().map_err(Error::Terminal)? {
                    if key.kind == KeyEventKind::Press {
                        if let Some(event) = key_event(key) {
                            self.apply(event, &tx);
                        }
                    }
                }
            }
        }
    }

    /// Apply pending download events, redraw, and report whether the
    /// session has ended.
    fn tick<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        rx: &mut UnboundedReceiver<Event>,
        tx: &UnboundedSender<Event>,
    ) -> Result<Option<Outcome>> {
        self.drain(rx, tx);
        terminal
            .draw(|f| ui::draw(f, &self.session, &self.messages))
            .map_err(Error::Terminal)?;
        Ok(self.outcome.take())
    }

    /// Apply every download event already queued, without waiting.
    fn drain(&mut self, rx: &mut UnboundedReceiver<Event>, tx: &UnboundedSender<Event>) {
        while let Ok(event) = rx.try_recv() {
            self.apply(event, tx);
        }
    }

    fn apply(&mut self, event: Event, tx: &UnboundedSender<Event>) {
        for effect in self.session.handle(event) {
            match effect {
                Effect::Print(line) => {
                    info!("{line}");
                    self.push_message(line);
                }
                Effect::SpawnDownload { id, asset } => self.spawn_download(id, asset, tx.clone()),
                Effect::Exit { failure: None } => self.outcome = Some(Outcome::Quit),
                Effect::Exit {
                    failure: Some(message),
                } => self.outcome = Some(Outcome::Failed(message)),
            }
        }
    }

    fn push_message(&mut self, line: String) {
        if self.messages.len() >= MAX_MESSAGES {
            self.messages.remove(0);
        }
        self.messages.push(line);
    }

    fn spawn_download(&self, id: TransferId, asset: AssetRecord, tx: UnboundedSender<Event>) {
        let downloader = self.downloader.clone();
        let progress_tx = tx.clone();
        let progress: ProgressFn = Arc::new(move |progress: &DownloadProgress| {
            let _ = progress_tx.send(Event::Progress {
                id,
                progress: *progress,
            });
        });

        self.runtime.spawn(async move {
            let result = downloader.download(&asset.download_url, Some(progress)).await;
            if let Err(err) = &result {
                error!("download of {} failed: {err}", asset.name);
            }
            // The receiver is gone once the session has ended; nothing to report to.
            let _ = tx.send(Event::Finished { id, result });
        });
    }
}
