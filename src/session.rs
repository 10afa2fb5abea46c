//! The interactive session as a pure state machine.
//!
//! [`Session::handle`] takes one [`Event`] and returns the [`Effect`]s the
//! terminal driver has to carry out. Nothing in here touches the terminal,
//! the network or the disk.

use std::path::PathBuf;

use crate::config::DownloadErrorPolicy;
use crate::downloader::{DownloadOutcome, DownloadProgress};
use crate::error::Result;
use crate::release::{AssetRecord, ReleaseRecord};
use crate::table::AssetTable;

/// Identifies one download launched by the session.
pub type TransferId = usize;

/// Input to [`Session::handle`]: a key press already mapped by the driver,
/// or a report from a download task.
#[derive(Debug)]
pub enum Event {
    /// End the session.
    Quit,
    /// Switch the table between focused and unfocused.
    ToggleFocus,
    /// Move the cursor one row up.
    MoveUp,
    /// Move the cursor one row down.
    MoveDown,
    /// Jump to the first row.
    Top,
    /// Jump to the last row.
    Bottom,
    /// Show a shell command that fetches the selected asset.
    PrintCommand,
    /// Download the selected asset in the background.
    StartDownload,
    /// Latest snapshot from the download task of transfer `id`.
    Progress {
        id: TransferId,
        progress: DownloadProgress,
    },
    /// Terminal result of the download task of transfer `id`.
    Finished {
        id: TransferId,
        result: Result<DownloadOutcome>,
    },
}

/// Side effect requested by the session and carried out by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A line for the user; not a state change.
    Print(String),
    /// Start downloading `asset` in the background, reporting back as transfer `id`.
    SpawnDownload { id: TransferId, asset: AssetRecord },
    /// Leave the event loop; `failure` carries the reason for an abnormal exit.
    Exit { failure: Option<String> },
}

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Accepting events.
    Ready,
    /// Quit or failed fatally; every further event is ignored.
    Terminated,
}

/// Where a [`Transfer`] stands.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferStatus {
    /// The download task is still running.
    InFlight,
    /// The asset was saved to `path`.
    Completed { path: PathBuf, bytes: u64 },
    /// The download failed; `message` is shown to the user.
    Failed { message: String },
}

/// The session's read-only view of a download it launched.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// Index of this transfer in [`Session::transfers`].
    pub id: TransferId,
    /// Name of the asset being downloaded.
    pub asset: String,
    /// Latest progress report; `None` until the first one arrives.
    pub progress: Option<DownloadProgress>,
    pub status: TransferStatus,
}

/// The literal command shown for the print-command key.
pub fn download_command(asset: &AssetRecord) -> String {
    format!("Download URL: curl -LO {}", asset.download_url)
}

/// State of one interactive browsing session over a fetched release.
///
/// Every transfer launched is kept for the whole session, since a
/// [`TransferId`] is its index. The list grows by one per download key
/// press; the view only draws the most recent ones.
pub struct Session {
    release: ReleaseRecord,
    table: AssetTable,
    status: Status,
    transfers: Vec<Transfer>,
    on_download_error: DownloadErrorPolicy,
}

impl Session {
    pub fn new(release: ReleaseRecord, on_download_error: DownloadErrorPolicy) -> Self {
        let table = AssetTable::build(&release);
        Self {
            release,
            table,
            status: Status::Ready,
            transfers: Vec::new(),
            on_download_error,
        }
    }

    pub fn release(&self) -> &ReleaseRecord {
        &self.release
    }

    pub fn table(&self) -> &AssetTable {
        &self.table
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_terminated(&self) -> bool {
        self.status == Status::Terminated
    }

    /// Every download launched so far, oldest first.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Apply `event` and return the side effects it asks for.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        if self.is_terminated() {
            return Vec::new();
        }

        match event {
            Event::Quit => {
                self.status = Status::Terminated;
                vec![Effect::Exit { failure: None }]
            }
            Event::ToggleFocus => {
                self.table.toggle_focus();
                Vec::new()
            }
            Event::MoveUp => {
                self.table.move_cursor(-1);
                Vec::new()
            }
            Event::MoveDown => {
                self.table.move_cursor(1);
                Vec::new()
            }
            Event::Top => {
                self.table.select_first();
                Vec::new()
            }
            Event::Bottom => {
                self.table.select_last();
                Vec::new()
            }
            Event::PrintCommand => match self.table.cursor_asset() {
                Some(asset) => vec![Effect::Print(download_command(asset))],
                None => vec![Effect::Print(self.no_assets_notice())],
            },
            Event::StartDownload => self.start_download(),
            Event::Progress { id, progress } => {
                if let Some(transfer) = self.transfers.get_mut(id) {
                    if transfer.status == TransferStatus::InFlight {
                        transfer.progress = Some(progress);
                    }
                }
                Vec::new()
            }
            Event::Finished { id, result } => self.finish_download(id, result),
        }
    }

    fn start_download(&mut self) -> Vec<Effect> {
        let Some(asset) = self.table.cursor_asset().cloned() else {
            return vec![Effect::Print(self.no_assets_notice())];
        };

        let id = self.transfers.len();
        self.transfers.push(Transfer {
            id,
            asset: asset.name.clone(),
            progress: None,
            status: TransferStatus::InFlight,
        });
        vec![Effect::SpawnDownload { id, asset }]
    }

    fn finish_download(&mut self, id: TransferId, result: Result<DownloadOutcome>) -> Vec<Effect> {
        let Some(transfer) = self.transfers.get_mut(id) else {
            return Vec::new();
        };

        match result {
            Ok(outcome) => {
                transfer.status = TransferStatus::Completed {
                    path: outcome.path,
                    bytes: outcome.bytes,
                };
                Vec::new()
            }
            Err(err) => {
                let message = format!("downloading {} failed: {err}", transfer.asset);
                transfer.status = TransferStatus::Failed {
                    message: message.clone(),
                };
                match self.on_download_error {
                    DownloadErrorPolicy::Display => Vec::new(),
                    DownloadErrorPolicy::Exit => {
                        self.status = Status::Terminated;
                        vec![Effect::Exit {
                            failure: Some(message),
                        }]
                    }
                }
            }
        }
    }

    fn no_assets_notice(&self) -> String {
        format!("release {} has no assets", self.release.tag_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    fn release(names: &[&str]) -> ReleaseRecord {
        ReleaseRecord {
            tag_name: "v1.0.0".into(),
            title: Some("One".into()),
            published_at: None,
            assets: names
                .iter()
                .map(|name| AssetRecord {
                    name: (*name).into(),
                    size: 10,
                    download_url: format!("https://example.com/dl/{name}"),
                })
                .collect(),
        }
    }

    fn session(names: &[&str]) -> Session {
        Session::new(release(names), DownloadErrorPolicy::Display)
    }

    #[test]
    fn test_quit_terminates_and_ignores_later_events() {
        let mut s = session(&["a", "b"]);
        assert_eq!(s.handle(Event::Quit), vec![Effect::Exit { failure: None }]);
        assert!(s.is_terminated());

        assert!(s.handle(Event::MoveDown).is_empty());
        assert!(s.handle(Event::StartDownload).is_empty());
        assert_eq!(s.table().cursor(), 0);
        assert!(s.transfers().is_empty());
    }

    #[test]
    fn test_navigation_and_focus() {
        let mut s = session(&["a", "b", "c"]);
        s.handle(Event::MoveDown);
        assert_eq!(s.table().cursor(), 1);

        s.handle(Event::ToggleFocus);
        assert!(!s.table().is_focused());
        s.handle(Event::MoveDown);
        s.handle(Event::Bottom);
        assert_eq!(s.table().cursor(), 1);

        s.handle(Event::ToggleFocus);
        assert!(s.table().is_focused());
        s.handle(Event::Bottom);
        assert_eq!(s.table().cursor(), 2);
        s.handle(Event::Top);
        s.handle(Event::MoveUp);
        assert_eq!(s.table().cursor(), 0);
    }

    #[test]
    fn test_quit_works_while_unfocused() {
        let mut s = session(&["a"]);
        s.handle(Event::ToggleFocus);
        assert_eq!(s.handle(Event::Quit), vec![Effect::Exit { failure: None }]);
    }

    #[test]
    fn test_print_command_uses_selected_asset() {
        let mut s = session(&["a.zip", "b.tar"]);
        s.handle(Event::MoveDown);
        assert_eq!(
            s.handle(Event::PrintCommand),
            vec![Effect::Print(
                "Download URL: curl -LO https://example.com/dl/b.tar".into()
            )]
        );
        assert!(s.transfers().is_empty());
    }

    #[test]
    fn test_empty_release_is_guarded() {
        let mut s = session(&[]);
        assert_eq!(
            s.handle(Event::PrintCommand),
            vec![Effect::Print("release v1.0.0 has no assets".into())]
        );
        assert_eq!(
            s.handle(Event::StartDownload),
            vec![Effect::Print("release v1.0.0 has no assets".into())]
        );
        assert!(s.transfers().is_empty());
    }

    #[test]
    fn test_start_download_spawns_without_blocking() {
        let mut s = session(&["a.zip", "b.tar"]);
        let effects = s.handle(Event::StartDownload);
        s.handle(Event::MoveDown);
        let more = s.handle(Event::StartDownload);

        match (&effects[..], &more[..]) {
            (
                [Effect::SpawnDownload { id: 0, asset: first }],
                [Effect::SpawnDownload { id: 1, asset: second }],
            ) => {
                assert_eq!(first.name, "a.zip");
                assert_eq!(second.name, "b.tar");
            }
            other => panic!("unexpected effects {other:?}"),
        }
        assert_eq!(s.status(), Status::Ready);
        assert_eq!(s.transfers().len(), 2);
        assert!(s
            .transfers()
            .iter()
            .all(|t| t.status == TransferStatus::InFlight));
    }

    #[test]
    fn test_progress_then_completion() {
        let mut s = session(&["a.zip"]);
        s.handle(Event::StartDownload);
        let progress = DownloadProgress {
            bytes: 5,
            total: Some(10),
            elapsed: Duration::from_millis(200),
        };
        s.handle(Event::Progress { id: 0, progress });
        assert_eq!(s.transfers()[0].progress, Some(progress));

        let effects = s.handle(Event::Finished {
            id: 0,
            result: Ok(DownloadOutcome {
                path: PathBuf::from("a.zip"),
                bytes: 10,
            }),
        });
        assert!(effects.is_empty());
        assert_eq!(
            s.transfers()[0].status,
            TransferStatus::Completed {
                path: PathBuf::from("a.zip"),
                bytes: 10
            }
        );
    }

    #[test]
    fn test_failure_is_displayed_by_default() {
        let mut s = session(&["a.zip"]);
        s.handle(Event::StartDownload);
        let effects = s.handle(Event::Finished {
            id: 0,
            result: Err(Error::Network("connection refused".into())),
        });

        assert!(effects.is_empty());
        assert_eq!(s.status(), Status::Ready);
        match &s.transfers()[0].status {
            TransferStatus::Failed { message } => {
                assert!(message.contains("a.zip"), "{message}");
                assert!(message.contains("connection refused"), "{message}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_exits_with_exit_policy() {
        let mut s = Session::new(release(&["a.zip"]), DownloadErrorPolicy::Exit);
        s.handle(Event::StartDownload);
        let effects = s.handle(Event::Finished {
            id: 0,
            result: Err(Error::Network("connection refused".into())),
        });

        assert!(s.is_terminated());
        match &effects[..] {
            [Effect::Exit {
                failure: Some(message),
            }] => assert!(message.contains("connection refused")),
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn test_late_progress_does_not_reopen_finished_transfer() {
        let mut s = session(&["a.zip"]);
        s.handle(Event::StartDownload);
        s.handle(Event::Finished {
            id: 0,
            result: Err(Error::Network("reset".into())),
        });
        s.handle(Event::Progress {
            id: 0,
            progress: DownloadProgress {
                bytes: 1,
                total: None,
                elapsed: Duration::ZERO,
            },
        });
        assert!(s.transfers()[0].progress.is_none());
        assert!(matches!(
            s.transfers()[0].status,
            TransferStatus::Failed { .. }
        ));
    }

    #[test]
    fn test_unknown_transfer_ids_are_ignored() {
        let mut s = session(&["a.zip"]);
        assert!(s
            .handle(Event::Finished {
                id: 7,
                result: Err(Error::Network("x".into())),
            })
            .is_empty());
    }
}
