//! Camera/decoder collaborator.
//!
//! The core only needs an on/off switch for the feed. [`CommandCapture`]
//! implements it by running an external decoder (by default
//! `zbarcam --raw --nodisplay`, which prints one decoded payload per line) and
//! turning its output into [`RecognitionEvent`]s.
//!
//! Activating spawns the decoder; deactivating kills it. Events are delivered
//! over an `mpsc` channel and may still arrive shortly after deactivation, so
//! consumers check [`CaptureControl::is_active`] before using them.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use parking_lot::Mutex;

use crate::debounce::RecognitionEvent;
use crate::error::{QrBatchError, Result};

/// Default decoder command.
pub const DEFAULT_CAPTURE_COMMAND: &str = "zbarcam --raw --nodisplay";

/// Activate/deactivate signal for the live feed.
pub trait CaptureControl: Send + Sync {
    /// Start or stop the feed.
    ///
    /// # Errors
    /// Returns an error if the feed could not be started.
    fn set_active(&self, active: bool) -> Result<()>;

    /// Whether the feed is currently running.
    fn is_active(&self) -> bool;
}

/// A capture switch with no feed behind it.
///
/// Used by the headless `send` command and in tests; it only records the
/// requested state.
#[derive(Debug, Default)]
pub struct NullCapture {
    active: AtomicBool,
}

impl NullCapture {
    #[must_use]
    pub fn new(active: bool) -> Self {
        Self {
            active: AtomicBool::new(active),
        }
    }
}

impl CaptureControl for NullCapture {
    fn set_active(&self, active: bool) -> Result<()> {
        self.active.store(active, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Runs a decoder process and streams its output lines as events.
#[derive(Debug)]
pub struct CommandCapture {
    command: String,
    tx: Sender<RecognitionEvent>,
    child: Mutex<Option<Child>>,
}

impl CommandCapture {
    /// Create an inactive capture that will run `command` through the shell.
    #[must_use]
    pub fn new(command: impl Into<String>, tx: Sender<RecognitionEvent>) -> Self {
        Self {
            command: command.into(),
            tx,
            child: Mutex::new(None),
        }
    }

    /// The decoder command line.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    fn spawn(&self) -> Result<Child> {
        log::info!("Starting capture: {}", self.command);

        let mut child = shell_command(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(QrBatchError::Capture)?;

        if let Some(stdout) = child.stdout.take() {
            let tx = self.tx.clone();
            let spawned = thread::Builder::new()
                .name("capture-reader".to_string())
                .spawn(move || forward_lines(BufReader::new(stdout), &tx));
            if let Err(e) = spawned {
                let _ = child.kill();
                let _ = child.wait();
                return Err(QrBatchError::Capture(e));
            }
        }

        Ok(child)
    }
}

impl CaptureControl for CommandCapture {
    fn set_active(&self, active: bool) -> Result<()> {
        let mut slot = self.child.lock();
        match (active, slot.is_some()) {
            (true, false) => {
                *slot = Some(self.spawn()?);
            }
            (false, true) => {
                if let Some(mut child) = slot.take() {
                    log::info!("Stopping capture");
                    if let Err(e) = child.kill() {
                        log::debug!("Capture process already exited: {}", e);
                    }
                    let _ = child.wait();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        let mut slot = self.child.lock();
        match slot.as_mut().map(Child::try_wait) {
            Some(Ok(Some(status))) => {
                log::warn!("Capture process exited: {}", status);
                *slot = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

impl Drop for CommandCapture {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.get_mut().take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Turn each line of decoder output into one event.
///
/// Stops at EOF or when the receiving side is gone.
pub fn forward_lines<R: BufRead>(reader: R, tx: &Sender<RecognitionEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::debug!("Capture output ended: {}", e);
                break;
            }
        };
        if tx.send(parse_line(&line)).is_err() {
            break;
        }
    }
    log::trace!("Capture reader finished");
}

/// Parse one decoder output line. Blank lines yield empty events.
#[must_use]
pub fn parse_line(line: &str) -> RecognitionEvent {
    let value = line.trim_end_matches(['\r', '\n']);
    if value.trim().is_empty() {
        RecognitionEvent::default()
    } else {
        RecognitionEvent::new([value])
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
