//! Runs a composed command through the shell and streams its output.
//!
//! Two reader threads drain stdout and stderr, and an optional status thread
//! ticks a progress indicator while the child is alive. All of them send
//! [`RunEvent`]s over one channel; the calling thread is the only consumer and
//! hands each event to an [`OutputSink`]. Chunks from one stream arrive in the
//! order they were read. The running flag is cleared only after both streams
//! hit EOF and the child has been reaped.

use std::io::{self, ErrorKind, IsTerminal, Read, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::command::CommandSpec;
use crate::error::{Result, RubyTestError};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);
const PROGRESS_FRAMES: [&str; 6] = ["[=   ]", "[ =  ]", "[  = ]", "[   =]", "[  = ]", "[ =  ]"];
const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug)]
pub enum RunEvent {
    Output { stream: Stream, bytes: Vec<u8> },
    Progress(&'static str),
    Closed(Stream),
}

/// Where run output goes. The editor adapter's panel, or the terminal.
pub trait OutputSink {
    fn output(&mut self, stream: Stream, bytes: &[u8]);

    fn progress(&mut self, _frame: &str) {}

    fn finished(&mut self, _outcome: &RunOutcome) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Shell line run to completion before the command itself.
    pub before_callback: Option<String>,
    pub show_progress: bool,
}

/// Run `spec` to completion, forwarding all output to `sink`.
pub fn run(spec: &CommandSpec, options: &RunOptions, sink: &mut dyn OutputSink) -> Result<RunOutcome> {
    if let Some(before) = options.before_callback.as_deref().filter(|b| !b.trim().is_empty()) {
        let before_spec = CommandSpec {
            shell_text: before.to_string(),
            working_directory: spec.working_directory.clone(),
        };
        let outcome = stream_command(&before_spec, false, sink)?;
        if !outcome.success() {
            warn!(command = before, exit_code = ?outcome.exit_code, "before callback failed");
        }
    }

    let outcome = stream_command(spec, options.show_progress, sink)?;
    sink.finished(&outcome);
    Ok(outcome)
}

fn stream_command(spec: &CommandSpec, show_progress: bool, sink: &mut dyn OutputSink) -> Result<RunOutcome> {
    info!(command = %spec.shell_text, cwd = %spec.working_directory, "running command");
    let start = Instant::now();

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(&spec.shell_text)
        .current_dir(&spec.working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| RubyTestError::Spawn {
            command: spec.shell_text.clone(),
            source,
        })?;

    let (tx, rx) = mpsc::channel();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, Stream::Stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, Stream::Stderr, tx.clone()));
    }

    let running = Arc::new(AtomicBool::new(true));
    let status = show_progress.then(|| spawn_status(Arc::clone(&running), tx.clone()));
    drop(tx);

    let mut open = readers.len();
    while open > 0 {
        match rx.recv() {
            Ok(RunEvent::Output { stream, bytes }) => sink.output(stream, &bytes),
            Ok(RunEvent::Progress(frame)) => sink.progress(frame),
            Ok(RunEvent::Closed(_)) => open -= 1,
            Err(_) => break,
        }
    }

    let wait_result = child.wait();
    running.store(false, Ordering::Release);

    if let Some(handle) = status {
        join_quietly(handle, "status");
    }
    for handle in readers {
        join_quietly(handle, "output reader");
    }

    let status = wait_result?;
    let outcome = RunOutcome {
        exit_code: status.code(),
        duration: start.elapsed(),
    };
    info!(exit_code = ?outcome.exit_code, duration_ms = outcome.duration.as_millis() as u64, "command finished");
    Ok(outcome)
}

fn spawn_reader<R>(mut source: R, stream: Stream, tx: Sender<RunEvent>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let event = RunEvent::Output {
                        stream,
                        bytes: buf[..n].to_vec(),
                    };
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(?stream, error = %e, "read failed");
                    break;
                }
            }
        }
        let _ = tx.send(RunEvent::Closed(stream));
    })
}

fn spawn_status(running: Arc<AtomicBool>, tx: Sender<RunEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut frame = 0;
        while running.load(Ordering::Acquire) {
            if tx.send(RunEvent::Progress(PROGRESS_FRAMES[frame])).is_err() {
                break;
            }
            frame = (frame + 1) % PROGRESS_FRAMES.len();
            thread::sleep(PROGRESS_INTERVAL);
        }
    })
}

fn join_quietly(handle: JoinHandle<()>, name: &str) {
    if handle.join().is_err() {
        warn!(thread = name, "worker thread panicked");
    }
}

/// Writes output straight through to this process's stdout and stderr.
/// Progress frames are drawn on stderr only when it is a terminal.
pub struct TerminalSink {
    draw_progress: bool,
    progress_visible: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            draw_progress: io::stderr().is_terminal(),
            progress_visible: false,
        }
    }

    fn clear_progress(&mut self) {
        if self.progress_visible {
            let _ = write!(io::stderr(), "\r{:width$}\r", "", width = PROGRESS_FRAMES[0].len());
            self.progress_visible = false;
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for TerminalSink {
    fn output(&mut self, stream: Stream, bytes: &[u8]) {
        self.clear_progress();
        let result = match stream {
            Stream::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(bytes).and_then(|_| out.flush())
            }
            Stream::Stderr => io::stderr().lock().write_all(bytes),
        };
        if let Err(e) = result {
            warn!(?stream, error = %e, "could not forward output");
        }
    }

    fn progress(&mut self, frame: &str) {
        if self.draw_progress {
            let _ = write!(io::stderr(), "\r{frame}");
            self.progress_visible = true;
        }
    }

    fn finished(&mut self, _outcome: &RunOutcome) {
        self.clear_progress();
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub progress_frames: usize,
    pub finished: Option<RunOutcome>,
}

impl BufferSink {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

impl OutputSink for BufferSink {
    fn output(&mut self, stream: Stream, bytes: &[u8]) {
        match stream {
            Stream::Stdout => self.stdout.extend_from_slice(bytes),
            Stream::Stderr => self.stderr.extend_from_slice(bytes),
        }
    }

    fn progress(&mut self, _frame: &str) {
        self.progress_frames += 1;
    }

    fn finished(&mut self, outcome: &RunOutcome) {
        self.finished = Some(outcome.clone());
    }
}
