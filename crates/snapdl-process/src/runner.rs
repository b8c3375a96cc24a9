//! Spawning external tools and streaming their output.

use crate::{ProcessError, Result};
use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often [`RunningProcess::wait`] checks whether the tool has exited.
const REAP_POLL: Duration = Duration::from_millis(10);

/// The process ID while the child may still be signalled, `None` once it has
/// been reaped. Reaping and signalling both happen under this lock, so a
/// signal never reaches a recycled PID.
type LivePid = Arc<Mutex<Option<u32>>>;

fn lock_live(live: &Mutex<Option<u32>>) -> MutexGuard<'_, Option<u32>> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates a [`Command`] configured to run without stealing focus.
pub(crate) fn command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    configure_for_background(&mut cmd);
    cmd
}

#[cfg(windows)]
fn configure_for_background(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    // Keep console windows from popping up while tools run.
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_for_background(_cmd: &mut Command) {}

/// A command line for an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    /// Creates a command that runs `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Returns the program path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns the arguments.
    #[must_use]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Renders the command line for log output.
    #[must_use]
    pub fn display(&self) -> String {
        let mut rendered = self.program.display().to_string();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }

    /// Runs the command to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] if the program cannot be started.
    pub fn output(&self) -> Result<Output> {
        command(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ProcessError::Spawn {
                program: self.program.clone(),
                source: e,
            })
    }

    /// Runs the command to completion and requires a zero exit status.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] if the program cannot be started and
    /// [`ProcessError::ToolFailed`] if it exits unsuccessfully.
    pub fn checked_output(&self) -> Result<Output> {
        let output = self.output()?;
        if output.status.success() {
            return Ok(output);
        }
        Err(ProcessError::ToolFailed {
            tool: self.program.display().to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Starts the command with stdout and stderr piped into one line stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started or its output
    /// readers cannot be set up. A child that was already started is killed
    /// before the error is returned.
    pub fn spawn(&self) -> Result<RunningProcess> {
        let mut child = command(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        match self.start_readers(&mut child) {
            Ok((lines, readers)) => Ok(RunningProcess {
                live: Arc::new(Mutex::new(Some(child.id()))),
                child,
                lines,
                readers,
            }),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        }
    }

    fn start_readers(
        &self,
        child: &mut Child,
    ) -> Result<(Receiver<io::Result<String>>, Vec<JoinHandle<()>>)> {
        let stdout = child.stdout.take().ok_or_else(|| ProcessError::MissingPipe {
            program: self.program.clone(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| ProcessError::MissingPipe {
            program: self.program.clone(),
        })?;

        let (tx, rx) = mpsc::channel();
        let stderr_tx = tx.clone();
        let readers = vec![
            thread::Builder::new()
                .name("snapdl-stdout".to_string())
                .spawn(move || pump_lines(stdout, &tx))?,
            thread::Builder::new()
                .name("snapdl-stderr".to_string())
                .spawn(move || pump_lines(stderr, &stderr_tx))?,
        ];

        Ok((rx, readers))
    }
}

/// Forwards every non-empty line of `source` to `tx`.
///
/// Lines end at `\n` or `\r`, since progress output is often redrawn in place
/// with carriage returns. Bytes that are not UTF-8 are replaced.
fn pump_lines<R: Read>(source: R, tx: &Sender<io::Result<String>>) {
    let mut reader = BufReader::new(source);
    let mut line = Vec::new();

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };
        if available.is_empty() {
            break;
        }

        let consumed = available.len();
        for &byte in available {
            if byte == b'\n' || byte == b'\r' {
                if !flush_line(&mut line, tx) {
                    return;
                }
            } else {
                line.push(byte);
            }
        }
        reader.consume(consumed);
    }

    flush_line(&mut line, tx);
}

/// Sends the buffered line if it is non-empty. Returns false once the
/// receiving side has gone away.
fn flush_line(line: &mut Vec<u8>, tx: &Sender<io::Result<String>>) -> bool {
    if line.is_empty() {
        return true;
    }
    let text = String::from_utf8_lossy(line).into_owned();
    line.clear();
    tx.send(Ok(text)).is_ok()
}

/// A spawned external tool.
///
/// Output lines from stdout and stderr arrive on one stream in the order they
/// were read. The stream ends once both pipes are closed.
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    live: LivePid,
    lines: Receiver<io::Result<String>>,
    readers: Vec<JoinHandle<()>>,
}

impl RunningProcess {
    /// Returns the operating system process ID.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Returns a handle that can terminate this process from another thread.
    #[must_use]
    pub fn handle(&self) -> ProcessHandle {
        ProcessHandle {
            pid: self.child.id(),
            live: Arc::clone(&self.live),
        }
    }

    /// Blocks until the next output line is available.
    ///
    /// Returns `None` once the tool has closed both output pipes.
    pub fn next_line(&self) -> Option<Result<String>> {
        self.lines.recv().ok().map(|r| r.map_err(ProcessError::from))
    }

    /// Iterates over output lines until end of stream.
    pub fn lines(&self) -> impl Iterator<Item = Result<String>> + '_ {
        std::iter::from_fn(move || self.next_line())
    }

    /// Waits for the tool to exit.
    ///
    /// Handles taken from this process stop signalling once it is reaped.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on the child fails.
    pub fn wait(mut self) -> Result<ExitStatus> {
        let status = loop {
            {
                let mut live = lock_live(&self.live);
                if let Some(status) = self.child.try_wait()? {
                    *live = None;
                    break status;
                }
            }
            thread::sleep(REAP_POLL);
        };
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        Ok(status)
    }

    /// Kills the tool and reaps it. Used when output handling fails midway.
    ///
    /// # Errors
    ///
    /// Returns an error if reaping the child fails.
    pub fn abort(mut self) -> Result<()> {
        let mut live = lock_live(&self.live);
        let _ = self.child.kill();
        self.child.wait()?;
        *live = None;
        Ok(())
    }
}

/// How a termination request was fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The graceful request was delivered.
    Graceful,
    /// The graceful request failed and the process was killed.
    Forced,
    /// The process had already been reaped; nothing was sent.
    AlreadyExited,
}

/// Terminates a tool by process ID.
///
/// The handle does not own the process; whoever spawned it still reaps it.
/// Once that happens the handle goes inert.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: u32,
    live: LivePid,
}

impl ProcessHandle {
    /// Wraps the ID of a process this program did not spawn. Such a handle
    /// never learns that the process exited.
    #[must_use]
    pub fn from_pid(pid: u32) -> Self {
        Self {
            pid,
            live: Arc::new(Mutex::new(Some(pid))),
        }
    }

    /// Returns the process ID.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Requests graceful termination, falling back to a forceful kill when
    /// the graceful request fails. There is no wait between the two.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Terminate`] if both requests fail.
    pub fn terminate(&self) -> Result<Termination> {
        let live = lock_live(&self.live);
        if live.is_none() {
            return Ok(Termination::AlreadyExited);
        }

        let graceful = self.send_graceful();
        if graceful.is_ok() {
            return Ok(Termination::Graceful);
        }

        let forced = self.send_kill();
        match forced {
            Ok(()) => Ok(Termination::Forced),
            Err(kill_err) => Err(ProcessError::Terminate {
                pid: self.pid,
                detail: format!(
                    "graceful: {}; forceful: {kill_err}",
                    graceful.err().unwrap_or_default()
                ),
            }),
        }
    }

    #[cfg(unix)]
    fn send_graceful(&self) -> std::result::Result<(), String> {
        signal(self.pid, "-TERM")
    }

    #[cfg(unix)]
    fn send_kill(&self) -> std::result::Result<(), String> {
        signal(self.pid, "-KILL")
    }

    #[cfg(windows)]
    fn send_graceful(&self) -> std::result::Result<(), String> {
        taskkill(&["/PID", &self.pid.to_string()])
    }

    #[cfg(windows)]
    fn send_kill(&self) -> std::result::Result<(), String> {
        taskkill(&["/F", "/PID", &self.pid.to_string()])
    }

    #[cfg(not(any(unix, windows)))]
    fn send_graceful(&self) -> std::result::Result<(), String> {
        Err("process termination is not supported on this platform".to_string())
    }

    #[cfg(not(any(unix, windows)))]
    fn send_kill(&self) -> std::result::Result<(), String> {
        Err("process termination is not supported on this platform".to_string())
    }
}

#[cfg(unix)]
fn signal(pid: u32, signal: &str) -> std::result::Result<(), String> {
    let output = command("kill")
        .args([signal, &pid.to_string()])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("kill {signal}: {e}"))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "kill {signal} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}

#[cfg(windows)]
fn taskkill(args: &[&str]) -> std::result::Result<(), String> {
    let output = command("taskkill")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("taskkill: {e}"))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "taskkill exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}
