//! Running external programs (compiler, chain generator).

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{PrepError, ToolFailure};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One invocation of an external program.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    /// Human-readable name of the step, used in errors.
    pub step: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// File connected to the program's standard input.
    pub stdin: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl ToolCommand {
    pub fn new(step: impl Into<String>, program: impl Into<PathBuf>, timeout: Duration) -> Self {
        ToolCommand {
            step: step.into(),
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            working_dir: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// What a finished program left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// Turn an unsuccessful exit into an error for `step`.
    pub fn check(self, step: &str) -> Result<ToolOutput, PrepError> {
        if self.success {
            Ok(self)
        } else {
            Err(PrepError::tool(
                step,
                ToolFailure::Exit {
                    code: self.exit_code,
                    stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
                },
            ))
        }
    }
}

/// Runs external programs. Implemented by [`ProcessRunner`] for real
/// processes; tests substitute their own.
pub trait ToolRunner {
    /// Run `cmd` to completion. An unsuccessful exit is reported through
    /// [`ToolOutput::success`], not as an error.
    fn run(&mut self, cmd: &ToolCommand) -> Result<ToolOutput, PrepError>;
}

impl<T: ToolRunner + ?Sized> ToolRunner for &mut T {
    fn run(&mut self, cmd: &ToolCommand) -> Result<ToolOutput, PrepError> {
        (**self).run(cmd)
    }
}

/// Spawns operating-system processes and kills them when they overrun their
/// timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, cmd: &ToolCommand) -> Result<ToolOutput, PrepError> {
        debug!("{}: {:?} {:?}", cmd.step, cmd.program, cmd.args);

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &cmd.working_dir {
            command.current_dir(dir);
        }
        match &cmd.stdin {
            Some(path) => {
                let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
                command.stdin(Stdio::from(file));
            }
            None => {
                command.stdin(Stdio::null());
            }
        }

        let launch = |e: io::Error| PrepError::tool(&cmd.step, ToolFailure::Launch(e));
        let mut child = command.spawn().map_err(launch)?;

        // drain both pipes so a chatty child never blocks on a full buffer
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + cmd.timeout;
        let status = loop {
            match child.try_wait().map_err(launch)? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(PrepError::tool(&cmd.step, ToolFailure::TimedOut(cmd.timeout)));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        // a background grandchild can keep the pipes open after exit
        let stdout = collect(stdout, deadline, cmd)?;
        let stderr = collect(stderr, deadline, cmd)?;
        debug!("{}: {} ({} bytes of output)", cmd.step, status, stdout.len());

        Ok(ToolOutput {
            success: status.success(),
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf),
            None => Ok(0),
        };
        // the receiver is gone once the caller gave up waiting
        let _ = tx.send(result.map(|_| buf));
    });
    rx
}

fn collect(
    rx: Receiver<io::Result<Vec<u8>>>,
    deadline: Instant,
    cmd: &ToolCommand,
) -> Result<Vec<u8>, PrepError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
        Ok(result) => result.map_err(|e| PrepError::tool(&cmd.step, ToolFailure::Launch(e))),
        Err(RecvTimeoutError::Timeout) => {
            Err(PrepError::tool(&cmd.step, ToolFailure::TimedOut(cmd.timeout)))
        }
        Err(RecvTimeoutError::Disconnected) => Err(PrepError::tool(
            &cmd.step,
            ToolFailure::Launch(io::Error::new(io::ErrorKind::Other, "pipe reader panicked")),
        )),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Write;

    const SECOND: Duration = Duration::from_secs(1);

    fn sh(script: &str, timeout: Duration) -> ToolCommand {
        ToolCommand::new("test step", "sh", timeout).arg("-c").arg(script)
    }

    #[test]
    fn captures_output_and_status() {
        let out = ProcessRunner
            .run(&sh("echo out; echo err >&2; exit 3", 10 * SECOND))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout, b"out\n");
        assert_eq!(out.stderr, b"err\n");

        match out.check("test step") {
            Err(PrepError::Tool { step, failure: ToolFailure::Exit { code, stderr } }) => {
                assert_eq!(step, "test step");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "err\n");
            }
            other => panic!("expected exit failure, got {:?}", other),
        }
    }

    #[test]
    fn feeds_stdin_from_file() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        write!(input, "0.5 rhostar\n").unwrap();
        let cmd = ToolCommand::new("cat", "cat", 10 * SECOND).stdin(input.path());
        let out = ProcessRunner.run(&cmd).unwrap().check("cat").unwrap();
        assert_eq!(out.stdout, b"0.5 rhostar\n");
    }

    #[test]
    fn runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = sh("pwd", 10 * SECOND).working_dir(dir.path());
        let out = ProcessRunner.run(&cmd).unwrap();
        let pwd = String::from_utf8(out.stdout).unwrap();
        assert_eq!(
            std::fs::canonicalize(pwd.trim()).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn large_output_does_not_deadlock() {
        let out = ProcessRunner
            .run(&sh("i=0; while [ $i -lt 20000 ]; do echo 0123456789; i=$((i+1)); done", 30 * SECOND))
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.len(), 20000 * 11);
    }

    #[test]
    fn overrunning_process_is_killed() {
        let started = Instant::now();
        let result = ProcessRunner.run(&sh("sleep 30", Duration::from_millis(200)));
        assert!(started.elapsed() < 10 * SECOND);
        match result {
            Err(PrepError::Tool { failure: ToolFailure::TimedOut(_), .. }) => {}
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn lingering_grandchild_cannot_outlast_the_timeout() {
        let started = Instant::now();
        let result = ProcessRunner.run(&sh("sleep 30 & echo started", Duration::from_millis(300)));
        assert!(started.elapsed() < 10 * SECOND);
        match result {
            Err(PrepError::Tool { failure: ToolFailure::TimedOut(_), .. }) => {}
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let cmd = ToolCommand::new("compile", "/nonexistent/md-polymer-compiler", SECOND);
        match ProcessRunner.run(&cmd) {
            Err(PrepError::Tool { step, failure: ToolFailure::Launch(_) }) => {
                assert_eq!(step, "compile")
            }
            other => panic!("expected launch failure, got {:?}", other),
        }
    }
}
