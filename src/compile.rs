use std::{
    ffi::OsStr,
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] io::Error),
    #[error("compilation failed ({status})")]
    Compilation {
        status: ExitStatus,
        stderr: Option<String>,
    },
    #[error("process exited unsuccessfully ({0})")]
    Exit(ExitStatus),
    #[error("process killed after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Runs `compiler` with `arguments` to completion. Stderr is kept for
/// diagnostics when the compiler fails.
pub fn compile<S: AsRef<OsStr>>(
    compiler: &str,
    arguments: impl IntoIterator<Item = S>,
    timeout: Option<Duration>,
) -> Result<(), Error> {
    let mut stderr = tempfile::tempfile()?;
    let mut child = Command::new(compiler)
        .args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(stderr.try_clone()?))
        .spawn()
        .map_err(Error::Spawn)?;

    let status = wait(&mut child, timeout)?;
    if status.success() {
        return Ok(());
    }

    Err(Error::Compilation {
        status,
        stderr: read_back(&mut stderr),
    })
}

/// Runs `binary` without arguments and returns the wall-clock time from just
/// before spawning to just after exit.
pub fn execute(binary: &Path, timeout: Option<Duration>) -> Result<Duration, Error> {
    let mut command = Command::new(binary);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let start = Instant::now();
    let mut child = command.spawn().map_err(Error::Spawn)?;
    let status = wait(&mut child, timeout)?;
    let elapsed = start.elapsed();

    if status.success() {
        Ok(elapsed)
    } else {
        Err(Error::Exit(status))
    }
}

fn read_back(file: &mut File) -> Option<String> {
    let mut buffer = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut buffer).ok()?;
    if buffer.is_empty() { None } else { Some(buffer) }
}

/// Waits for `child`, killing it once `timeout` elapses. The child is always
/// reaped before returning.
fn wait(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus, Error> {
    let Some(timeout) = timeout else {
        return Ok(child.wait()?);
    };

    let pid = child.id();
    let (done, finished) = mpsc::channel::<()>();
    let watchdog = thread::spawn(move || match finished.recv_timeout(timeout) {
        Err(RecvTimeoutError::Timeout) => {
            kill(pid);
            true
        }
        _ => false,
    });

    // The child stays a zombie until reaped below, so the watchdog can never
    // signal a recycled pid.
    let exited = wait_exited(child);
    let _ = done.send(());
    let killed = watchdog.join().unwrap_or(false);
    if exited.is_err() {
        let _ = child.kill();
    }
    let status = child.wait()?;
    exited?;

    if killed {
        return Err(Error::Timeout(timeout));
    }
    Ok(status)
}

#[cfg(unix)]
fn kill(pid: u32) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGKILL);
    }
}

#[cfg(unix)]
fn wait_exited(child: &Child) -> io::Result<()> {
    loop {
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        let result = unsafe {
            libc::waitid(
                libc::P_PID,
                child.id() as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if result == 0 {
            return Ok(());
        }
        let error = io::Error::last_os_error();
        if error.kind() != io::ErrorKind::Interrupted {
            return Err(error);
        }
    }
}

#[cfg(not(unix))]
fn kill(_pid: u32) {}

#[cfg(not(unix))]
fn wait_exited(_child: &Child) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "timeouts require a unix host",
    ))
}
