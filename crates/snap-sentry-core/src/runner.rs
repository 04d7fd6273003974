use crate::error::Error;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::thread;
use tracing::{debug, info, warn};

/// Invokes the RAID tool and returns its stdout lines.
pub trait SyncTool: Send + Sync {
    /// Run `command` with extra `--key value` arguments. Exit status 0 and
    /// every status in `allowed_status` count as success.
    fn run(
        &self,
        command: &str,
        args: &[(&str, &str)],
        allowed_status: &[i32],
    ) -> Result<Vec<String>, Error>;
}

pub struct SnapraidRunner {
    binary: String,
    config_path: String,
}

impl SnapraidRunner {
    pub fn new(binary: &str, config_path: &str) -> Self {
        Self {
            binary: binary.to_string(),
            config_path: config_path.to_string(),
        }
    }
}

impl SyncTool for SnapraidRunner {
    fn run(
        &self,
        command: &str,
        args: &[(&str, &str)],
        allowed_status: &[i32],
    ) -> Result<Vec<String>, Error> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(command)
            .args(["--conf", self.config_path.as_str(), "--quiet"]);
        for (key, value) in args {
            cmd.arg(format!("--{}", key)).arg(value);
        }
        debug!("Running {:?}", cmd);

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Other("child stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Other("child stderr not captured".to_string()))?;

        // Both pipes are drained to EOF before waiting, so a full stderr
        // buffer can never block the child.
        let (out_lines, err_result) = thread::scope(|scope| {
            let err_reader = scope.spawn(|| {
                drain_lines(stderr, |line| {
                    info!(target: "snap_sentry::tool::stderr", "{}", line)
                })
            });
            let out_lines = drain_lines(stdout, |line| {
                debug!(target: "snap_sentry::tool::stdout", "{}", line)
            });
            let err_result = err_reader
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stderr reader panicked")));
            (out_lines, err_result)
        });
        let drained = out_lines.and_then(|lines| err_result.map(|_| lines));
        let out_lines = reap_on_error(&mut child, drained)?;

        let status = child.wait()?;
        match status.code() {
            Some(code) if code == 0 || allowed_status.contains(&code) => Ok(out_lines),
            Some(code) => Err(Error::ToolFailed {
                command: command.to_string(),
                status: code,
            }),
            None => Err(Error::ToolKilled {
                command: command.to_string(),
            }),
        }
    }
}

/// On a read failure the child is killed and waited on before the error is
/// returned, so it never lingers as a zombie.
fn reap_on_error<T>(child: &mut Child, result: std::io::Result<T>) -> Result<T, Error> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!("Failed reading snapraid output, stopping it: {}", err);
            let _ = child.kill();
            let _ = child.wait();
            Err(err.into())
        }
    }
}

/// Read `reader` to EOF, decoding each line lossily and handing it to
/// `log` before collecting it.
fn drain_lines<R: Read>(reader: R, log: impl Fn(&str)) -> std::io::Result<Vec<String>> {
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        log(line);
        lines.push(line.to_string());
    }
    Ok(lines)
}
