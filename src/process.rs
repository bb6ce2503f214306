//! External programs speaking JSON over stdio.
//!
//! Both the parser and the store can be a program that reads one request
//! on stdin and writes its answer to stdout.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::ProcessError;

/// Run `program` once with `input` on stdin and return its stdout.
///
/// The child is always waited for, also when writing the request fails, and
/// is killed if the returned future is dropped first. A non-zero exit wins
/// over a write failure since it usually explains it.
pub(crate) async fn exchange(
    program: &Path,
    args: &[String],
    input: &[u8],
) -> Result<Vec<u8>, ProcessError> {
    let name = || program.display().to_string();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: name(),
            source,
        })?;

    let stdin = child.stdin.take();
    let write = async move {
        match stdin {
            // Dropping stdin afterwards closes it, so the child sees EOF.
            Some(mut stdin) => stdin.write_all(input).await,
            None => Ok(()),
        }
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());

    let output = output.map_err(|source| ProcessError::Wait {
        program: name(),
        source,
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::debug!(program = %name(), status = %output.status, "external program failed");
        return Err(ProcessError::Exit {
            program: name(),
            stderr,
        });
    }
    written.map_err(|source| ProcessError::Write {
        program: name(),
        source,
    })?;
    Ok(output.stdout)
}
