use crate::logger::*;
use nanoid::nanoid;
use std::path::PathBuf;
use std::process::ExitStatus;
use tokio::process::Command;
use tokio::task::JoinSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerExit {
    pub index: usize,
    pub pid: Option<u32>,
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl WorkerExit {
    fn new(index: usize, pid: Option<u32>, status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        WorkerExit {
            index,
            pid,
            code: status.code(),
            signal,
        }
    }
}

/// Starts `workers` copies of `program`, each with `--worker <index>`
/// appended to `args`, and waits for all of them. Nothing is restarted.
pub struct Supervisor {
    program: PathBuf,
    args: Vec<String>,
    workers: usize,
    run_id: String,
}

impl Supervisor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, workers: usize) -> Self {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        Supervisor {
            program: program.into(),
            args,
            workers,
            run_id: nanoid!(10, &alphabet),
        }
    }

    fn command(&self, index: usize) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--worker")
            .arg(index.to_string())
            .arg("--run-id")
            .arg(&self.run_id);
        command
    }

    /// Returns once every started worker has exited. Workers that fail to
    /// start are logged and left out.
    pub async fn run(&self) -> Vec<WorkerExit> {
        info!(
            pid = std::process::id(),
            run_id = %self.run_id,
            workers = self.workers,
            "supervisor is running"
        );

        let mut running = JoinSet::new();
        for index in 0..self.workers {
            let mut child = match self.command(index).spawn() {
                Ok(child) => child,
                Err(e) => {
                    error!(index, error = %e, "failed to start worker");
                    continue;
                }
            };
            let pid = child.id();
            debug!(index, ?pid, "worker started");
            running.spawn(async move { (index, pid, child.wait().await) });
        }

        let mut exits = Vec::with_capacity(self.workers);
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok((index, pid, Ok(status))) => {
                    let exit = WorkerExit::new(index, pid, status);
                    info!(
                        index,
                        ?pid,
                        code = ?exit.code,
                        signal = ?exit.signal,
                        "worker died"
                    );
                    exits.push(exit);
                }
                Ok((index, pid, Err(e))) => {
                    error!(index, ?pid, error = %e, "lost track of worker");
                }
                Err(e) => error!(error = %e, "worker wait task failed"),
            }
        }
        exits.sort_by_key(|exit| exit.index);
        exits
    }
}
