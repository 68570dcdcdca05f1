//! The worker pool at the heart of the build pipeline. A fixed set of
//! threads consumes two kinds of jobs from rendezvous channels: "parse a
//! post" during phase 1 and "render a category page" during phase 2. The
//! zero-capacity channels give synchronous hand-off, so in-flight work is
//! bounded by the number of idle workers and the dispatcher gets
//! backpressure for free.
//!
//! One completion message is sent per finished job, success or failure;
//! [`Pool::wait`] receives a known count of them, which is the phase
//! barrier keeping category and index rendering from ever observing a
//! partially built [`Store`]. The first failure observed wins and is
//! propagated up to the pipeline's caller.

use crate::post::Post;
use crate::store::Store;
use crate::write::{self, Renderer};
use crossbeam_channel::{bounded, never, select, unbounded, Receiver, Sender};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A phase-1 unit of work: parse one source file into a [`Post`] and merge
/// it into the store.
pub struct ParseJob {
    /// The source file to read.
    pub path: PathBuf,

    /// The post's name: the source file's stem.
    pub name: String,

    /// The categories discovered for this file.
    pub categories: Vec<String>,
}

/// The default pool-sizing policy: one worker per CPU, capped at the job
/// count, never fewer than one.
pub fn default_workers(jobs: usize) -> usize {
    num_cpus::get().min(jobs).max(1)
}

/// A fixed-size set of worker threads. Workers are started once, live for
/// the whole run, and exit when the pool is dropped (the run-scoped
/// cancellation signal) or when both job channels close. There is no
/// resizing mid-run.
pub struct Pool {
    parse_tx: Sender<ParseJob>,
    render_tx: Sender<String>,
    done_rx: Receiver<Result<()>>,

    /// Never sent on. Dropping it disconnects the channel, which is the
    /// cancellation signal idle workers watch for; workers mid-job finish
    /// that unit first.
    cancel_tx: Option<Sender<()>>,

    handles: Vec<JoinHandle<()>>,
}

impl Pool {
    /// Starts `workers` threads, each selecting over the parse queue, the
    /// render queue, and the cancellation signal.
    pub fn spawn(workers: usize, store: Arc<Store>, renderer: Arc<Renderer>) -> Pool {
        let (parse_tx, parse_rx) = bounded::<ParseJob>(0);
        let (render_tx, render_rx) = bounded::<String>(0);
        let (done_tx, done_rx) = unbounded::<Result<()>>();
        let (cancel_tx, cancel_rx) = bounded::<()>(0);

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let parse_rx = parse_rx.clone();
            let render_rx = render_rx.clone();
            let cancel_rx = cancel_rx.clone();
            let done_tx = done_tx.clone();
            let store = store.clone();
            let renderer = renderer.clone();
            handles.push(thread::spawn(move || {
                worker(parse_rx, render_rx, cancel_rx, done_tx, store, renderer)
            }));
        }

        Pool {
            parse_tx,
            render_tx,
            done_rx,
            cancel_tx: Some(cancel_tx),
            handles,
        }
    }

    /// Hands a parse job to the next idle worker, blocking until one takes
    /// it.
    pub fn send_parse(&self, job: ParseJob) -> Result<()> {
        self.parse_tx.send(job).map_err(|_| Error::Disconnected)
    }

    /// Hands a category-render job to the next idle worker, blocking until
    /// one takes it.
    pub fn send_render(&self, category: String) -> Result<()> {
        self.render_tx.send(category).map_err(|_| Error::Disconnected)
    }

    /// The phase barrier: blocks until `count` jobs have completed, success
    /// or failure. Returns the first failure immediately; the remaining
    /// completions are abandoned and dropping the pool cancels the workers.
    pub fn wait(&self, count: usize) -> Result<()> {
        for _ in 0..count {
            match self.done_rx.recv() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(err),
                Err(_) => return Err(Error::Disconnected),
            }
        }
        Ok(())
    }
}

impl Drop for Pool {
    /// Raises the cancellation signal and waits for every worker to exit.
    fn drop(&mut self) {
        self.cancel_tx.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// The body of one worker thread. Consumes from whichever job channel has
/// ready work; a disconnected job channel is replaced with [`never`] so the
/// select stops considering it. Exits on cancellation or once both job
/// channels are gone.
fn worker(
    parse_rx: Receiver<ParseJob>,
    render_rx: Receiver<String>,
    cancel_rx: Receiver<()>,
    done_tx: Sender<Result<()>>,
    store: Arc<Store>,
    renderer: Arc<Renderer>,
) {
    let mut parse_rx = parse_rx;
    let mut render_rx = render_rx;
    let mut parse_open = true;
    let mut render_open = true;
    while parse_open || render_open {
        select! {
            recv(cancel_rx) -> _ => return,
            recv(parse_rx) -> msg => match msg {
                Ok(job) => {
                    // A failed send means the dispatcher already tore the
                    // pipeline down; the result has nowhere to go.
                    let _ = done_tx.send(run_parse(job, &store));
                }
                Err(_) => {
                    parse_rx = never();
                    parse_open = false;
                }
            },
            recv(render_rx) -> msg => match msg {
                Ok(category) => {
                    let _ = done_tx.send(run_render(&category, &store, &renderer));
                }
                Err(_) => {
                    render_rx = never();
                    render_open = false;
                }
            },
        }
    }
}

/// Executes one parse job: read the source file, convert it, merge the
/// resulting [`Post`] into the store.
fn run_parse(job: ParseJob, store: &Store) -> Result<()> {
    let raw = std::fs::read_to_string(&job.path).map_err(|err| Error::ReadSource {
        path: job.path.clone(),
        err,
    })?;
    store.add_post(Post::from_markdown(&job.name, &raw, job.categories));
    Ok(())
}

/// Executes one render job: snapshot the category's posts from the (frozen)
/// store and write its page.
fn run_render(category: &str, store: &Store, renderer: &Renderer) -> Result<()> {
    renderer.render_category(category, &store.category(category))?;
    Ok(())
}

/// The result of a fallible pool operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error executing a job, or a torn-down pool.
#[derive(Debug)]
pub enum Error {
    /// Returned when a source file can't be read.
    ReadSource { path: PathBuf, err: io::Error },

    /// Returned when rendering a category page fails.
    Render(write::Error),

    /// Returned when the pool's channels are gone, i.e. the run was already
    /// cancelled.
    Disconnected,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadSource { path, err } => {
                write!(f, "Reading '{}': {}", path.display(), err)
            }
            Error::Render(err) => err.fmt(f),
            Error::Disconnected => write!(f, "Worker pool disconnected"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadSource { path: _, err } => Some(err),
            Error::Render(err) => Some(err),
            Error::Disconnected => None,
        }
    }
}

impl From<write::Error> for Error {
    /// Converts a [`write::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator in render jobs.
    fn from(err: write::Error) -> Error {
        Error::Render(err)
    }
}
