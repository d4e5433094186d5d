use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{DEFAULT_READ_TIMEOUT, ServerConfig, Settings};
use crate::content::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::content::resolver::{ResolutionMode, Resolver, TraversalPolicy};
use crate::error::ServerError;
use crate::server::listener;
use crate::server::pool::{WorkerLimit, WorkerPool};

const BIND_HOST: &str = "localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Running,
}

/// Everything about a server except where it listens and what it serves.
#[derive(Clone)]
pub struct ServerOptions {
    pub resolution: ResolutionMode,
    pub traversal: TraversalPolicy,
    pub workers: WorkerLimit,
    /// How long a connection may take to deliver its request line and headers.
    pub read_timeout: Duration,
    pub random: Arc<dyn RandomSource>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            resolution: ResolutionMode::default(),
            traversal: TraversalPolicy::default(),
            workers: WorkerLimit::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            random: Arc::new(ThreadRandom),
        }
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("resolution", &self.resolution)
            .field("traversal", &self.traversal)
            .field("workers", &self.workers)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl ServerOptions {
    pub fn new(resolution: ResolutionMode) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let random: Arc<dyn RandomSource> = match settings.content.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };

        Self {
            resolution: settings.content.resolution,
            traversal: settings.content.traversal,
            workers: settings.workers.worker_limit(),
            read_timeout: settings.server.read_timeout(),
            random,
        }
    }

    pub fn traversal(mut self, traversal: TraversalPolicy) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn workers(mut self, workers: WorkerLimit) -> Self {
        self.workers = workers;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }
}

struct Running {
    config: ServerConfig,
    local_addrs: Vec<SocketAddr>,
    pool: WorkerPool,
    shutdown: watch::Sender<bool>,
    accept_tasks: Vec<JoinHandle<()>>,
}

/// A server instance. All listener state lives here, so independent
/// instances can run side by side.
///
/// `start` and `stop` take `&mut self` and are therefore never concurrent.
/// Dropping a running server signals its accept loop to exit.
pub struct Server {
    options: ServerOptions,
    running: Option<Running>,
}

impl Server {
    pub fn new(options: ServerOptions) -> Self {
        Self {
            options,
            running: None,
        }
    }

    pub fn state(&self) -> ServerState {
        match self.running {
            Some(_) => ServerState::Running,
            None => ServerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServerState::Running
    }

    /// First bound address, in the order `localhost` resolved.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addrs().first().copied()
    }

    /// Every address the server listens on, one per `localhost` address.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        self.running.as_ref().map(|r| r.local_addrs.as_slice()).unwrap_or(&[])
    }

    pub fn config(&self) -> Option<&ServerConfig> {
        self.running.as_ref().map(|r| &r.config)
    }

    /// Connection tasks of the current run that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.running.as_ref().map_or(0, |r| r.pool.in_flight())
    }

    /// Validates `port` and `base_directory`, then starts serving.
    pub async fn start(
        &mut self,
        port: &str,
        base_directory: impl Into<PathBuf>,
    ) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyRunning);
        }
        let config = ServerConfig::new(port, base_directory)?;
        self.start_with(config).await
    }

    /// Binds every address `localhost` resolves to and spawns one accept
    /// loop per listener.
    ///
    /// Returns the first bound address once listening; the loops keep
    /// running until [`stop`](Self::stop). Addresses that cannot be bound
    /// (no IPv6 on the host, for one) are skipped as long as one succeeds.
    pub async fn start_with(&mut self, config: ServerConfig) -> Result<SocketAddr, ServerError> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let listeners = bind_localhost(config.port).await?;
        let local_addrs: Vec<SocketAddr> = listeners.iter().map(|(_, addr)| *addr).collect();

        if self.options.traversal == TraversalPolicy::Allow {
            warn!("Path traversal checks disabled; requests may read files outside the base directory");
        }

        let resolver = Arc::new(Resolver::new(
            config.base_directory.clone(),
            self.options.resolution,
            self.options.traversal,
            self.options.random.clone(),
        ));
        let pool = WorkerPool::new(self.options.workers);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let accept_tasks = listeners
            .into_iter()
            .map(|(tcp, _)| {
                tokio::spawn(listener::run(
                    tcp,
                    resolver.clone(),
                    pool.clone(),
                    self.options.read_timeout,
                    shutdown_rx.clone(),
                ))
            })
            .collect();

        info!(
            directory = %config.base_directory.display(),
            mode = %self.options.resolution,
            addrs = ?local_addrs,
            "Server started at http://localhost:{}/",
            local_addrs[0].port()
        );

        let first = local_addrs[0];
        self.running = Some(Running {
            config,
            local_addrs,
            pool,
            shutdown,
            accept_tasks,
        });

        Ok(first)
    }

    /// Stops accepting and releases the port. In-flight connections are
    /// left to finish on their own.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        let running = self.running.take().ok_or(ServerError::NotRunning)?;

        // Receiver gone means the loop already exited.
        let _ = running.shutdown.send(true);
        for task in running.accept_tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Accept loop ended abnormally");
            }
        }

        info!(in_flight = running.pool.in_flight(), "Server stopped");
        Ok(())
    }
}

/// Binds `port` on each distinct address `localhost` resolves to.
///
/// With port `0` the first listener picks the port and the rest reuse it.
async fn bind_localhost(port: u16) -> Result<Vec<(TcpListener, SocketAddr)>, ServerError> {
    let bind_error = move |source: io::Error| ServerError::Bind {
        addr: format!("{}:{}", BIND_HOST, port),
        source,
    };

    let mut candidates: Vec<SocketAddr> = Vec::new();
    for addr in tokio::net::lookup_host((BIND_HOST, port)).await.map_err(bind_error)? {
        if !candidates.contains(&addr) {
            candidates.push(addr);
        }
    }

    let mut bound = Vec::new();
    let mut last_error = None;
    let mut port = port;

    for mut addr in candidates {
        addr.set_port(port);
        match TcpListener::bind(addr).await.and_then(|tcp| {
            let local = tcp.local_addr()?;
            Ok((tcp, local))
        }) {
            Ok((tcp, local)) => {
                port = local.port();
                bound.push((tcp, local));
            }
            Err(e) => {
                warn!(addr = %addr, error = %e, "Skipping unbindable address");
                last_error = Some(e);
            }
        }
    }

    if bound.is_empty() {
        let source = last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "localhost did not resolve"));
        return Err(bind_error(source));
    }

    Ok(bound)
}
