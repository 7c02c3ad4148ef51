use may::coroutine::JoinHandle;
use may_minihttp::{HttpServerWithHeaders, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

/// Max request headers accepted; sized for traffic behind gateways and
/// proxies.
pub const MAX_HEADERS: usize = 32;

/// Wrapper around may_minihttp's HTTP server
///
/// Starts any [`HttpService`] (normally [`AppService`](super::AppService))
/// with [`MAX_HEADERS`] header slots per request.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
///
/// Knows the bound address, so tests started on port `0` can connect. Stop
/// it with [`stop`](Self::stop) or block on it with [`join`](Self::join).
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is listening on, with the real port when it was
    /// started on port `0`.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to accept connections
    ///
    /// Polls the listen address with TCP connects, 50 attempts 5ms apart.
    ///
    /// # Returns
    ///
    /// `Ok(())` once a connection succeeds
    ///
    /// # Errors
    ///
    /// `TimedOut` if no connection succeeds within roughly 250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop the server
    ///
    /// Cancels the accept coroutine and waits for it to finish. Consumes the
    /// handle.
    pub fn stop(self) {
        // SAFETY: cancel is unsafe in may because a cancelled coroutine
        // unwinds at its next yield point. The accept loop holds no locks or
        // borrowed state across yields, and the handle is still owned here.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the server coroutine exits
    ///
    /// The server runs until stopped from elsewhere (a signal handler in
    /// `actionwire serve`).
    ///
    /// # Errors
    ///
    /// The panic payload if the server coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Start the HTTP server on the given address
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to bind, e.g. `"127.0.0.1:8080"`. Port `0` picks a
    ///   free port; [`ServerHandle::addr`] reports the one chosen.
    ///
    /// # Returns
    ///
    /// A [`ServerHandle`] for the running server
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `addr` resolves to nothing, or the bind error if the
    /// port cannot be taken.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let mut addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        if addr.port() == 0 {
            // may_minihttp does not report the bound port; reserve one first
            let listener = std::net::TcpListener::bind(addr)?;
            addr = listener.local_addr()?;
        }
        let handle = HttpServerWithHeaders::<_, MAX_HEADERS>(self.0).start(addr)?;
        Ok(ServerHandle { addr, handle })
    }
}
