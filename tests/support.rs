use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ServerHandle {
    /// Requests received so far, in arrival order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request log lock is poisoned.
    pub fn requests(&self) -> Result<Vec<String>, String> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .map_err(|err| format!("request log poisoned: {}", err))
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a tiny HTTP server that answers every request with `response`.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server(response: &'static str) -> Result<(SocketAddr, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let seen = Arc::clone(&seen);
                    thread::spawn(move || handle_client(stream, response, &seen));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        addr,
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
            requests,
        },
    ))
}

/// Spawn a test server or skip when socket permissions are unavailable.
///
/// # Errors
///
/// Returns an error if the server fails for reasons other than insufficient
/// socket permissions.
pub fn spawn_http_server_or_skip(
    response: &'static str,
) -> Result<Option<(SocketAddr, ServerHandle)>, String> {
    match spawn_http_server(response) {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.contains("Operation not permitted") => {
            eprintln!("Skipping e2e test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn handle_client(mut stream: TcpStream, response: &str, seen: &Mutex<Vec<String>>) {
    drop(stream.set_nonblocking(false));
    drop(stream.set_read_timeout(Some(Duration::from_secs(2))));
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(buf.get(..n).unwrap_or_default()),
        }
    }
    if let Ok(mut guard) = seen.lock() {
        guard.push(String::from_utf8_lossy(&request).into_owned());
    }
    drop(stream.write_all(response.as_bytes()));
    drop(stream.shutdown(Shutdown::Both));
}

/// Run the `cxbench` binary with `stdin` as the query corpus.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_cxbench<I, S>(args: I, stdin: &str) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = cxbench_bin()?;
    let mut child = Command::new(bin)
        .args(args)
        .env("CXBENCH_LOG", "info")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| format!("run cxbench failed: {}", err))?;
    if let Some(mut input) = child.stdin.take() {
        match input.write_all(stdin.as_bytes()) {
            // The child may exit (e.g. on argument errors) before reading stdin.
            Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
            other => other.map_err(|err| format!("write stdin failed: {}", err))?,
        }
    }
    child
        .wait_with_output()
        .map_err(|err| format!("wait cxbench failed: {}", err))
}

fn cxbench_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_cxbench").map_or_else(
        || Err("CARGO_BIN_EXE_cxbench missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
