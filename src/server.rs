//! Development server for the dist tree.
//!
//! Static files are served with `tiny_http`. HTML responses get a script
//! that listens on a Server-Sent-Events endpoint and reloads the page
//! whenever anything under the served directory changes.
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use percent_encoding::percent_decode_str;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::error::ServeError;
use crate::logging::Log;

/// Path of the live-reload event stream.
pub const LIVERELOAD_PATH: &str = "/__gsdl/livereload";

const LIVERELOAD_SNIPPET: &str = "<script>new EventSource(\"/__gsdl/livereload\").onmessage=function(){location.reload()};</script>";

const EVENT_STREAM_HEAD: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: keep-alive\r\n\r\n: connected\n\n";

type EventSink = Box<dyn Write + Send>;

/// Connected live-reload clients.
#[derive(Default)]
struct ReloadHub {
    clients: Mutex<Vec<EventSink>>,
}

impl ReloadHub {
    fn add(&self, sink: EventSink) {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    /// Send `reload` to every client, dropping the ones that went away.
    fn broadcast(&self) -> usize {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        clients.retain_mut(|c| c.write_all(b"data: reload\n\n").and_then(|()| c.flush()).is_ok());
        clients.len()
    }
}

/// Options for [`start`].
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Directory to serve.
    pub root: PathBuf,
    /// Port to bind on localhost; `0` picks a free one.
    pub port: u16,
    /// Inject the reload script and watch `root`.
    pub livereload: bool,
    /// Debounce window for change notifications.
    pub debounce: Duration,
}

/// A running server. Dropping the handle stops it.
pub struct ServerHandle {
    addr: SocketAddr,
    server: Arc<Server>,
    hub: Arc<ReloadHub>,
    watcher: Option<Debouncer<RecommendedWatcher>>,
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("addr", &self.addr)
            .field("livereload", &self.watcher.is_some())
            .finish_non_exhaustive()
    }
}

impl ServerHandle {
    /// Address the server is listening on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Tell every connected page to reload. Returns how many were reached.
    pub fn notify_reload(&self) -> usize {
        self.hub.broadcast()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

/// Bind the server and start answering requests.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or, with live reload on,
/// `root` cannot be watched.
pub fn start(opts: ServeOptions, log: Arc<dyn Log>) -> Result<ServerHandle, ServeError> {
    let requested = format!("127.0.0.1:{}", opts.port);
    let bind_error = |source: std::io::Error| ServeError::Bind {
        addr: requested.clone(),
        source,
    };
    let server = Server::http(requested.as_str()).map_err(|e| bind_error(std::io::Error::other(e)))?;
    let addr = server.server_addr().to_ip().ok_or_else(|| {
        bind_error(std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            "not an IP listener",
        ))
    })?;
    let server = Arc::new(server);

    let hub = Arc::new(ReloadHub::default());
    let watcher = if opts.livereload {
        Some(watch_root(&opts.root, opts.debounce, Arc::clone(&hub))?)
    } else {
        None
    };

    log.info(&format!("serving {} at http://{addr}/", opts.root.display()));

    let accept = Arc::clone(&server);
    let accept_hub = Arc::clone(&hub);
    let root = opts.root;
    let livereload = opts.livereload;
    std::thread::spawn(move || {
        for request in accept.incoming_requests() {
            let root = root.clone();
            let hub = Arc::clone(&accept_hub);
            let log = Arc::clone(&log);
            std::thread::spawn(move || {
                let url = request.url().to_string();
                if let Err(e) = handle(request, &root, livereload, &hub) {
                    log.debug(&format!("{url}: {e}"));
                }
            });
        }
    });

    Ok(ServerHandle {
        addr,
        server,
        hub,
        watcher,
    })
}

fn watch_root(root: &Path, debounce: Duration, hub: Arc<ReloadHub>) -> Result<Debouncer<RecommendedWatcher>, ServeError> {
    std::fs::create_dir_all(root).map_err(|e| ServeError::Watch(format!("{}: {e}", root.display())))?;
    let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
        if result.is_ok_and(|events| !events.is_empty()) {
            hub.broadcast();
        }
    })
    .map_err(|e| ServeError::Watch(e.to_string()))?;
    debouncer
        .watcher()
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| ServeError::Watch(format!("{}: {e}", root.display())))?;
    Ok(debouncer)
}

/// Decoded path of a request target, without query or fragment.
fn url_path(target: &str) -> String {
    let path = target.split(['?', '#']).next().unwrap_or("/");
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// File under `root` that serves `url_path`, if any.
fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for component in Path::new(url_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if path.is_dir() {
        path.push("index.html");
    }
    path.is_file().then_some(path)
}

fn inject_livereload(html: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(html);
    match text.rfind("</body>") {
        Some(at) => format!("{}{LIVERELOAD_SNIPPET}{}", &text[..at], &text[at..]).into_bytes(),
        None => format!("{text}{LIVERELOAD_SNIPPET}").into_bytes(),
    }
}

fn with_headers<R: Read>(mut response: Response<R>, headers: &[(&str, &str)]) -> Response<R> {
    for (name, value) in headers {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }
    response
}

fn plain(status: u16, body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    with_headers(
        Response::from_string(body).with_status_code(status),
        &[("Content-Type", "text/plain; charset=utf-8")],
    )
}

fn handle(request: Request, root: &Path, livereload: bool, hub: &ReloadHub) -> std::io::Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return request.respond(plain(405, "method not allowed"));
    }
    let path = url_path(request.url());

    if livereload && path == LIVERELOAD_PATH {
        let mut sink = request.into_writer();
        sink.write_all(EVENT_STREAM_HEAD)?;
        sink.flush()?;
        hub.add(sink);
        return Ok(());
    }

    let Some(file) = resolve(root, &path) else {
        return request.respond(plain(404, "not found"));
    };
    let body = std::fs::read(&file)?;
    let mime = mime_guess::from_path(&file).first_or_octet_stream();
    let body = if livereload && mime == mime_guess::mime::TEXT_HTML {
        inject_livereload(&body)
    } else {
        body
    };
    request.respond(with_headers(
        Response::from_data(body),
        &[("Content-Type", mime.as_ref()), ("Cache-Control", "no-cache")],
    ))
}
