use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Server state the mock answers for.
#[derive(Debug, Clone, Copy)]
pub enum Fixtures {
    /// Freshly installed server: passes every baseline check.
    Baseline,
    /// Server after `setup`: the run sequence finds its organization.
    Populated,
}

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a minimal XML-RPC server answering the benchmark's procedures.
/// Returns the `host:port` to pass as the hostname argument.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_rpc_server(fixtures: Fixtures) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || handle_client(stream, fixtures));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        addr.to_string(),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
        },
    ))
}

fn handle_client(mut stream: TcpStream, fixtures: Fixtures) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    loop {
        let Some(request) = read_request(&mut stream) else {
            break;
        };
        let body = match method_name(&request) {
            Some(method) => respond(fixtures, &method),
            None => fault(-1, "no methodName"),
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        if stream.write_all(response.as_bytes()).is_err() || stream.flush().is_err() {
            break;
        }
    }
    drop(stream.shutdown(Shutdown::Both));
}

/// Reads one request (headers plus `Content-Length` body). `None` once the
/// client closes the connection.
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(end) = find(&data, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(data.get(..end)?).into_owned();
            let length = content_length(&head)?;
            let body_start = end.checked_add(4)?;
            let total = body_start.checked_add(length)?;
            while data.len() < total {
                let read = stream.read(&mut chunk).ok()?;
                if read == 0 {
                    return None;
                }
                data.extend_from_slice(chunk.get(..read)?);
            }
            return Some(String::from_utf8_lossy(data.get(body_start..total)?).into_owned());
        }
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        data.extend_from_slice(chunk.get(..read)?);
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn content_length(head: &str) -> Option<usize> {
    head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn method_name(body: &str) -> Option<String> {
    let start = body.find("<methodName>")?.checked_add("<methodName>".len())?;
    let end = body.find("</methodName>")?;
    body.get(start..end).map(|name| name.trim().to_owned())
}

fn respond(fixtures: Fixtures, method: &str) -> String {
    let value = match (fixtures, method) {
        (_, "auth.login") => string("test-session-key"),
        (_, "auth.logout") => "<int>1</int>".to_owned(),
        (Fixtures::Baseline, "org.listOrgs") => {
            array(&[member_struct(&[("id", int(1)), ("name", string("Default Organization"))])])
        }
        (_, "org.listSystemEntitlements") => array(&[member_struct(&[
            ("label", string("enterprise_entitled")),
            ("used", int(0)),
            ("allocated", int(0)),
            ("free", int(150)),
        ])]),
        (Fixtures::Baseline, "user.listUsers") => {
            array(&[member_struct(&[("login", string("admin"))])])
        }
        (Fixtures::Baseline, "channel.listAllChannels" | "system.listSystems") => array(&[]),
        (Fixtures::Populated, "org.listOrgs") => array(&[
            member_struct(&[("id", int(1)), ("name", string("Default Organization"))]),
            member_struct(&[("id", int(2)), ("name", string("benchmark-org-0"))]),
        ]),
        (Fixtures::Populated, "user.listUsers") => array(&[
            member_struct(&[("login", string("benchmark-org-0-admin"))]),
            member_struct(&[("login", string("benchmark-org-0-user-0"))]),
        ]),
        (Fixtures::Populated, "channel.listSoftwareChannels") => array(&[member_struct(&[(
            "label",
            string("benchmark-org-0-channel-0"),
        )])]),
        (Fixtures::Populated, "channel.software.listAllPackages") => {
            array(&[member_struct(&[("id", int(501))])])
        }
        (Fixtures::Populated, "channel.software.listErrata") => array(&[member_struct(&[(
            "advisory_name",
            string("benchmark-org-0-channel-0-package-0"),
        )])]),
        (
            Fixtures::Populated,
            "org.listSoftwareEntitlements" | "org.listUsers" | "system.listSystems",
        ) => array(&[]),
        (
            Fixtures::Populated,
            "org.getDetails"
            | "user.getDetails"
            | "channel.software.getDetails"
            | "packages.getDetails"
            | "errata.getDetails",
        ) => member_struct(&[("name", string("detail"))]),
        (Fixtures::Baseline | Fixtures::Populated, other) => {
            return fault(-1, &format!("Could not find method {}", other));
        }
    };
    format!(
        "<?xml version=\"1.0\"?><methodResponse><params><param><value>{}</value></param></params></methodResponse>",
        value
    )
}

fn fault(code: i64, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodResponse><fault><value>{}</value></fault></methodResponse>",
        member_struct(&[("faultCode", int(code)), ("faultString", string(message))])
    )
}

fn string(value: &str) -> String {
    format!("<string>{}</string>", value)
}

fn int(value: i64) -> String {
    format!("<i4>{}</i4>", value)
}

fn array(values: &[String]) -> String {
    let items: String = values
        .iter()
        .map(|value| format!("<value>{}</value>", value))
        .collect();
    format!("<array><data>{}</data></array>", items)
}

fn member_struct(members: &[(&str, String)]) -> String {
    let items: String = members
        .iter()
        .map(|(name, value)| {
            format!("<member><name>{}</name><value>{}</value></member>", name, value)
        })
        .collect();
    format!("<struct>{}</struct>", items)
}

/// Run the `satbench` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_satbench<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = satbench_bin()?;
    Command::new(bin)
        .args(args)
        .current_dir(std::env::temp_dir())
        .env("RUST_LOG", "error")
        .env_remove("SATBENCH_LOG")
        .env_remove("SATBENCH_CONFIG")
        .output()
        .map_err(|err| format!("run satbench failed: {}", err))
}

fn satbench_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_satbench").map_or_else(
        || Err("CARGO_BIN_EXE_satbench missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
