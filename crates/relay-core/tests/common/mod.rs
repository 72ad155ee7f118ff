//! In-process IMAP server for integration tests.
//!
//! Speaks just enough IMAP4rev1 over `tokio::io::duplex` to exercise the
//! session manager and mailbox repository: LOGIN, SELECT/EXAMINE, UID
//! SEARCH/FETCH/STORE/COPY/MOVE/EXPUNGE, EXPUNGE and LOGOUT.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use relay_core::session::BoxedStream;
use relay_core::{AccountSpec, Connector, ProviderKind, Relay, Settings, storage};
use relay_core::vault::MemoryKeyStore;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

pub const USER: &str = "me@corp.example";
pub const PASSWORD: &str = "hunter2";

/// One stored message.
#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub uid: u32,
    pub flags: Vec<String>,
    pub raw: Vec<u8>,
    pub internal_date: String,
}

impl FakeMessage {
    fn header(&self) -> &[u8] {
        let end = self
            .raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .map_or(self.raw.len(), |i| i + 4);
        &self.raw[..end]
    }

    fn text(&self) -> &[u8] {
        &self.raw[self.header().len()..]
    }

    fn message_id(&self) -> Option<String> {
        String::from_utf8_lossy(self.header())
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("Message-ID")
                    .then(|| value.trim().to_string())
            })
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }
}

#[derive(Debug)]
pub struct Folder {
    pub uid_validity: u32,
    pub uid_next: u32,
    pub messages: Vec<FakeMessage>,
}

impl Folder {
    fn new(uid_validity: u32) -> Self {
        Self {
            uid_validity,
            uid_next: 1,
            messages: Vec::new(),
        }
    }

    fn append(&mut self, mut message: FakeMessage) -> u32 {
        let uid = self.uid_next;
        self.uid_next += 1;
        message.uid = uid;
        self.messages.push(message);
        uid
    }
}

#[derive(Debug)]
pub struct State {
    pub folders: HashMap<String, Folder>,
    pub capabilities: Vec<&'static str>,
    /// Every command line received, without tags.
    pub commands: Vec<String>,
}

/// A fake server; also the connector that dials it.
#[derive(Clone)]
pub struct FakeServer {
    pub state: Arc<Mutex<State>>,
    pub connections: Arc<AtomicUsize>,
}

impl FakeServer {
    /// A server with `INBOX`, `Trash` and `Junk`.
    pub fn new(capabilities: &[&'static str]) -> Self {
        let mut folders = HashMap::new();
        folders.insert("INBOX".to_string(), Folder::new(100));
        folders.insert("Trash".to_string(), Folder::new(200));
        folders.insert("Junk".to_string(), Folder::new(300));
        Self {
            state: Arc::new(Mutex::new(State {
                folders,
                capabilities: capabilities.to_vec(),
                commands: Vec::new(),
            })),
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Appends a message to `folder`, returning its UID.
    pub fn add(&self, folder: &str, raw: &str, seen: bool) -> u32 {
        let flags = if seen {
            vec!["\\Seen".to_string()]
        } else {
            Vec::new()
        };
        self.state
            .lock()
            .unwrap()
            .folders
            .get_mut(folder)
            .unwrap()
            .append(FakeMessage {
                uid: 0,
                flags,
                raw: raw.replace('\n', "\r\n").into_bytes(),
                internal_date: "17-Jul-2024 02:44:25 +0000".to_string(),
            })
    }

    pub fn flags(&self, folder: &str, uid: u32) -> Option<Vec<String>> {
        let state = self.state.lock().unwrap();
        state.folders[folder]
            .messages
            .iter()
            .find(|m| m.uid == uid)
            .map(|m| m.flags.clone())
    }

    pub fn uids(&self, folder: &str) -> Vec<u32> {
        let state = self.state.lock().unwrap();
        state.folders[folder].messages.iter().map(|m| m.uid).collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeServer {
    async fn connect(&self, _host: &str, _port: u16) -> relay_imap::Result<BoxedStream> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        let (client, server) = tokio::io::duplex(256 * 1024);
        tokio::spawn(serve(server, Arc::clone(&self.state)));
        Ok(Box::new(client))
    }
}

/// A relay context on in-memory storage, with account `work` registered
/// against `server`.
pub async fn relay(server: &FakeServer) -> Relay {
    let pool = storage::in_memory().await.unwrap();
    let relay = Relay::assemble(
        Settings::default(),
        pool,
        Arc::new(MemoryKeyStore::new()),
        Arc::new(server.clone()),
    )
    .await
    .unwrap();
    relay
        .accounts()
        .add(
            AccountSpec::new("work", USER)
                .with_provider(ProviderKind::Custom)
                .with_server("imap.corp.example", None),
            PASSWORD,
        )
        .await
        .unwrap();
    relay
}

/// Splits on spaces outside double quotes, unquoting as it goes.
fn tokens(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for c in line.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if quoted && c == '\\' {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        } else if c == ' ' && !quoted {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn uid_set(set: &str) -> Vec<u32> {
    set.split(',')
        .flat_map(|part| match part.split_once(':') {
            Some((a, b)) => {
                let (a, b): (u32, u32) = (a.parse().unwrap(), b.parse().unwrap());
                (a.min(b)..=a.max(b)).collect::<Vec<_>>()
            }
            None => vec![part.parse().unwrap()],
        })
        .collect()
}

fn literal(name: &str, data: &[u8]) -> Vec<u8> {
    let mut out = format!("{name} {{{}}}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out
}

fn fetch_item(message: &FakeMessage, attributes: &str) -> Vec<u8> {
    let upper = attributes.to_ascii_uppercase();
    let mut parts: Vec<Vec<u8>> = vec![format!("UID {}", message.uid).into_bytes()];
    if upper.contains("FLAGS") {
        parts.push(format!("FLAGS ({})", message.flags.join(" ")).into_bytes());
    }
    if upper.contains("INTERNALDATE") {
        parts.push(format!("INTERNALDATE \"{}\"", message.internal_date).into_bytes());
    }
    if upper.contains("RFC822.SIZE") {
        parts.push(format!("RFC822.SIZE {}", message.raw.len()).into_bytes());
    }
    if upper.contains("BODY.PEEK[HEADER]") {
        parts.push(literal("BODY[HEADER]", message.header()));
    }
    if let Some(start) = upper.find("BODY.PEEK[TEXT]<0.") {
        let rest = &upper[start + "BODY.PEEK[TEXT]<0.".len()..];
        let len: usize = rest[..rest.find('>').unwrap()].parse().unwrap();
        let text = message.text();
        parts.push(literal("BODY[TEXT]<0>", &text[..text.len().min(len)]));
    }
    if upper.contains("BODY.PEEK[]") {
        parts.push(literal("BODY[]", &message.raw));
    }
    if upper.contains("HEADER.FIELDS (MESSAGE-ID)") {
        let field = message
            .message_id()
            .map(|id| format!("Message-ID: {id}\r\n\r\n"))
            .unwrap_or_else(|| "\r\n".to_string());
        parts.push(literal("BODY[HEADER.FIELDS (MESSAGE-ID)]", field.as_bytes()));
    }
    parts.join(&b' ')
}

fn capability_list(state: &State) -> String {
    std::iter::once("IMAP4rev1")
        .chain(state.capabilities.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

async fn serve(stream: DuplexStream, state: Arc<Mutex<State>>) {
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();
    let greeting = {
        let caps = capability_list(&state.lock().unwrap());
        format!("* OK [CAPABILITY {caps}] fake ready\r\n")
    };
    if write.write_all(greeting.as_bytes()).await.is_err() {
        return;
    }

    let mut selected: Option<String> = None;
    while let Ok(Some(line)) = lines.next_line().await {
        let Some((tag, command)) = line.split_once(' ') else {
            continue;
        };
        let (reply, done) = handle(&state, &mut selected, tag, command);
        if write.write_all(&reply).await.is_err() || done {
            break;
        }
    }
    let _ = write.shutdown().await;
}

fn handle(
    state: &Arc<Mutex<State>>,
    selected: &mut Option<String>,
    tag: &str,
    command: &str,
) -> (Vec<u8>, bool) {
    let mut state = state.lock().unwrap();
    state.commands.push(command.to_string());
    let args = tokens(command);
    let verb: Vec<String> = args.iter().take(2).map(|a| a.to_ascii_uppercase()).collect();
    let ok = |text: &str| format!("{tag} OK {text}\r\n").into_bytes();

    match verb.first().map(String::as_str) {
        Some("LOGIN") => {
            if args.get(1).map(String::as_str) == Some(USER)
                && args.get(2).map(String::as_str) == Some(PASSWORD)
            {
                let caps = capability_list(&state);
                (ok(&format!("[CAPABILITY {caps}] logged in")), false)
            } else {
                (
                    format!("{tag} NO [AUTHENTICATIONFAILED] invalid credentials\r\n").into_bytes(),
                    false,
                )
            }
        }
        Some("CAPABILITY") => {
            let caps = capability_list(&state);
            let mut out = format!("* CAPABILITY {caps}\r\n").into_bytes();
            out.extend(ok("done"));
            (out, false)
        }
        Some("NOOP") => (ok("done"), false),
        Some("SELECT" | "EXAMINE") => {
            let name = args.get(1).cloned().unwrap_or_default();
            let key = if name.eq_ignore_ascii_case("INBOX") {
                "INBOX".to_string()
            } else {
                name
            };
            let Some(folder) = state.folders.get(&key) else {
                *selected = None;
                return (
                    format!("{tag} NO [NONEXISTENT] unknown mailbox\r\n").into_bytes(),
                    false,
                );
            };
            let mut out = format!(
                "* {} EXISTS\r\n* OK [UIDVALIDITY {}] ok\r\n* OK [UIDNEXT {}] ok\r\n* FLAGS (\\Seen \\Deleted \\Flagged)\r\n",
                folder.messages.len(),
                folder.uid_validity,
                folder.uid_next
            )
            .into_bytes();
            let mode = if verb[0] == "SELECT" {
                "READ-WRITE"
            } else {
                "READ-ONLY"
            };
            out.extend(ok(&format!("[{mode}] selected")));
            *selected = Some(key);
            (out, false)
        }
        Some("LOGOUT") => {
            let mut out = b"* BYE see you\r\n".to_vec();
            out.extend(ok("logged out"));
            (out, true)
        }
        Some("EXPUNGE") => {
            let name = selected.clone().unwrap();
            let folder = state.folders.get_mut(&name).unwrap();
            folder.messages.retain(|m| !m.has_flag("\\Deleted"));
            (ok("expunged"), false)
        }
        Some("UID") => {
            let name = selected.clone().unwrap();
            uid_command(&mut state, &name, tag, &verb[1], &args[2..], command)
        }
        _ => (format!("{tag} BAD unknown command\r\n").into_bytes(), false),
    }
}

fn uid_command(
    state: &mut State,
    folder_name: &str,
    tag: &str,
    verb: &str,
    args: &[String],
    line: &str,
) -> (Vec<u8>, bool) {
    let ok = |text: &str| format!("{tag} OK {text}\r\n").into_bytes();
    let has_uidplus = state.capabilities.contains(&"UIDPLUS");
    match verb {
        "SEARCH" => {
            let folder = &state.folders[folder_name];
            let key = args.first().map(|a| a.to_ascii_uppercase()).unwrap_or_default();
            let uids: Vec<u32> = folder
                .messages
                .iter()
                .filter(|m| match key.as_str() {
                    "ALL" => true,
                    "UNSEEN" => !m.has_flag("\\Seen"),
                    "UID" => uid_set(&args[1]).contains(&m.uid),
                    "HEADER" => m.message_id().as_deref() == args.get(2).map(String::as_str),
                    _ => false,
                })
                .map(|m| m.uid)
                .collect();
            let mut out = b"* SEARCH".to_vec();
            for uid in uids {
                out.extend(format!(" {uid}").into_bytes());
            }
            out.extend(b"\r\n");
            out.extend(ok("search done"));
            (out, false)
        }
        "FETCH" => {
            let wanted = uid_set(&args[0]);
            let attributes = line.split_once('(').map_or("", |(_, rest)| rest);
            let folder = &state.folders[folder_name];
            let mut out = Vec::new();
            for (i, message) in folder.messages.iter().enumerate() {
                if wanted.contains(&message.uid) {
                    out.extend(format!("* {} FETCH (", i + 1).into_bytes());
                    out.extend(fetch_item(message, attributes));
                    out.extend(b")\r\n");
                }
            }
            out.extend(ok("fetch done"));
            (out, false)
        }
        "STORE" => {
            let wanted = uid_set(&args[0]);
            let action = args[1].to_ascii_uppercase();
            let flags: Vec<String> = line
                .split_once('(')
                .map(|(_, rest)| rest.trim_end_matches(')'))
                .unwrap_or("")
                .split(' ')
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            let folder = state.folders.get_mut(folder_name).unwrap();
            for message in folder.messages.iter_mut().filter(|m| wanted.contains(&m.uid)) {
                for flag in &flags {
                    if action.starts_with('+') {
                        if !message.has_flag(flag) {
                            message.flags.push(flag.clone());
                        }
                    } else {
                        message.flags.retain(|f| !f.eq_ignore_ascii_case(flag));
                    }
                }
            }
            (ok("stored"), false)
        }
        "COPY" | "MOVE" => {
            let wanted = uid_set(&args[0]);
            let target = args[1].clone();
            if !state.folders.contains_key(&target) {
                return (
                    format!("{tag} NO [TRYCREATE] no such mailbox\r\n").into_bytes(),
                    false,
                );
            }
            let source = state.folders.get_mut(folder_name).unwrap();
            let moving: Vec<(usize, FakeMessage)> = source
                .messages
                .iter()
                .enumerate()
                .filter(|(_, m)| wanted.contains(&m.uid))
                .map(|(i, m)| (i, m.clone()))
                .collect();
            if verb == "MOVE" {
                source.messages.retain(|m| !wanted.contains(&m.uid));
            }
            let destination = state.folders.get_mut(&target).unwrap();
            let mut pairs = Vec::new();
            for (_, message) in &moving {
                let old = message.uid;
                let mut copy = message.clone();
                copy.flags.retain(|f| f != "\\Deleted");
                pairs.push((old, destination.append(copy)));
            }
            let copy_uid = format!(
                "[COPYUID {} {} {}]",
                destination.uid_validity,
                pairs.iter().map(|p| p.0.to_string()).collect::<Vec<_>>().join(","),
                pairs.iter().map(|p| p.1.to_string()).collect::<Vec<_>>().join(",")
            );
            let mut out = Vec::new();
            if verb == "MOVE" {
                if has_uidplus {
                    out.extend(format!("* OK {copy_uid} moved\r\n").into_bytes());
                }
                for (i, _) in moving.iter().rev() {
                    out.extend(format!("* {} EXPUNGE\r\n", i + 1).into_bytes());
                }
                out.extend(ok("move done"));
            } else if has_uidplus {
                out.extend(ok(&format!("{copy_uid} copy done")));
            } else {
                out.extend(ok("copy done"));
            }
            (out, false)
        }
        "EXPUNGE" => {
            let wanted = uid_set(&args[0]);
            let folder = state.folders.get_mut(folder_name).unwrap();
            folder
                .messages
                .retain(|m| !(wanted.contains(&m.uid) && m.has_flag("\\Deleted")));
            (ok("expunged"), false)
        }
        _ => (format!("{tag} BAD unknown UID command\r\n").into_bytes(), false),
    }
}
