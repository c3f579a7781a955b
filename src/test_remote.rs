/// In-memory stand-in for the remote contents API, used by unit tests.
///
/// Files are keyed by (branch, path); directories exist only as shared path
/// prefixes. Hash matching, 404s and 409s follow the hosted API.
use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::codec;
use crate::error::{Error, Result};
use crate::paths;
use crate::transport::{Method, Transport};

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
}

struct StoredFile {
    sha: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct State {
    files: BTreeMap<(String, String), StoredFile>,
    next_id: u64,
    calls: Vec<Call>,
    canned: Vec<(String, Value)>,
    next_failure: Option<(u16, String)>,
    deletes_before_failure: Option<usize>,
}

impl State {
    fn fresh_sha(&mut self) -> String {
        self.next_id += 1;
        format!("sha{}", self.next_id)
    }
}

#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a file directly on the remote, returning its hash.
    pub fn seed(&self, branch: &str, path: &str, bytes: &[u8]) -> String {
        let mut state = self.state.lock().unwrap();
        let sha = state.fresh_sha();
        state.files.insert(
            (branch.to_string(), path.to_string()),
            StoredFile {
                sha: sha.clone(),
                bytes: bytes.to_vec(),
            },
        );
        sha
    }

    /// Mutate a file behind the client's back, as another user would.
    pub fn touch(&self, branch: &str, path: &str, bytes: &[u8]) -> String {
        self.seed(branch, path, bytes)
    }

    pub fn sha_of(&self, branch: &str, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(&(branch.to_string(), path.to_string()))
            .map(|f| f.sha.clone())
    }

    pub fn bytes_of(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(&(branch.to_string(), path.to_string()))
            .map(|f| f.bytes.clone())
    }

    pub fn paths(&self, branch: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .keys()
            .filter(|(b, _)| b == branch)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_with(&self, method: Method) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.method == method).collect()
    }

    /// Answer any call whose endpoint starts with `prefix` with `value`.
    pub fn respond(&self, prefix: &str, value: Value) {
        self.state
            .lock()
            .unwrap()
            .canned
            .push((prefix.to_string(), value));
    }

    /// Fail the next call, whatever it is.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.state.lock().unwrap().next_failure = Some((status, message.to_string()));
    }

    /// Let `n` deletes succeed, fail the next one with a 500, then recover.
    pub fn fail_deletes_after(&self, n: usize) {
        self.state.lock().unwrap().deletes_before_failure = Some(n);
    }
}

#[async_trait]
impl Transport for MemoryRemote {
    async fn call(&self, endpoint: &str, method: Method, body: Option<Value>) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            body: body.clone(),
        });

        if let Some((status, message)) = state.next_failure.take() {
            return Err(Error::from_status(status, message));
        }

        if let Some((_, value)) = state
            .canned
            .iter()
            .find(|(prefix, _)| endpoint.starts_with(prefix.as_str()))
        {
            return Ok(value.clone());
        }

        let (route, query) = endpoint.split_once('?').unwrap_or((endpoint, ""));
        let path = match route.split_once("/contents") {
            Some((_, rest)) => percent_decode(rest.trim_start_matches('/')),
            None => return Err(Error::from_status(404, "Not Found")),
        };
        let body = body.unwrap_or(Value::Null);

        match method {
            Method::GET => {
                let branch = query_value(query, "ref").unwrap_or_else(|| "main".to_string());
                get(&state, &branch, &path)
            }
            Method::PUT => put(&mut state, &path, &body),
            Method::DELETE => delete(&mut state, &path, &body),
            _ => Err(Error::from_status(405, "Method Not Allowed")),
        }
    }
}

fn entry_json(path: &str, sha: &str, size: usize, kind: &str) -> Value {
    json!({
        "name": paths::file_name(path),
        "path": path,
        "sha": sha,
        "size": size,
        "type": kind,
        "download_url": if kind == "file" { json!(format!("https://raw.test/{path}")) } else { Value::Null },
        "html_url": format!("https://web.test/{path}"),
    })
}

fn get(state: &State, branch: &str, path: &str) -> Result<Value> {
    if let Some(file) = state.files.get(&(branch.to_string(), path.to_string())) {
        let mut entry = entry_json(path, &file.sha, file.bytes.len(), "file");
        entry["encoding"] = json!("base64");
        entry["content"] = json!(codec::encode(&file.bytes));
        return Ok(entry);
    }

    let prefix = if path.is_empty() {
        String::new()
    } else {
        format!("{path}/")
    };
    let mut children: BTreeMap<String, Value> = BTreeMap::new();
    for ((b, p), file) in &state.files {
        if b != branch {
            continue;
        }
        let Some(rest) = p.strip_prefix(&prefix) else {
            continue;
        };
        match rest.split_once('/') {
            Some((dir, _)) => {
                let dir_path = paths::join(path, dir);
                children
                    .entry(dir_path.clone())
                    .or_insert_with(|| entry_json(&dir_path, &format!("tree-{dir_path}"), 0, "dir"));
            }
            None => {
                children.insert(p.clone(), entry_json(p, &file.sha, file.bytes.len(), "file"));
            }
        }
    }

    if children.is_empty() {
        return Err(Error::from_status(404, "Not Found"));
    }
    // Reverse so callers cannot rely on the remote's order.
    Ok(Value::Array(children.into_values().rev().collect()))
}

fn put(state: &mut State, path: &str, body: &Value) -> Result<Value> {
    let branch = body["branch"].as_str().unwrap_or("main").to_string();
    let content = codec::decode(body["content"].as_str().unwrap_or_default())
        .map_err(|e| Error::from_status(422, e.to_string()))?;
    let supplied = body["sha"].as_str();
    let key = (branch, path.to_string());

    match (state.files.get(&key), supplied) {
        (Some(existing), Some(sha)) if existing.sha == sha => {}
        (Some(_), Some(sha)) | (None, Some(sha)) => {
            return Err(Error::from_status(409, format!("{path} does not match {sha}")));
        }
        (Some(_), None) => {
            return Err(Error::from_status(
                422,
                "Invalid request.\n\n\"sha\" wasn't supplied.",
            ));
        }
        (None, None) => {}
    }

    let sha = state.fresh_sha();
    let size = content.len();
    state.files.insert(
        key,
        StoredFile {
            sha: sha.clone(),
            bytes: content,
        },
    );
    let commit = state.fresh_sha();
    Ok(json!({
        "content": entry_json(path, &sha, size, "file"),
        "commit": { "sha": commit },
    }))
}

fn delete(state: &mut State, path: &str, body: &Value) -> Result<Value> {
    if let Some(remaining) = state.deletes_before_failure {
        if remaining == 0 {
            state.deletes_before_failure = None;
            return Err(Error::from_status(500, "Server Error"));
        }
        state.deletes_before_failure = Some(remaining - 1);
    }

    let branch = body["branch"].as_str().unwrap_or("main").to_string();
    let supplied = body["sha"].as_str().unwrap_or_default();
    let key = (branch, path.to_string());

    match state.files.get(&key) {
        None => Err(Error::from_status(404, "Not Found")),
        Some(existing) if existing.sha != supplied => Err(Error::from_status(
            409,
            format!("{path} does not match {supplied}"),
        )),
        Some(_) => {
            state.files.remove(&key);
            let commit = state.fresh_sha();
            Ok(json!({ "content": null, "commit": { "sha": commit } }))
        }
    }
}

fn query_value(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| percent_decode(v))
    })
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(b) = decoded {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
