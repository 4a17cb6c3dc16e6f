//! In-memory stand-ins for the sandbox collaborators.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use sandbox_platform::{CommandExecutor, CommandResult, LocalFs, OperationResponse, SandboxApi};

use crate::filesystem::SandboxFilesystem;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(String),
    Dir,
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    remote_error: Option<String>,
    transport_error: Option<String>,
    commands: Vec<String>,
    injections: Vec<String>,
}

/// Fake sandbox implementing both the API and the command executor over one tree.
///
/// Shell commands are tokenized the way `sh` would split quoted words. Any
/// unquoted shell syntax is recorded as an injection instead of run.
#[derive(Default)]
pub struct FakeSandbox {
    state: Mutex<State>,
    calls: AtomicUsize,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    if trimmed.is_empty() || trimmed == "." {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn parent_of(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => Some("/".to_string()),
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn child_prefix(path: &str) -> String {
    if path == "/" {
        "/".to_string()
    } else {
        format!("{}/", path)
    }
}

impl State {
    fn node(&self, path: &str) -> Option<&Node> {
        if path == "/" {
            return Some(&Node::Dir);
        }
        self.nodes.get(path)
    }

    fn has_children(&self, path: &str) -> bool {
        let prefix = child_prefix(path);
        self.nodes.keys().any(|k| k.starts_with(&prefix))
    }

    fn create_dirs(&mut self, path: &str) -> std::result::Result<(), String> {
        if let Some(parent) = parent_of(path) {
            self.create_dirs(&parent)?;
        }
        match self.node(path) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(format!("mkdir {}: not a directory", path)),
            None => {
                self.nodes.insert(path.to_string(), Node::Dir);
                Ok(())
            }
        }
    }

    fn remove_tree(&mut self, path: &str) {
        let prefix = child_prefix(path);
        self.nodes.retain(|k, _| k != path && !k.starts_with(&prefix));
    }
}

impl FakeSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating parent directories.
    pub fn put_file(&self, path: &str, content: &str) {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = parent_of(&path) {
            state.create_dirs(&parent).unwrap();
        }
        state.nodes.insert(path, Node::File(content.to_string()));
    }

    pub fn file(&self, path: &str) -> Option<String> {
        match self.state.lock().unwrap().nodes.get(&normalize(path)) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(
            self.state.lock().unwrap().node(&normalize(path)),
            Some(Node::Dir)
        )
    }

    /// Every subsequent API call answers with this remote error text.
    pub fn fail_remote(&self, message: &str) {
        self.state.lock().unwrap().remote_error = Some(message.to_string());
    }

    /// Every subsequent call (API or executor) fails at the transport level.
    pub fn fail_transport(&self, message: &str) {
        self.state.lock().unwrap().transport_error = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn injections(&self) -> Vec<String> {
        self.state.lock().unwrap().injections.clone()
    }

    fn api_call<F>(&self, f: F) -> Result<OperationResponse>
    where
        F: FnOnce(&mut State) -> std::result::Result<OperationResponse, String>,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.transport_error {
            return Err(anyhow!("{}", err));
        }
        if let Some(err) = &state.remote_error {
            return Ok(OperationResponse::failed(err.clone()));
        }
        Ok(f(&mut *state).unwrap_or_else(OperationResponse::failed))
    }
}

impl SandboxApi for FakeSandbox {
    fn write_file(&self, path: &str, content: &str) -> Result<OperationResponse> {
        let path = normalize(path);
        self.api_call(|state| {
            if let Some(parent) = parent_of(&path) {
                state.create_dirs(&parent)?;
            }
            if let Some(Node::Dir) = state.node(&path) {
                return Err(format!("open {}: is a directory", path));
            }
            state.nodes.insert(path, Node::File(content.to_string()));
            Ok(OperationResponse::ok())
        })
    }

    fn read_file(&self, path: &str) -> Result<OperationResponse> {
        let path = normalize(path);
        self.api_call(|state| match state.node(&path) {
            Some(Node::File(content)) => Ok(OperationResponse::with_content(content.clone())),
            Some(Node::Dir) => Err(format!("read {}: is a directory", path)),
            None => Err(format!("open {}: no such file or directory", path)),
        })
    }

    fn make_dir(&self, path: &str) -> Result<OperationResponse> {
        let path = normalize(path);
        self.api_call(|state| {
            if state.node(&path).is_some() {
                return Err(format!("mkdir {}: file exists", path));
            }
            state.create_dirs(&path)?;
            Ok(OperationResponse::ok())
        })
    }

    fn list_dir(&self, path: &str) -> Result<OperationResponse> {
        let path = normalize(path);
        self.api_call(|state| match state.node(&path) {
            Some(Node::Dir) => {
                let prefix = child_prefix(&path);
                let entries = state
                    .nodes
                    .keys()
                    .filter_map(|k| k.strip_prefix(&prefix))
                    .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                    .map(str::to_string)
                    .collect();
                Ok(OperationResponse::with_entries(entries))
            }
            Some(Node::File(_)) => Err(format!("readdir {}: not a directory", path)),
            None => Err(format!("open {}: no such file or directory", path)),
        })
    }

    fn delete_file(&self, path: &str) -> Result<OperationResponse> {
        let path = normalize(path);
        self.api_call(|state| match state.node(&path).cloned() {
            Some(Node::File(_)) => {
                state.nodes.remove(&path);
                Ok(OperationResponse::ok())
            }
            Some(Node::Dir) => Err(format!("remove {}: is a directory", path)),
            None => Err(format!("remove {}: no such file or directory", path)),
        })
    }

    fn delete_dir(&self, path: &str) -> Result<OperationResponse> {
        let path = normalize(path);
        self.api_call(|state| match state.node(&path).cloned() {
            Some(Node::Dir) if state.has_children(&path) => {
                Err(format!("remove {}: directory not empty", path))
            }
            Some(Node::Dir) => {
                state.nodes.remove(&path);
                Ok(OperationResponse::ok())
            }
            Some(Node::File(_)) => Err(format!("remove {}: not a directory", path)),
            None => Err(format!("remove {}: no such file or directory", path)),
        })
    }
}

/// Split a command line into words; an unquoted shell metacharacter is an error.
fn tokenize(command: &str) -> std::result::Result<Vec<String>, char> {
    let mut words = Vec::new();
    let mut current: Option<String> = None;
    let mut in_single = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        if in_single {
            if c == '\'' {
                in_single = false;
            } else {
                current.get_or_insert_with(String::new).push(c);
            }
            continue;
        }
        match c {
            '\'' => {
                in_single = true;
                current.get_or_insert_with(String::new);
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    current.get_or_insert_with(String::new).push(next);
                }
            }
            c if c.is_whitespace() => {
                if let Some(word) = current.take() {
                    words.push(word);
                }
            }
            ';' | '&' | '|' | '$' | '`' | '>' | '<' | '(' | ')' | '"' | '*' | '?' => {
                return Err(c);
            }
            c => current.get_or_insert_with(String::new).push(c),
        }
    }
    if in_single {
        return Err('\'');
    }
    if let Some(word) = current {
        words.push(word);
    }
    Ok(words)
}

impl CommandExecutor for FakeSandbox {
    fn execute(&self, command: &str) -> Result<CommandResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.commands.push(command.to_string());
        if let Some(err) = &state.transport_error {
            return Err(anyhow!("{}", err));
        }

        let words = match tokenize(command) {
            Ok(words) => words,
            Err(_) => {
                state.injections.push(command.to_string());
                return Ok(CommandResult::failed("sh: syntax error"));
            }
        };
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let result = match words.as_slice() {
            ["test", flag, path] => {
                let node = state.node(&normalize(path));
                let ok = match *flag {
                    "-e" => node.is_some(),
                    "-f" => matches!(node, Some(Node::File(_))),
                    "-d" => matches!(node, Some(Node::Dir)),
                    _ => false,
                };
                CommandResult {
                    success: ok,
                    ..CommandResult::default()
                }
            }
            ["mv", "--", src, dst] => {
                let src_path = normalize(src);
                if state.node(&src_path).is_none() || src_path == "/" {
                    CommandResult::failed(format!(
                        "mv: cannot stat '{}': No such file or directory",
                        src
                    ))
                } else {
                    let mut dst_path = normalize(dst);
                    if let Some(Node::Dir) = state.node(&dst_path) {
                        dst_path = format!("{}{}", child_prefix(&dst_path), base_name(&src_path));
                    }
                    let src_prefix = child_prefix(&src_path);
                    let moved: Vec<(String, Node)> = state
                        .nodes
                        .iter()
                        .filter(|(k, _)| **k == src_path || k.starts_with(&src_prefix))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    state.remove_tree(&src_path);
                    for (key, node) in moved {
                        let new_key = format!("{}{}", dst_path, &key[src_path.len()..]);
                        state.nodes.insert(new_key, node);
                    }
                    CommandResult::succeeded("")
                }
            }
            ["rm", "--", path] => match state.node(&normalize(path)).cloned() {
                Some(Node::File(_)) => {
                    state.nodes.remove(&normalize(path));
                    CommandResult::succeeded("")
                }
                Some(Node::Dir) => {
                    CommandResult::failed(format!("rm: cannot remove '{}': Is a directory", path))
                }
                None => CommandResult::failed(format!(
                    "rm: cannot remove '{}': No such file or directory",
                    path
                )),
            },
            ["rm", "-rf", "--", path] => {
                state.remove_tree(&normalize(path));
                CommandResult::succeeded("")
            }
            _ => CommandResult::failed(format!("sh: unsupported command: {}", command)),
        };
        Ok(result)
    }
}

/// In-memory host filesystem.
#[derive(Default)]
pub struct MemoryLocalFs {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryLocalFs {
    pub fn insert(&self, path: impl Into<PathBuf>, data: &[u8]) {
        self.files.lock().unwrap().insert(path.into(), data.to_vec());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }
}

impl LocalFs for MemoryLocalFs {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.get(path)
            .ok_or_else(|| anyhow!("failed to read file {}", path.display()))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.insert(path, data);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}

/// Facade wired to a fresh fake sandbox and in-memory host filesystem.
pub fn fixture() -> (Arc<FakeSandbox>, Arc<MemoryLocalFs>, SandboxFilesystem) {
    let sandbox = Arc::new(FakeSandbox::new());
    let local = Arc::new(MemoryLocalFs::default());
    let fs = SandboxFilesystem::new(sandbox.clone(), sandbox.clone()).with_local_fs(local.clone());
    (sandbox, local, fs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quoted_words() {
        assert_eq!(
            tokenize("mv -- 'a b' 'it'\\''s'").unwrap(),
            vec!["mv", "--", "a b", "it's"]
        );
        assert_eq!(tokenize("test -e ''").unwrap(), vec!["test", "-e", ""]);
    }

    #[test]
    fn test_tokenize_flags_unquoted_syntax() {
        assert_eq!(tokenize("rm -- x; rm -rf /"), Err(';'));
        assert_eq!(tokenize("test -e $(id)"), Err('$'));
    }
}
