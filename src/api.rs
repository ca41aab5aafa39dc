// API client module: a small synchronous client for the JSONBin.io v3 API.
// It reads local JSON files through a `Store`, sends them through a
// `Transport`, parses the service envelope and keeps the local list of
// created bin IDs up to date.

use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::bins::BinList;
use crate::config::Config;
use crate::error::{BinError, Operation, StoreError};
use crate::store::{FileStore, Store};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

pub const MASTER_KEY_HEADER: &str = "X-Master-Key";
pub const BIN_NAME_HEADER: &str = "X-Bin-Name";
const CONTENT_TYPE_HEADER: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Envelope returned by `POST /b`.
#[derive(Deserialize, Debug)]
struct CreateEnvelope {
    metadata: CreateMetadata,
}

#[derive(Deserialize, Debug)]
struct CreateMetadata {
    #[serde(default)]
    id: String,
}

/// Envelope returned by `GET /b/{id}`.
#[derive(Deserialize, Debug)]
struct ReadEnvelope {
    record: BinList,
}

/// Client for the bin service. Holds the configuration (master key, base
/// URL), the transport used for requests and the store used for local
/// files.
pub struct BinClient<T = HttpTransport, S = FileStore> {
    config: Config,
    transport: T,
    store: S,
}

impl BinClient {
    /// Client backed by reqwest and the local filesystem.
    pub fn new(config: Config) -> Result<Self, BinError> {
        let transport = HttpTransport::new(config.timeout).map_err(BinError::ClientBuild)?;
        Ok(BinClient::with_parts(config, transport, FileStore::new()))
    }
}

impl<T: Transport, S: Store> BinClient<T, S> {
    pub fn with_parts(config: Config, transport: T, store: S) -> Self {
        BinClient {
            config,
            transport,
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn collection_url(&self) -> String {
        format!("{}/b", self.config.base_url)
    }

    fn bin_url(&self, id: &str) -> String {
        format!("{}/b/{}", self.config.base_url, id)
    }

    fn read_local_json(&self, path: &Path) -> Result<Vec<u8>, BinError> {
        self.store.read_json(path).map_err(|source| BinError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn send(&self, operation: Operation, target: &str, req: ApiRequest) -> Result<ApiResponse, BinError> {
        let req = req.header(MASTER_KEY_HEADER, self.config.master_key.clone());
        self.transport
            .execute(req)
            .map_err(|err| BinError::from_transport(operation, target, err))
    }

    /// Create a new bin from `local_file` and return the id the service
    /// assigned. With `save_as` set, the id is appended to that file; a
    /// failure there is logged and does not fail the call, since the bin
    /// already exists remotely.
    #[instrument(skip(self, save_as), fields(file = %local_file.display()))]
    pub fn create_bin(
        &self,
        local_file: &Path,
        bin_name: &str,
        save_as: Option<&Path>,
    ) -> Result<String, BinError> {
        let target = local_file.display().to_string();
        let data = self.read_local_json(local_file)?;

        let req = ApiRequest::new(Method::POST, self.collection_url())
            .header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE)
            .header(BIN_NAME_HEADER, bin_name)
            .body(data);
        let res = self.send(Operation::Create, &target, req)?;

        if res.status != 200 && res.status != 201 {
            return Err(api_error(Operation::Create, &target, &res));
        }

        let envelope: CreateEnvelope = parse(Operation::Create, &target, &res)?;
        let bin_id = envelope.metadata.id;
        if bin_id.is_empty() {
            return Err(BinError::InvalidResponse {
                operation: Operation::Create,
                target,
                message: "response carries no bin id".to_string(),
            });
        }
        info!(bin_id = %bin_id, name = bin_name, "bin created");

        if let Some(save_as) = save_as {
            match self.store.append(save_as, format!("{bin_id}\n").as_bytes()) {
                Ok(()) => info!(path = %save_as.display(), "bin id saved"),
                Err(err) => warn!(
                    path = %save_as.display(),
                    error = %err,
                    "bin created but failed to save its id"
                ),
            }
        }

        Ok(bin_id)
    }

    /// Fetch a bin and parse its content as a `BinList`.
    #[instrument(skip(self))]
    pub fn get(&self, id: &str) -> Result<BinList, BinError> {
        let req = ApiRequest::new(Method::GET, self.bin_url(id));
        let res = self.send(Operation::Read, id, req)?;

        if res.status != 200 {
            return Err(api_error(Operation::Read, id, &res));
        }

        let envelope: ReadEnvelope = parse(Operation::Read, id, &res)?;
        debug!(bins = envelope.record.len(), "bin read");
        Ok(envelope.record)
    }

    /// Replace the full content of bin `id` with `local_file`.
    #[instrument(skip(self), fields(file = %local_file.display()))]
    pub fn update(&self, local_file: &Path, id: &str) -> Result<(), BinError> {
        let data = self.read_local_json(local_file)?;

        let req = ApiRequest::new(Method::PUT, self.bin_url(id))
            .header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE)
            .body(data);
        let res = self.send(Operation::Update, id, req)?;

        if res.status != 200 && res.status != 201 {
            return Err(api_error(Operation::Update, id, &res));
        }
        info!("bin updated");
        Ok(())
    }

    /// Delete bin `id` on the service. The local save file is left alone;
    /// see `prune_saved`.
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<(), BinError> {
        let req = ApiRequest::new(Method::DELETE, self.bin_url(id));
        let res = self.send(Operation::Delete, id, req)?;

        if res.status != 200 {
            return Err(api_error(Operation::Delete, id, &res));
        }
        info!("bin deleted");
        Ok(())
    }

    /// Saved bin ids in file order, trimmed, blank lines skipped. An
    /// absent save file has no ids.
    pub fn saved_ids(&self, save_file: &Path) -> Result<Vec<String>, BinError> {
        let data = match self.store.read_plain(save_file) {
            Ok(data) => data,
            Err(err) if err.is_not_found() => return Ok(Vec::new()),
            Err(source) => {
                return Err(BinError::Read {
                    path: save_file.to_path_buf(),
                    source,
                })
            }
        };

        let text = String::from_utf8(data).map_err(|source| {
            warn!(path = %save_file.display(), "saved bin list is not valid UTF-8");
            BinError::Read {
                path: save_file.to_path_buf(),
                source: StoreError::NotText {
                    path: save_file.to_path_buf(),
                    source,
                },
            }
        })?;

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Print the saved bin ids to `out`, numbered from 1. Returns how many
    /// were printed.
    #[instrument(skip(self, out), fields(file = %save_file.display()))]
    pub fn list<W: Write>(&self, save_file: &Path, out: &mut W) -> Result<usize, BinError> {
        let ids = self.saved_ids(save_file)?;
        if ids.is_empty() {
            writeln!(out, "No saved bins yet.")?;
            return Ok(0);
        }

        writeln!(out, "Your saved bins:")?;
        for (i, id) in ids.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, id)?;
        }
        Ok(ids.len())
    }

    /// Remove every line equal to `id` from the save file. Returns the
    /// number of lines removed; the file is only rewritten when that is
    /// non-zero.
    #[instrument(skip(self), fields(file = %save_file.display()))]
    pub fn prune_saved(&self, save_file: &Path, id: &str) -> Result<usize, BinError> {
        let ids = self.saved_ids(save_file)?;
        let kept: Vec<&String> = ids.iter().filter(|saved| saved.as_str() != id).collect();
        let removed = ids.len() - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let content: String = kept.iter().map(|saved| format!("{saved}\n")).collect();
        self.store
            .write(save_file, content.as_bytes())
            .map_err(|source| BinError::Write {
                path: save_file.to_path_buf(),
                source,
            })?;
        info!(removed, "pruned saved bin ids");
        Ok(removed)
    }
}

fn api_error(operation: Operation, target: &str, res: &ApiResponse) -> BinError {
    BinError::Api {
        operation,
        target: target.to_string(),
        status: res.status,
        body: res.body_text(),
    }
}

fn parse<'de, D: Deserialize<'de>>(
    operation: Operation,
    target: &str,
    res: &'de ApiResponse,
) -> Result<D, BinError> {
    serde_json::from_slice(&res.body).map_err(|source| BinError::Parse {
        operation,
        target: target.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::store::MemoryStore;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses and records every request it sees.
    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<Result<ApiResponse, TransportError>>>,
        requests: RefCell<Vec<ApiRequest>>,
    }

    impl Scripted {
        fn reply(self, status: u16, body: &str) -> Self {
            self.responses
                .borrow_mut()
                .push_back(Ok(ApiResponse::new(status, body.as_bytes().to_vec())));
            self
        }

        fn fail(self, err: TransportError) -> Self {
            self.responses.borrow_mut().push_back(Err(err));
            self
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .expect("unexpected request")
        }
    }

    /// Store whose appends and writes always fail.
    struct ReadOnly(MemoryStore);

    impl Store for ReadOnly {
        fn read_json(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
            self.0.read_json(path)
        }
        fn read_plain(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
            self.0.read_plain(path)
        }
        fn write(&self, path: &Path, _: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
        fn append(&self, path: &Path, content: &[u8]) -> Result<(), StoreError> {
            self.write(path, content)
        }
    }

    const SAMPLE: &str = r#"{"bins":[{"id":"test-1","name":"First Bin","is_private":false,"created_at":"2025-01-01T00:00:00Z"}]}"#;

    fn client<S: Store>(transport: Scripted, store: S) -> BinClient<Scripted, S> {
        BinClient::with_parts(
            Config::new("master").with_base_url("https://bins.test/v3"),
            transport,
            store,
        )
    }

    #[test]
    fn create_sends_file_with_headers_and_saves_id() {
        let transport = Scripted::default().reply(200, r#"{"record":{},"metadata":{"id":"abc123"}}"#);
        let store = MemoryStore::new().with_file("sample.json", SAMPLE);
        let client = client(transport, store);

        let id = client
            .create_bin(Path::new("sample.json"), "Test", Some(Path::new("saved.txt")))
            .unwrap();
        assert_eq!(id, "abc123");
        assert_eq!(client.store().contents("saved.txt").unwrap(), b"abc123\n");

        let reqs = client.transport().requests();
        assert_eq!(reqs.len(), 1);
        let req = &reqs[0];
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.url, "https://bins.test/v3/b");
        assert_eq!(req.header_value("X-Master-Key"), Some("master"));
        assert_eq!(req.header_value("X-Bin-Name"), Some("Test"));
        assert_eq!(req.header_value("Content-Type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(SAMPLE.as_bytes()));
    }

    #[test]
    fn create_accepts_201_and_skips_saving_without_target() {
        let transport = Scripted::default().reply(201, r#"{"metadata":{"id":"xyz"}}"#);
        let store = MemoryStore::new().with_file("sample.json", SAMPLE);
        let client = client(transport, store);

        let id = client.create_bin(Path::new("sample.json"), "Test", None).unwrap();
        assert_eq!(id, "xyz");
        assert!(client.store().contents("saved-bins.txt").is_none());
    }

    #[test]
    fn create_rejects_non_json_file_without_network() {
        let store = MemoryStore::new().with_file("notes.txt", "{}");
        let client = client(Scripted::default(), store);

        let err = client.create_bin(Path::new("notes.txt"), "Test", None).unwrap_err();
        assert!(matches!(
            err,
            BinError::Read {
                source: StoreError::NotJson { .. },
                ..
            }
        ));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn create_missing_file_is_read_error() {
        let client = client(Scripted::default(), MemoryStore::new());
        let err = client.create_bin(Path::new("gone.json"), "Test", None).unwrap_err();
        assert!(matches!(err, BinError::Read { .. }));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn create_save_failure_is_not_fatal() {
        let transport = Scripted::default().reply(200, r#"{"metadata":{"id":"abc"}}"#);
        let store = ReadOnly(MemoryStore::new().with_file("sample.json", SAMPLE));
        let client = client(transport, store);

        let id = client
            .create_bin(Path::new("sample.json"), "Test", Some(Path::new("saved.txt")))
            .unwrap();
        assert_eq!(id, "abc");
    }

    #[test]
    fn create_error_status_carries_body() {
        let transport = Scripted::default().reply(401, r#"{"message":"Invalid X-Master-Key"}"#);
        let store = MemoryStore::new().with_file("sample.json", SAMPLE);
        let client = client(transport, store);

        let err = client.create_bin(Path::new("sample.json"), "Test", None).unwrap_err();
        match err {
            BinError::Api { status, body, operation, .. } => {
                assert_eq!(status, 401);
                assert_eq!(operation, Operation::Create);
                assert!(body.contains("Invalid X-Master-Key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn create_without_id_is_invalid_response() {
        let transport = Scripted::default().reply(200, r#"{"metadata":{}}"#);
        let store = MemoryStore::new().with_file("sample.json", SAMPLE);
        let client = client(transport, store);

        let err = client
            .create_bin(Path::new("sample.json"), "Test", Some(Path::new("saved.txt")))
            .unwrap_err();
        assert!(matches!(err, BinError::InvalidResponse { .. }));
        assert!(client.store().contents("saved.txt").is_none());
    }

    #[test]
    fn create_garbage_response_is_parse_error() {
        let transport = Scripted::default().reply(200, "<html>oops</html>");
        let store = MemoryStore::new().with_file("sample.json", SAMPLE);
        let client = client(transport, store);

        let err = client.create_bin(Path::new("sample.json"), "Test", None).unwrap_err();
        assert!(matches!(err, BinError::Parse { .. }));
    }

    #[test]
    fn get_parses_record() {
        let body = format!(r#"{{"record":{SAMPLE},"metadata":{{"id":"abc","private":true}}}}"#);
        let transport = Scripted::default().reply(200, &body);
        let client = client(transport, MemoryStore::new());

        let list = client.get("abc").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.bins[0].name, "First Bin");

        let req = &client.transport().requests()[0];
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url, "https://bins.test/v3/b/abc");
        assert_eq!(req.header_value("X-Master-Key"), Some("master"));
        assert!(req.body.is_none());
    }

    #[test]
    fn get_not_found_is_api_error() {
        let transport = Scripted::default().reply(404, r#"{"message":"Bin not found"}"#);
        let client = client(transport, MemoryStore::new());

        let err = client.get("missing").unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn network_failure_is_reported_with_target() {
        let transport = Scripted::default().fail(TransportError::Connection("connection refused".into()));
        let client = client(transport, MemoryStore::new());

        let err = client.get("abc").unwrap_err();
        assert!(matches!(err, BinError::Network { .. }));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn update_puts_file_content() {
        let transport = Scripted::default().reply(200, r#"{"record":{}}"#);
        let store = MemoryStore::new().with_file("new.json", SAMPLE);
        let client = client(transport, store);

        client.update(Path::new("new.json"), "abc").unwrap();

        let req = &client.transport().requests()[0];
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.url, "https://bins.test/v3/b/abc");
        assert_eq!(req.header_value("X-Bin-Name"), None);
        assert_eq!(req.body.as_deref(), Some(SAMPLE.as_bytes()));
    }

    #[test]
    fn update_error_status() {
        let transport = Scripted::default().reply(403, "forbidden");
        let store = MemoryStore::new().with_file("new.json", SAMPLE);
        let client = client(transport, store);

        let err = client.update(Path::new("new.json"), "abc").unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn delete_sends_delete() {
        let transport = Scripted::default().reply(200, r#"{"message":"Bin deleted successfully"}"#);
        let client = client(transport, MemoryStore::new());

        client.delete("abc").unwrap();
        let req = &client.transport().requests()[0];
        assert_eq!(req.method, Method::DELETE);
        assert_eq!(req.url, "https://bins.test/v3/b/abc");
    }

    #[test]
    fn delete_error_status() {
        let transport = Scripted::default().reply(404, "gone");
        let client = client(transport, MemoryStore::new());
        assert_eq!(client.delete("abc").unwrap_err().status(), Some(404));
    }

    #[test]
    fn list_numbers_non_blank_lines() {
        let store = MemoryStore::new().with_file("saved.txt", "  first \n\n second\n   \nthird");
        let client = client(Scripted::default(), store);

        let mut out = Vec::new();
        let count = client.list(Path::new("saved.txt"), &mut out).unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Your saved bins:\n  1. first\n  2. second\n  3. third\n"
        );
    }

    #[test]
    fn list_empty_or_absent_file() {
        let store = MemoryStore::new().with_file("blank.txt", " \n\t\n");
        let client = client(Scripted::default(), store);

        for file in ["blank.txt", "absent.txt"] {
            let mut out = Vec::new();
            assert_eq!(client.list(Path::new(file), &mut out).unwrap(), 0);
            assert_eq!(String::from_utf8(out).unwrap(), "No saved bins yet.\n");
        }
    }

    #[test]
    fn prune_removes_matching_ids_only() {
        let store = MemoryStore::new().with_file("saved.txt", "a\nb\na\nc\n");
        let client = client(Scripted::default(), store);

        assert_eq!(client.prune_saved(Path::new("saved.txt"), "a").unwrap(), 2);
        assert_eq!(client.store().contents("saved.txt").unwrap(), b"b\nc\n");
        assert_eq!(client.prune_saved(Path::new("saved.txt"), "zzz").unwrap(), 0);
    }

    #[test]
    fn corrupt_save_file_is_read_error_and_left_alone() {
        let corrupt = b"good-id\n\xff\xfebad\n".to_vec();
        let store = MemoryStore::new().with_file("saved.txt", corrupt.clone());
        let client = client(Scripted::default(), store);

        let err = client.list(Path::new("saved.txt"), &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            BinError::Read {
                source: StoreError::NotText { .. },
                ..
            }
        ));

        assert!(client.prune_saved(Path::new("saved.txt"), "good-id").is_err());
        assert_eq!(client.store().contents("saved.txt").unwrap(), corrupt);
    }
}
