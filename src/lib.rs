// Library root
// -----------
// The binary (`main.rs`) is a thin layer over these modules.
//
// Module responsibilities:
// - `api`: `BinClient`, the create/read/update/delete/list operations
//   against the JSONBin.io v3 API.
// - `bins`: the `Bin` / `BinList` model and local bin-list files.
// - `cli`: flag definitions and validation into an `Action`.
// - `config`: master key and endpoint settings from env and `.env`.
// - `error`: error enums shared by the modules above.
// - `store`: the `Store` trait with file-backed and in-memory versions.
// - `transport`: the `Transport` trait and its reqwest implementation.
// - `ui`: spinners, output formatting and the interactive menu.
pub mod api;
pub mod bins;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;
pub mod transport;
pub mod ui;

pub use api::BinClient;
pub use bins::{Bin, BinList};
pub use config::Config;
pub use error::{BinError, ConfigError, StoreError, TransportError};
pub use store::{FileStore, MemoryStore, Store};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
