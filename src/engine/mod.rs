//! The single-threaded load engine.
//!
//! Every query is one TCP connection driven through connect, a single
//! request write and a read until the server closes. All connections share
//! one thread; the only place the engine blocks is [`Multiplexer::wait`].
mod buffer;
mod connection;
mod decay;
mod driver;
pub mod mux;
mod request;
mod response;
mod target;


pub use buffer::DynamicBuffer;
pub use connection::{Connection, ConnectionStatus, ReadProgress, new_socket};
pub use decay::DecayEstimator;
pub use driver::{BenchmarkDriver, EngineConfig, TABLE_HEADROOM, run_benchmark};
pub use mux::{Multiplexer, Slot, build_multiplexer};
pub use request::{MAX_REQUEST_BYTES, RequestMethod, RequestTemplate};
pub use response::{
    MalformedStatus, ResponseStatus, SNIPPET_LIMIT, STATUS_PARSE_ERROR, first_line_snippet,
    parse_status,
};
pub use target::{ResolvedTarget, resolve_target};
