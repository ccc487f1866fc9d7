//! Gateway namespace: HTTP entrypoint.

mod http;

pub use http::{
    ChatRequest, GatewayHealthResponse, GatewayState, HistoryResponse, router, run_http,
    validate_chat_request,
};
