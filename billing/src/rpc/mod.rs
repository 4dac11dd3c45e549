// Copyright (c) 2024 Botho Foundation

//! JSON-RPC Server for the billing ledger
//!
//! Exposes the ledger operations as JSON-RPC 2.0 methods over HTTP POST:
//!
//! | Method                 | Params                              |
//! |------------------------|-------------------------------------|
//! | `users_list`           | none                                |
//! | `coins_emission`       | `{ "amount" }`                      |
//! | `coins_move`           | `{ "srcUser", "dstUser", "amount" }` |
//! | `coins_longestHistory` | none                                |
//!
//! Emission and transfer always answer with `{ "status", "comment" }`;
//! a refused operation is a `"Failed"` status, not a JSON-RPC error.

use anyhow::Result;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes, server::conn::http1, service::service_fn, Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::ledger::{LedgerError, SharedLedger};

/// JSON-RPC parse error code
const PARSE_ERROR: i32 = -32700;
/// JSON-RPC method not found error code
const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC invalid params error code
const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC internal error code
const INTERNAL_ERROR: i32 = -32603;
/// Application error: the query has no answer yet
const NOT_FOUND: i32 = -32000;

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

/// JSON-RPC error
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, code: i32, message: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
            id,
        }
    }

    fn with_id(mut self, id: Value) -> Self {
        self.id = id;
        self
    }
}

/// Coarse outcome of an emission or transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ok,
    Failed,
}

/// Result body of `coins_emission` and `coins_move`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResponse {
    pub status: Status,
    pub comment: String,
}

impl OperationResponse {
    pub fn ok(comment: &str) -> Self {
        Self {
            status: Status::Ok,
            comment: comment.to_string(),
        }
    }

    pub fn failed(err: &LedgerError) -> Self {
        Self {
            status: Status::Failed,
            comment: err.reason(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmissionParams {
    amount: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveCoinsParams {
    src_user: String,
    dst_user: String,
    amount: u64,
}

/// Shared RPC state
pub struct RpcState {
    pub ledger: SharedLedger,
    pub start_time: std::time::Instant,
}

impl RpcState {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Start the RPC server
pub async fn start_rpc_server(addr: SocketAddr, state: Arc<RpcState>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("RPC server listening on {}", addr);
    serve(listener, state).await
}

/// Serve connections from an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<RpcState>) -> Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(|req| handle_request(req, state.clone()));

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<RpcState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    if req.method() == Method::GET && req.uri().path() == "/health" {
        let body = json!({
            "status": "ok",
            "uptimeSeconds": state.start_time.elapsed().as_secs(),
        });
        return Ok(plain_response(
            StatusCode::OK,
            "application/json",
            body.to_string(),
        ));
    }

    // Only accept POST for JSON-RPC
    if req.method() != Method::POST {
        return Ok(plain_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "text/plain",
            "Method not allowed".to_string(),
        ));
    }

    let body_bytes = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("Failed to read request body: {}", e);
            return Ok(plain_response(
                StatusCode::BAD_REQUEST,
                "text/plain",
                "Failed to read body".to_string(),
            ));
        }
    };

    let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
        Ok(req) => req,
        Err(e) => {
            error!("Failed to parse JSON-RPC request: {}", e);
            let response = JsonRpcResponse::error(Value::Null, PARSE_ERROR, "Parse error");
            return Ok(json_response(response));
        }
    };

    debug!(
        "RPC request: {} (id: {})",
        rpc_request.method, rpc_request.id
    );

    Ok(json_response(handle_rpc_method(&rpc_request, &state)))
}

/// Dispatch a parsed request to its handler
pub fn handle_rpc_method(request: &JsonRpcRequest, state: &RpcState) -> JsonRpcResponse {
    let id = request.id.clone();

    match request.method.as_str() {
        "users_list" => handle_list_users(id, state),
        "coins_emission" => handle_emission(id, &request.params, state),
        "coins_move" => handle_move_coins(id, &request.params, state),
        "coins_longestHistory" => handle_longest_history(id, state),
        _ => JsonRpcResponse::error(
            id,
            METHOD_NOT_FOUND,
            &format!("Method not found: {}", request.method),
        ),
    }
}

// Handler implementations

fn handle_list_users(id: Value, state: &RpcState) -> JsonRpcResponse {
    match state.ledger.list_users() {
        Ok(users) => {
            let users: Vec<Value> = users
                .into_iter()
                .map(|u| json!({ "name": u.name, "amount": u.amount }))
                .collect();
            JsonRpcResponse::success(id, Value::Array(users))
        }
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, &e.to_string()),
    }
}

fn handle_emission(id: Value, params: &Value, state: &RpcState) -> JsonRpcResponse {
    let params: EmissionParams = match parse_params(params) {
        Ok(p) => p,
        Err(response) => return response.with_id(id),
    };

    operation_response(
        id,
        state
            .ledger
            .emit(params.amount)
            .map(|_| "Emission successful"),
    )
}

fn handle_move_coins(id: Value, params: &Value, state: &RpcState) -> JsonRpcResponse {
    let params: MoveCoinsParams = match parse_params(params) {
        Ok(p) => p,
        Err(response) => return response.with_id(id),
    };

    operation_response(
        id,
        state
            .ledger
            .transfer(&params.src_user, &params.dst_user, params.amount)
            .map(|_| "Transaction successful"),
    )
}

fn handle_longest_history(id: Value, state: &RpcState) -> JsonRpcResponse {
    match state.ledger.longest_history_coin() {
        Ok(coin) => JsonRpcResponse::success(
            id,
            json!({
                "id": coin.id,
                "history": coin.history(),
            }),
        ),
        Err(LedgerError::NoCoins) => {
            JsonRpcResponse::error(id, NOT_FOUND, "No coins have been minted")
        }
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, &e.to_string()),
    }
}

/// Fold a ledger outcome into a `{status, comment}` result. Only internal
/// failures become JSON-RPC errors.
fn operation_response(id: Value, result: Result<&str, LedgerError>) -> JsonRpcResponse {
    let body = match result {
        Ok(comment) => OperationResponse::ok(comment),
        Err(LedgerError::LockPoisoned) => {
            return JsonRpcResponse::error(id, INTERNAL_ERROR, "Internal error: lock poisoned")
        }
        Err(e) => OperationResponse::failed(&e),
    };

    match serde_json::to_value(body) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, &e.to_string()),
    }
}

fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, JsonRpcResponse> {
    serde_json::from_value(params.clone()).map_err(|e| {
        JsonRpcResponse::error(
            Value::Null,
            INVALID_PARAMS,
            &format!("Invalid params: {}", e),
        )
    })
}

fn json_response(response: JsonRpcResponse) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(&response).unwrap_or_default();
    plain_response(StatusCode::OK, "application/json", body)
}

fn plain_response(status: StatusCode, content_type: &str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    if let Ok(value) = content_type.parse() {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_TYPE, value);
    }
    response
}
