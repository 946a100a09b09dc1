// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::api::{EffectsPageResponse, EffectsParams, LastEventId};
use crate::config::NodeConfig;
use crate::errors::NodeError;
use crate::history::MemoryHistory;
use crate::resource::HalEffectAssembler;
use crate::stream::{run_effect_stream, PollTrigger, SseSink};
use crate::telemetry::{PAGES_SERVED, PAGE_LOAD_SECONDS, STREAMS_OPENED};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts},
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use axum_extra::TypedHeader;
use futures::StreamExt;
use ledger_effects::assemble::AssemblyContext;
use ledger_effects::page::PageSpec;
use ledger_effects::responder::{effects_page, StreamResponder};
use ledger_effects::scope::{ScopeParams, ScopeResolver};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub history: Arc<MemoryHistory>,
    pub config: Arc<NodeConfig>,
    pub resolver: ScopeResolver,
    /// Cancelled on shutdown; every stream holds a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(history: Arc<MemoryHistory>, config: NodeConfig) -> Self {
        Self {
            history,
            resolver: ScopeResolver::new(config.allow_unscoped),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/effects", get(all_effects))
        .route("/accounts/:account_id/effects", get(account_effects))
        .route("/ledgers/:ledger_id/effects", get(ledger_effects))
        .route("/operations/:op_id/effects", get(operation_effects))
        .route("/transactions/:tx_hash/effects", get(transaction_effects))
        // Observability
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Everything an effects endpoint reads from the request besides its path scope.
pub struct EffectsRequest {
    params: EffectsParams,
    last_event_id: Option<String>,
    wants_stream: bool,
    base_url: String,
    path: String,
}

#[async_trait]
impl FromRequestParts<AppState> for EffectsRequest {
    type Rejection = NodeError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<EffectsParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| NodeError::InvalidInput(e.body_text()))?;

        let last_event_id = match Option::<TypedHeader<LastEventId>>::from_request_parts(parts, state).await {
            Ok(header) => header.map(|TypedHeader(LastEventId(id))| id),
            Err(never) => match never {},
        };

        let header_str = |name: header::HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let wants_stream = header_str(header::ACCEPT).is_some_and(|v| v.contains("text/event-stream"));
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http")
            .to_string();
        let host = header_str(header::HOST).unwrap_or_else(|| state.config.bind_addr.to_string());

        Ok(Self {
            params,
            last_event_id,
            wants_stream,
            base_url: format!("{scheme}://{host}"),
            path: parts.uri.path().to_string(),
        })
    }
}

async fn all_effects(State(state): State<AppState>, req: EffectsRequest) -> Result<Response, NodeError> {
    serve_effects(state, ScopeParams::default(), req).await
}

async fn account_effects(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    req: EffectsRequest,
) -> Result<Response, NodeError> {
    let scope = ScopeParams {
        account_id: Some(account_id),
        ..Default::default()
    };
    serve_effects(state, scope, req).await
}

async fn ledger_effects(
    State(state): State<AppState>,
    Path(ledger_id): Path<String>,
    req: EffectsRequest,
) -> Result<Response, NodeError> {
    let ledger_id = match ledger_id.parse::<u32>() {
        Ok(seq) if seq > 0 => seq,
        _ => {
            return Err(NodeError::InvalidInput(format!(
                "ledger_id {ledger_id:?} is not a ledger sequence"
            )))
        }
    };
    let scope = ScopeParams {
        ledger_id: Some(ledger_id),
        ..Default::default()
    };
    serve_effects(state, scope, req).await
}

async fn operation_effects(
    State(state): State<AppState>,
    Path(op_id): Path<String>,
    req: EffectsRequest,
) -> Result<Response, NodeError> {
    let op_id = match op_id.parse::<i64>() {
        Ok(id) if id > 0 => id,
        _ => {
            return Err(NodeError::InvalidInput(format!(
                "op_id {op_id:?} is not an operation id"
            )))
        }
    };
    let scope = ScopeParams {
        operation_id: Some(op_id),
        ..Default::default()
    };
    serve_effects(state, scope, req).await
}

async fn transaction_effects(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
    req: EffectsRequest,
) -> Result<Response, NodeError> {
    let scope = ScopeParams {
        transaction_hash: Some(tx_hash),
        ..Default::default()
    };
    serve_effects(state, scope, req).await
}

/// Path identifiers and query identifiers together; any slot filled twice is rejected.
fn merge_scope(path: ScopeParams, query: ScopeParams) -> Result<ScopeParams, NodeError> {
    fn pick<T>(name: &str, a: Option<T>, b: Option<T>) -> Result<Option<T>, NodeError> {
        match (a, b) {
            (Some(_), Some(_)) => Err(NodeError::InvalidInput(format!("{name} supplied more than once"))),
            (a, b) => Ok(a.or(b)),
        }
    }
    Ok(ScopeParams {
        account_id: pick("account_id", path.account_id, query.account_id)?,
        operation_id: pick("op_id", path.operation_id, query.operation_id)?,
        transaction_hash: pick("tx_hash", path.transaction_hash, query.transaction_hash)?,
        ledger_id: pick("ledger_id", path.ledger_id, query.ledger_id)?,
    })
}

async fn serve_effects(state: AppState, path_scope: ScopeParams, req: EffectsRequest) -> Result<Response, NodeError> {
    let scope_params = merge_scope(path_scope, req.params.scope_params())?;
    let scope = state.resolver.resolve(&scope_params)?;

    let cursor = match (&req.last_event_id, req.wants_stream) {
        (Some(id), true) => Some(id.as_str()),
        _ => req.params.cursor.as_deref(),
    };
    let page = PageSpec::from_params(
        cursor,
        req.params.order.as_deref(),
        req.params.limit,
        &state.config.page_limits,
    )?;
    let requested_cursor = cursor.unwrap_or_default().to_string();
    let ctx = AssemblyContext::new(req.base_url);

    if req.wants_stream {
        let (mut sink, rx) = SseSink::channel();
        let responder = StreamResponder::open(&*state.history, &mut sink, HalEffectAssembler, ctx, scope, page)?;
        tracing::info!(scope = ?responder.scope(), limit = page.limit(), "Stream: opened on {}", req.path);
        metrics::counter!(STREAMS_OPENED, 1);

        sink.announce(state.config.stream_retry);
        let trigger = PollTrigger::new(state.config.stream_poll_interval, state.history.subscribe());
        tokio::spawn(run_effect_stream(
            state.history.clone(),
            responder,
            sink,
            trigger,
            state.shutdown.child_token(),
        ));

        let events = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);
        return Ok(Sse::new(events).keep_alive(KeepAlive::default()).into_response());
    }

    let started = Instant::now();
    let page = effects_page(
        &*state.history,
        &HalEffectAssembler,
        &ctx,
        &scope,
        &page,
        &requested_cursor,
    )?;
    metrics::histogram!(PAGE_LOAD_SECONDS, started.elapsed().as_secs_f64());
    metrics::counter!(PAGES_SERVED, 1);
    tracing::debug!("Served {} effects for {}", page.len(), req.path);

    Ok(Json(EffectsPageResponse::from_page(page, &ctx.base_url, &req.path)).into_response())
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
