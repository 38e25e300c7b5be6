//! Middleware components for HTTP request processing

pub mod gate;
pub mod trace;

pub use gate::{
    GateDecision, RouteGateConfig, evaluate, get_cookie, is_asset_path, route_gate_middleware,
};
pub use trace::trace_middleware;
