//! Application services for bridge sessions.

mod session;

pub use session::{
    BridgeBootstrap, BridgeSessionError, BridgeSessionResult, BridgeSessionService,
    DEFAULT_TOOL_CALL_TIMEOUT, ToolCall,
};
