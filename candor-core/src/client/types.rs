/// A request object encapsulating all necessary information to perform a dynamic call.
#[derive(Debug, Clone)]
pub struct DynamicRequest {
    /// The name of the method to call (e.g., `icrc1_balance_of`).
    pub method: String,
    /// One JSON value per declared argument, in order.
    pub args: Vec<serde_json::Value>,
}

impl DynamicRequest {
    pub fn new(method: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// The result of a dynamic call.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicResponse {
    /// The decoded results, one JSON value per declared result type.
    Reply(Vec<serde_json::Value>),
    /// The method is oneway: the call was accepted and no reply is expected.
    Oneway,
}
