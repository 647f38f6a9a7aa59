//! Check-approval tool: compares a total cost with a spending limit.

use async_trait::async_trait;
use quartermaster_core::error::ToolError;
use quartermaster_core::tool::{Tool, ToolResult};

pub const CHECK_APPROVAL: &str = "check_approval";

pub struct CheckApprovalTool;

/// `PAUSE` when `cost` is strictly above `limit`, otherwise `OK`.
pub fn check_approval(cost: f64, limit: f64) -> serde_json::Value {
    if cost > limit {
        serde_json::json!({
            "status": "PAUSE",
            "message": format!("Cost {cost} exceeds limit {limit}. Awaiting Manager Approval."),
        })
    } else {
        serde_json::json!({
            "status": "OK",
            "message": "Within limit.",
        })
    }
}

#[async_trait]
impl Tool for CheckApprovalTool {
    fn name(&self) -> &str {
        CHECK_APPROVAL
    }

    fn description(&self) -> &str {
        "Check whether a total cost exceeds a spending limit. Returns status PAUSE \
         (manager approval needed) or OK."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "cost": { "type": "number", "description": "Total cost of the order" },
                "limit": { "type": "number", "description": "Spending limit that applies" }
            },
            "required": ["cost", "limit"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let cost = arguments["cost"]
            .as_f64()
            .ok_or_else(|| ToolError::InvalidArguments("Missing numeric 'cost' argument".into()))?;
        let limit = arguments["limit"]
            .as_f64()
            .ok_or_else(|| ToolError::InvalidArguments("Missing numeric 'limit' argument".into()))?;

        let verdict = check_approval(cost, limit);
        Ok(ToolResult::ok(verdict.to_string()).with_data(verdict))
    }
}
