//! Current local time tool.

use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Value};

use crate::error::Result;

use super::{Tool, ToolContext};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns the current local date and time.
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "현재 날짜와 시간을 알려줍니다."
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "current_time": Local::now().format(TIME_FORMAT).to_string() }))
    }
}
