//! Vendor search tool: finds vendors and unit prices for a product.
//!
//! The catalog is an external collaborator behind [`VendorCatalog`]. The
//! stock implementation reads a JSON array of `{vendor, product, price}`
//! from disk on every lookup, so edits to the file show up immediately.

use async_trait::async_trait;
use quartermaster_core::error::ToolError;
use quartermaster_core::procurement::Vendor;
use quartermaster_core::tool::{Tool, ToolResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Tool name as the model sees it.
pub const SEARCH_VENDORS: &str = "search_vendors";

/// A source of vendor offers.
#[async_trait]
pub trait VendorCatalog: Send + Sync {
    /// Every offer in the catalog.
    async fn all(&self) -> Result<Vec<Vendor>, ToolError>;

    /// Offers whose product contains `product_name`, case-insensitively.
    async fn search(&self, product_name: &str) -> Result<Vec<Vendor>, ToolError> {
        let needle = product_name.to_lowercase();
        Ok(self
            .all()
            .await?
            .into_iter()
            .filter(|v| v.product.to_lowercase().contains(&needle))
            .collect())
    }
}

/// Catalog backed by a JSON file.
pub struct JsonVendorCatalog {
    path: PathBuf,
}

impl JsonVendorCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl VendorCatalog for JsonVendorCatalog {
    async fn all(&self) -> Result<Vec<Vendor>, ToolError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: SEARCH_VENDORS.into(),
                reason: format!("Failed to read vendor catalog {}: {e}", self.path.display()),
            })?;
        serde_json::from_str(&content).map_err(|e| ToolError::ExecutionFailed {
            tool_name: SEARCH_VENDORS.into(),
            reason: format!("Invalid vendor catalog {}: {e}", self.path.display()),
        })
    }
}

/// Fixed in-memory catalog.
pub struct StaticVendorCatalog(pub Vec<Vendor>);

#[async_trait]
impl VendorCatalog for StaticVendorCatalog {
    async fn all(&self) -> Result<Vec<Vendor>, ToolError> {
        Ok(self.0.clone())
    }
}

pub struct VendorSearchTool {
    catalog: Arc<dyn VendorCatalog>,
}

impl VendorSearchTool {
    pub fn new(catalog: Arc<dyn VendorCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for VendorSearchTool {
    fn name(&self) -> &str {
        SEARCH_VENDORS
    }

    fn description(&self) -> &str {
        "Find vendors supplying a product, with their unit prices. \
         Input: product name (e.g. 'cement'). Output: JSON array of vendors."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "product_name": {
                    "type": "string",
                    "description": "The product to look up, e.g. 'cement'"
                }
            },
            "required": ["product_name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let product = arguments["product_name"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'product_name' argument".into()))?;

        let matches = self.catalog.search(product).await?;
        debug!(product = %product, matches = matches.len(), "Vendor search");

        let output = serde_json::to_string_pretty(&matches).map_err(|e| ToolError::ExecutionFailed {
            tool_name: SEARCH_VENDORS.into(),
            reason: e.to_string(),
        })?;
        let data = serde_json::to_value(&matches).unwrap_or_default();
        Ok(ToolResult::ok(output).with_data(data))
    }
}
