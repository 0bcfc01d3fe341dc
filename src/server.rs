//! MCP server exposing search, sidebar and regeneration tools.

use crate::config::Config;
use crate::error::QueryError;
use crate::generate::refresh;
use crate::item::ModulePath;
use crate::search::{QueryService, SearchRequest};
use crate::sidebar::{render_roots, render_sidebar};
use crate::snapshot::SnapshotStore;
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// DO NOT add doc comments to individual variants - this causes schemars to generate
/// `oneOf` schemas instead of simple `enum` arrays, breaking MCP client enum handling.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SidebarFormat {
    #[default]
    Json,
    Js,
    Text,
}

/// Parameters for the sidebar tool
#[derive(Debug, serde::Deserialize, JsonSchema)]
pub struct SidebarRequest {
    /// Module path such as `guild::automod`; omit to list top-level modules
    #[serde(default)]
    pub module: Option<String>,
    /// Output format: json (navigation tree), js (SIDEBAR_ITEMS script) or text outline
    #[serde(default)]
    pub format: SidebarFormat,
}

#[derive(Debug, Serialize)]
struct RegenerateResponse {
    snapshot: u64,
    fingerprint: String,
    entries: usize,
    modules: usize,
}

/// MCP server over the published documentation index.
#[derive(Clone)]
pub struct DocNavServer {
    config: Arc<Config>,
    store: Arc<SnapshotStore>,
    query: QueryService,
    /// Serializes regeneration runs; queries never wait on it.
    regenerating: Arc<Mutex<()>>,
    shutdown: CancellationToken,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for DocNavServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocNavServer")
            .field("store", &self.store)
            .field("inputs", &self.config.inputs)
            .finish()
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ErrorData> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ErrorData::internal_error(format!("Failed to encode response: {}", e), None))
}

fn query_error(err: QueryError) -> ErrorData {
    if err.is_client_error() {
        ErrorData::invalid_params(err.to_string(), None)
    } else {
        ErrorData::internal_error(err.to_string(), None)
    }
}

fn text(body: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(body)])
}

#[tool_router]
impl DocNavServer {
    pub fn new(
        config: Arc<Config>,
        store: Arc<SnapshotStore>,
        shutdown: CancellationToken,
    ) -> Self {
        let query = QueryService::new(Arc::clone(&store), config.search.clone());
        Self {
            config,
            store,
            query,
            regenerating: Arc::new(Mutex::new(())),
            shutdown,
            tool_router: Self::tool_router(),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    #[tool(
        description = "Search documented items by name. Matches are case-insensitive by prefix (or substring with mode=substring) and ranked exact match first, then shorter names, then types before functions before constants and macros. Supports offset/limit pagination; `total` counts all matches.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let response = self.query.search(&request).map_err(query_error)?;
        Ok(text(to_json(&response)?))
    }

    #[tool(
        description = "Show the navigation sidebar of a module: its items grouped by kind in sidebar order and its child modules. Without a module, lists the top-level modules.",
        input_schema = inline_schema_for_type::<SidebarRequest>()
    )]
    async fn sidebar(
        &self,
        Parameters(request): Parameters<SidebarRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let snapshot = self
            .store
            .current()
            .ok_or_else(|| query_error(QueryError::NotReady))?;
        let global = snapshot.global();

        let Some(module) = request.module.as_deref().filter(|m| !m.trim().is_empty()) else {
            return Ok(text(to_json(&render_roots(global))?));
        };
        let module = ModulePath::parse(module)
            .map_err(|e| ErrorData::invalid_params(e.to_string(), None))?;
        let tree = render_sidebar(global, &module).ok_or_else(|| {
            ErrorData::invalid_params(format!("Unknown module `{}`", module), None)
        })?;

        let body = match request.format {
            SidebarFormat::Json => to_json(&tree)?,
            SidebarFormat::Js => tree.to_sidebar_items().to_js(),
            SidebarFormat::Text => tree.to_string(),
        };
        Ok(text(body))
    }

    #[tool(
        description = "Re-read the configured analyzer inputs and atomically publish a new index. On failure the current index stays live and the error is returned."
    )]
    async fn regenerate(&self) -> Result<CallToolResult, ErrorData> {
        let _guard = self.regenerating.lock().await;
        let cancel = self.shutdown.child_token();
        let snapshot = refresh(&self.config, &self.store, &cancel)
            .await
            .map_err(|e| ErrorData::internal_error(format!("{:#}", e), None))?;

        Ok(text(to_json(&RegenerateResponse {
            snapshot: snapshot.version(),
            fingerprint: format!("{:016x}", snapshot.fingerprint()),
            entries: snapshot.global().len(),
            modules: snapshot.global().module_tree().len(),
        })?))
    }
}

#[tool_handler]
impl ServerHandler for DocNavServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "docnav: documentation navigation and search. Use `search` to find items by name, \
                 `sidebar` to browse a module's items and submodules, and `regenerate` after the \
                 analyzer output changes."
                    .to_string(),
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// to generate inline enum definitions instead of $ref patterns. This ensures MCP Inspector
/// displays enums as dropdown widgets rather than raw JSON input fields.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(object)) => object,
        Ok(_) | Err(_) => JsonObject::new(),
    };

    Arc::new(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn test_search_schema_inlines_match_mode() {
        let schema = inline_schema_for_type::<SearchRequest>();
        let mode = &schema["properties"]["mode"];
        check!(mode.get("$ref").is_none());
        check!(schema["properties"].get("query").is_some());
    }

    #[test]
    fn test_sidebar_format_defaults_to_json() {
        let request: SidebarRequest = serde_json::from_str(r#"{"module": "guild"}"#).unwrap();
        check!(request.format == SidebarFormat::Json);
        check!(request.module.as_deref() == Some("guild"));
    }

    #[test]
    fn test_invalid_page_is_invalid_params() {
        let err = query_error(QueryError::InvalidPage(crate::error::InvalidPageError {
            offset: -1,
            limit: 10,
        }));
        check!(err.code == ErrorCode::INVALID_PARAMS);
        check!(query_error(QueryError::NotReady).code == ErrorCode::INTERNAL_ERROR);
    }
}
