//! The tool catalogue
//!
//! Single source of truth for what the gateway accepts. The MCP
//! `tools/list` answer and the REST `/tools` document are both produced by
//! [`Catalogue::mcp_tools`].

use crate::error::CatalogueError;
use crate::models::ToolDescriptor;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Catalogue {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl Catalogue {
    /// Builds the catalogue, adding the `instance` selector to every tool
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self, CatalogueError> {
        let mut index = HashMap::with_capacity(tools.len());
        let mut descriptors = Vec::with_capacity(tools.len());

        for tool in tools {
            if index.contains_key(tool.name()) {
                return Err(CatalogueError::DuplicateTool(tool.name().to_string()));
            }
            index.insert(tool.name().to_string(), descriptors.len());
            descriptors.push(tool.with_instance_selector());
        }

        Ok(Self {
            tools: descriptors,
            index,
        })
    }

    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Catalogue in MCP wire form, in declaration order
    pub fn mcp_tools(&self) -> Vec<rmcp::model::Tool> {
        self.tools.iter().map(ToolDescriptor::to_mcp_tool).collect()
    }
}
