use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::RunCodeError;

pub const DEFAULT_ELEMENT_NAME: &str = "CustomBehavior";
pub const DEFAULT_DISCRIMINATOR_ATTR: &str = "File";
pub const DEFAULT_ENGINE_ID: &str = "RunCode";
pub const DEFAULT_TYPE_ATTR: &str = "Type";
pub const DEFAULT_DEFINITION_TOKEN: &str = "Definition";
pub const DEFAULT_CODE_ATTR: &str = "Code";
pub const DEFAULT_MAX_OPERATIONS: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunCodeOptions {
    pub element_name: String,
    pub discriminator_attr: String,
    pub engine_id: String,
    pub type_attr: String,
    pub definition_token: String,
    pub code_attr: String,
    pub scratch_dir: Option<PathBuf>,
    // 0 = unlimited
    pub max_operations: u64,
}

impl Default for RunCodeOptions {
    fn default() -> Self {
        Self {
            element_name: DEFAULT_ELEMENT_NAME.to_string(),
            discriminator_attr: DEFAULT_DISCRIMINATOR_ATTR.to_string(),
            engine_id: DEFAULT_ENGINE_ID.to_string(),
            type_attr: DEFAULT_TYPE_ATTR.to_string(),
            definition_token: DEFAULT_DEFINITION_TOKEN.to_string(),
            code_attr: DEFAULT_CODE_ATTR.to_string(),
            scratch_dir: None,
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

impl RunCodeOptions {
    pub fn validate(&self) -> Result<(), RunCodeError> {
        let required = [
            ("elementName", &self.element_name),
            ("discriminatorAttr", &self.discriminator_attr),
            ("engineId", &self.engine_id),
            ("typeAttr", &self.type_attr),
            ("definitionToken", &self.definition_token),
            ("codeAttr", &self.code_attr),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(RunCodeError::new(
                    "CONFIG_FIELD_EMPTY",
                    format!("Option \"{}\" must not be empty.", name),
                ));
            }
        }
        Ok(())
    }
}
