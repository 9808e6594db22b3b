//! Loading a complete API description.
//!
//! A description file lists the types to bind together with the enums,
//! structs, delegates and event-args types they use. TOML and JSON are both
//! accepted; the format is chosen from the file extension.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::{
    DelegateDescriptor, EnumDescriptor, EventArgsDescriptor, ExternalDescriptor,
    StructDescriptor, TypeDescriptor,
};
use crate::error::{ModelError, Result};

/// The declared API surface of one binding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ApiDescription {
    pub types: Vec<TypeDescriptor>,
    pub enums: Vec<EnumDescriptor>,
    pub structs: Vec<StructDescriptor>,
    pub delegates: Vec<DelegateDescriptor>,
    pub event_args: Vec<EventArgsDescriptor>,
    /// Types bound elsewhere that members refer to.
    #[serde(rename = "external")]
    pub externals: Vec<ExternalDescriptor>,
}

impl ApiDescription {
    /// Parse a description from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let desc: ApiDescription = toml::from_str(input)?;
        desc.validate()?;
        Ok(desc)
    }

    /// Parse a description from a JSON string.
    pub fn parse_json(input: &str) -> Result<Self> {
        let desc: ApiDescription = serde_json::from_str(input)?;
        desc.validate()?;
        Ok(desc)
    }

    /// Load a description file, choosing the format from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        tracing::debug!(path = %path.display(), json = is_json, "loading API description");
        if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Check that every declaration is named and no full name repeats.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let names = self
            .types
            .iter()
            .map(|t| (t.name.as_str(), t.full_name()))
            .chain(self.enums.iter().map(|e| (e.name.as_str(), e.full_name())))
            .chain(self.structs.iter().map(|s| (s.name.as_str(), s.full_name())))
            .chain(self.delegates.iter().map(|d| (d.name.as_str(), d.full_name())))
            .chain(self.event_args.iter().map(|e| (e.name.as_str(), e.full_name())))
            .chain(self.externals.iter().map(|e| (e.name.as_str(), e.full_name())));

        for (short, full) in names {
            if short.trim().is_empty() {
                return Err(ModelError::InvalidDescription {
                    detail: "a declaration has an empty name".to_string(),
                });
            }
            if !seen.insert(full.clone()) {
                return Err(ModelError::InvalidDescription {
                    detail: format!("'{full}' is declared more than once"),
                });
            }
        }

        for t in &self.types {
            for m in &t.members {
                if m.name().trim().is_empty() {
                    return Err(ModelError::InvalidDescription {
                        detail: format!("a member of '{}' has an empty name", t.full_name()),
                    });
                }
            }
        }
        Ok(())
    }

    /// Find a declared type by full name.
    pub fn find_type(&self, full_name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| t.full_name() == full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[types]]
name = "Widget"
namespace = "Demo"
base = "NSObject"
protocols = ["P1"]

[[types.members]]
kind = "method"
name = "Foo"
export = "foo"
returns = "int"

[[types]]
name = "P1"
namespace = "Demo"
protocol = true

[[enums]]
name = "Mode"
namespace = "Demo"
values = [{ name = "A", value = 0 }]

[[structs]]
name = "Quad"
namespace = "Demo"
fields = [
    { name = "a", type = "int" },
    { name = "b", type = "int" },
]
"#;

    #[test]
    fn parse_sample() {
        let desc = ApiDescription::parse(SAMPLE).unwrap();
        assert_eq!(desc.types.len(), 2);
        assert_eq!(desc.enums.len(), 1);
        assert_eq!(desc.structs[0].fields.len(), 2);
        assert!(desc.find_type("Demo.Widget").is_some());
        assert!(desc.find_type("Widget").is_none());
    }

    #[test]
    fn reject_duplicates() {
        let input = r#"
[[types]]
name = "Widget"
namespace = "Demo"

[[enums]]
name = "Widget"
namespace = "Demo"
"#;
        let err = ApiDescription::parse(input).unwrap_err();
        assert_eq!(err.code(), 1064);
        assert!(err.to_string().contains("Demo.Widget"));
    }

    #[test]
    fn reject_empty_names() {
        let err = ApiDescription::parse("[[types]]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, ModelError::InvalidDescription { .. }));
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("api.toml");
        std::fs::write(&toml_path, SAMPLE).unwrap();
        assert_eq!(ApiDescription::load(&toml_path).unwrap().types.len(), 2);

        let json_path = dir.path().join("api.json");
        std::fs::write(
            &json_path,
            r#"{ "types": [ { "name": "Gadget", "namespace": "Demo", "base": "NSObject" } ] }"#,
        )
        .unwrap();
        let desc = ApiDescription::load(&json_path).unwrap();
        assert_eq!(desc.types[0].name, "Gadget");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ApiDescription::load(&dir.path().join("nope.toml")).unwrap_err();
        assert_eq!(err.code(), 1070);
    }
}
