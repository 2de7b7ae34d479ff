use crate::models::Region;
use crate::utils::FormscanError;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

// Older template files nest the coordinates one level down under this key
const NESTED_REGION_KEY: &str = "bounding_box_actual";
const COORDINATE_KEYS: [&str; 4] = ["x1", "y1", "x2", "y2"];

/// A named document layout: where each field lives on the page. Fields keep
/// the order of the template file.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub fields: IndexMap<String, Region>,
}

/// All known templates, keyed by name. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new(templates: Vec<Template>) -> Self {
        TemplateRegistry {
            templates: templates.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FormscanError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FormscanError::config(format!("Failed to read template file {:?}: {}", path, e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parses `{ template: { field: {x1,y1,x2,y2} } }`. Each region may also be
    /// wrapped as `{ "bounding_box_actual": {x1,y1,x2,y2} }`.
    pub fn from_json_str(contents: &str) -> Result<Self, FormscanError> {
        let root: Value = serde_json::from_str(contents).map_err(|e| {
            FormscanError::config(format!(
                "Invalid template JSON at line {}, column {}: {}",
                e.line(),
                e.column(),
                e
            ))
        })?;
        let root = root
            .as_object()
            .ok_or_else(|| FormscanError::config("Template file must be a JSON object"))?;

        let mut templates = Vec::with_capacity(root.len());
        for (name, entry) in root {
            let entry = entry.as_object().ok_or_else(|| {
                FormscanError::config(format!("Template '{}' must map field names to regions", name))
            })?;
            let mut fields = IndexMap::with_capacity(entry.len());
            for (field, value) in entry {
                fields.insert(field.clone(), parse_region(name, field, value)?);
            }
            templates.push(Template {
                name: name.clone(),
                fields,
            });
        }

        Ok(Self::new(templates))
    }

    pub fn get(&self, name: &str) -> Result<&Template, FormscanError> {
        self.templates
            .get(name)
            .ok_or_else(|| FormscanError::config(format!("Unknown template: {}", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn parse_region(template: &str, field: &str, value: &Value) -> Result<Region, FormscanError> {
    let object = value
        .as_object()
        .ok_or_else(|| FormscanError::config(format!("Template '{}' field '{}' is not an object", template, field)))?;
    let coords: &Map<String, Value> = match object.get(NESTED_REGION_KEY) {
        Some(nested) => nested.as_object().ok_or_else(|| {
            FormscanError::config(format!(
                "Template '{}' field '{}': '{}' is not an object",
                template, field, NESTED_REGION_KEY
            ))
        })?,
        None => object,
    };

    let mut values = [0u32; 4];
    for (slot, key) in values.iter_mut().zip(COORDINATE_KEYS) {
        let raw = coords.get(key).ok_or_else(|| {
            FormscanError::config(format!(
                "Template '{}' field '{}' is missing coordinate '{}'",
                template, field, key
            ))
        })?;
        *slot = raw
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                FormscanError::config(format!(
                    "Template '{}' field '{}': coordinate '{}' must be a non-negative integer, got {}",
                    template, field, key, raw
                ))
            })?;
    }

    let [x1, y1, x2, y2] = values;
    if x1 >= x2 || y1 >= y2 {
        return Err(FormscanError::config(format!(
            "Template '{}' field '{}': region must satisfy x1 < x2 and y1 < y2, got ({}, {}, {}, {})",
            template, field, x1, y1, x2, y2
        )));
    }

    Ok(Region::new(x1, y1, x2, y2))
}

lazy_static! {
    static ref TEMPLATE_CACHE: RwLock<Option<Arc<TemplateRegistry>>> = RwLock::new(None);
}

/// Process-wide read-only template registry. Only `load`/`install` replace it;
/// nothing invalidates it implicitly.
pub struct TemplateCache;

impl TemplateCache {
    /// Reads the template file and makes it the current registry.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Arc<TemplateRegistry>, FormscanError> {
        let registry = TemplateRegistry::from_file(path)?;
        Self::install(registry)
    }

    pub fn install(registry: TemplateRegistry) -> Result<Arc<TemplateRegistry>, FormscanError> {
        let registry = Arc::new(registry);
        let mut slot = TEMPLATE_CACHE
            .write()
            .map_err(|_| FormscanError::config("Template cache lock poisoned"))?;
        *slot = Some(Arc::clone(&registry));
        log::info!("Template cache holds {} template(s)", registry.len());
        Ok(registry)
    }

    pub fn current() -> Result<Arc<TemplateRegistry>, FormscanError> {
        let slot = TEMPLATE_CACHE
            .read()
            .map_err(|_| FormscanError::config("Template cache lock poisoned"))?;
        (*slot)
            .clone()
            .ok_or_else(|| FormscanError::config("No templates loaded"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEMPLATES: &str = r#"{
        "tnb_bill": {
            "account_no": {"x1": 10, "y1": 10, "x2": 50, "y2": 30},
            "amount": {"bounding_box_actual": {"x1": 100, "y1": 40, "x2": 180, "y2": 60}}
        },
        "receipt": {
            "total": {"x1": 0, "y1": 0, "x2": 5, "y2": 5}
        }
    }"#;

    #[test]
    fn test_load_bare_and_nested_regions() {
        let registry = TemplateRegistry::from_json_str(TEMPLATES).unwrap();
        assert_eq!(registry.len(), 2);

        let bill = registry.get("tnb_bill").unwrap();
        assert_eq!(bill.fields["account_no"], Region::new(10, 10, 50, 30));
        assert_eq!(bill.fields["amount"], Region::new(100, 40, 180, 60));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["receipt", "tnb_bill"]);
    }

    #[test]
    fn test_unknown_template_is_configuration_error() {
        let registry = TemplateRegistry::from_json_str(TEMPLATES).unwrap();
        match registry.get("insurance_claim") {
            Err(FormscanError::Configuration(msg)) => assert!(msg.contains("insurance_claim")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_coordinate_is_fatal() {
        let err = TemplateRegistry::from_json_str(r#"{"t": {"name": {"x1": 1, "y1": 1, "x2": 5}}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("missing coordinate 'y2'"));
    }

    #[test]
    fn test_negative_coordinate_is_rejected() {
        let err = TemplateRegistry::from_json_str(r#"{"t": {"name": {"x1": -1, "y1": 1, "x2": 5, "y2": 6}}}"#)
            .unwrap_err();
        assert!(matches!(err, FormscanError::Configuration(_)));
    }

    #[test]
    fn test_inverted_region_fails_load() {
        let err = TemplateRegistry::from_json_str(r#"{"t": {"f": {"x1": 50, "y1": 10, "x2": 20, "y2": 30}}}"#)
            .unwrap_err();
        match err {
            FormscanError::Configuration(msg) => {
                assert!(msg.contains("Template 't' field 'f'"));
                assert!(msg.contains("x1 < x2"));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_height_region_fails_load() {
        let err = TemplateRegistry::from_json_str(
            r#"{"t": {"f": {"bounding_box_actual": {"x1": 5, "y1": 30, "x2": 20, "y2": 30}}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FormscanError::Configuration(_)));
    }

    #[test]
    fn test_fields_keep_file_order() {
        let registry = TemplateRegistry::from_json_str(
            r#"{"t": {
                "total": {"x1": 0, "y1": 0, "x2": 5, "y2": 5},
                "account_no": {"x1": 0, "y1": 10, "x2": 5, "y2": 15},
                "date": {"x1": 0, "y1": 20, "x2": 5, "y2": 25}
            }}"#,
        )
        .unwrap();
        let fields: Vec<&str> = registry.get("t").unwrap().fields.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["total", "account_no", "date"]);
    }

    #[test]
    fn test_cache_reload_replaces_registry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEMPLATES.as_bytes()).unwrap();

        let loaded = TemplateCache::load(file.path()).unwrap();
        assert!(loaded.get("receipt").is_ok());
        assert_eq!(TemplateCache::current().unwrap().len(), 2);

        TemplateCache::install(TemplateRegistry::new(vec![Template {
            name: "only".to_string(),
            fields: IndexMap::new(),
        }]))
        .unwrap();
        let current = TemplateCache::current().unwrap();
        assert_eq!(current.len(), 1);
        // Earlier handles stay valid after a reload
        assert_eq!(loaded.len(), 2);
    }
}
