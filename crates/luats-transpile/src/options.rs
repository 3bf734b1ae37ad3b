//! Transform configuration.

use serde::{Deserialize, Serialize};

/// Options recognized by the transformer.
///
/// Immutable for the duration of a transform; each file gets its own copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Options {
    /// Report best-effort semantic-soundness warnings.
    pub show_semantic_errors: bool,
    /// Emit an importable ES module rather than a script.
    pub module: bool,
    /// Lower the chunk as a single exported class.
    pub classmod: bool,
}

impl Options {
    /// Whether the output must be an ES module.
    pub fn emits_module(&self) -> bool {
        self.module || self.classmod
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let options: Options =
            serde_json::from_str(r#"{ "showSemanticErrors": true, "classmod": true }"#).unwrap();
        assert!(options.show_semantic_errors);
        assert!(!options.module);
        assert!(options.classmod);
        assert!(options.emits_module());
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(serde_json::from_str::<Options>(r#"{ "target": "es5" }"#).is_err());
    }
}
