//! Immutable captures of the execution state.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::host::{HostResult, Interpreter, Value};

/// The execution state at one directive.
///
/// Taken once, right after the code preceding the directive (and the
/// directive's own payload, for executing kinds) has run. Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    line: usize,
    bindings: BTreeMap<String, Value>,
    output: String,
    code: String,
    artifacts: Vec<PathBuf>,
}

impl Snapshot {
    pub(crate) fn new(
        line: usize,
        bindings: BTreeMap<String, Value>,
        output: String,
        code: String,
        artifacts: Vec<PathBuf>,
    ) -> Self {
        Self {
            line,
            bindings,
            output,
            code,
            artifacts,
        }
    }

    /// Line of the directive this snapshot belongs to.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Global bindings, sorted by name.
    pub fn bindings(&self) -> &BTreeMap<String, Value> {
        &self.bindings
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Output printed since the previous snapshot.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Code executed since the previous snapshot, excluding directive payloads.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Figure targets saved by the directive's own payload.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Evaluates an expression against a private copy of the bindings.
    pub fn evaluate(&self, expression: &str) -> HostResult<Value> {
        Interpreter::from_bindings(self.bindings.clone()).eval_expression(expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostErrorKind;

    fn snapshot() -> Snapshot {
        let mut bindings = BTreeMap::new();
        bindings.insert("value".to_string(), Value::Int(369));
        bindings.insert("items".to_string(), Value::List(vec![Value::Int(1)]));
        Snapshot::new(7, bindings, "1\n".to_string(), "foo = 1".to_string(), vec![])
    }

    #[test]
    fn test_accessors() {
        let snap = snapshot();
        assert_eq!(snap.line(), 7);
        assert_eq!(snap.output(), "1\n");
        assert_eq!(snap.code(), "foo = 1");
        assert_eq!(snap.get("value"), Some(&Value::Int(369)));
        assert_eq!(
            snap.bindings().keys().collect::<Vec<_>>(),
            vec!["items", "value"]
        );
    }

    #[test]
    fn test_evaluate_does_not_mutate() {
        let snap = snapshot();
        assert_eq!(snap.evaluate("value + 1").unwrap(), Value::Int(370));
        assert_eq!(snap.evaluate("len(items)").unwrap(), Value::Int(1));
        assert_eq!(snap.get("value"), Some(&Value::Int(369)));

        let err = snap.evaluate("missing").unwrap_err();
        assert_eq!(err.kind, HostErrorKind::NameError);
    }
}
