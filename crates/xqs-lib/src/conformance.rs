//! Dialect conformance validation.
//!
//! The parser accepts the union grammar: every construct any supported
//! dialect understands. Validation is a separate tree walk that checks
//! each construct against the target dialect and version and reports
//! the unsupported ones as warnings, leaving the tree intact.

use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dialect::{Dialect, DialectVersion, Version};
use crate::tree::{NodeKind, SyntaxTree};

/// One way a construct can be supported: a dialect from a minimum
/// version on.
#[derive(Debug, Clone, Copy)]
pub struct Condition {
    pub dialect: Dialect,
    pub since: Version,
}

impl Condition {
    pub const fn new(dialect: Dialect, since: Version) -> Self {
        Self { dialect, since }
    }

    fn holds(&self, target: &DialectVersion) -> bool {
        target.dialect == self.dialect && target.version >= self.since
    }
}

/// Support requirement for a construct: alternatives of conditions.
/// The construct is allowed when every condition of some alternative
/// holds. A dialect no alternative mentions is unsupported; unknown
/// combinations fail closed.
#[derive(Debug, Clone, Default)]
pub struct Requirement {
    alternatives: Vec<Vec<Condition>>,
}

impl Requirement {
    pub fn any_of(conditions: &[Condition]) -> Self {
        Self {
            alternatives: conditions.iter().map(|c| vec![*c]).collect(),
        }
    }

    pub fn alternative(mut self, conditions: &[Condition]) -> Self {
        self.alternatives.push(conditions.to_vec());
        self
    }

    pub fn allows(&self, target: &DialectVersion) -> bool {
        self.alternatives
            .iter()
            .any(|alt| !alt.is_empty() && alt.iter().all(|c| c.holds(target)))
    }
}

#[derive(Debug, Clone)]
struct Entry {
    feature: &'static str,
    /// Human-readable support summary, rendered into the diagnostic.
    requires: &'static str,
    requirement: Requirement,
}

/// Maps node kinds to their support requirements. Iteration order is
/// registration order, so reports are stable.
#[derive(Debug, Clone)]
pub struct ConformanceRegistry {
    entries: IndexMap<NodeKind, Entry>,
}

const W3C_30: Condition = Condition::new(Dialect::W3c, Version::new(3, 0));
const W3C_31: Condition = Condition::new(Dialect::W3c, Version::new(3, 1));
const MARKLOGIC_8: Condition = Condition::new(Dialect::MarkLogic, Version::new(8, 0));
const SAXON_PE_94: Condition = Condition::new(Dialect::SaxonPe, Version::new(9, 4));
const SAXON_EE_94: Condition = Condition::new(Dialect::SaxonEe, Version::new(9, 4));
const SAXON_PE_98: Condition = Condition::new(Dialect::SaxonPe, Version::new(9, 8));
const SAXON_EE_98: Condition = Condition::new(Dialect::SaxonEe, Version::new(9, 8));
const BASEX_78: Condition = Condition::new(Dialect::BaseX, Version::new(7, 8));

/// XQuery 3.0 core: W3C 3.0+, Saxon 9.4+, BaseX 7.8+, MarkLogic 8+.
fn xquery_30() -> Requirement {
    Requirement::any_of(&[W3C_30, MARKLOGIC_8, SAXON_PE_94, SAXON_EE_94, BASEX_78])
}

/// XQuery 3.1 additions: maps, arrays, lookups, arrows.
fn xquery_31() -> Requirement {
    Requirement::any_of(&[
        W3C_31,
        Condition::new(Dialect::MarkLogic, Version::new(9, 0)),
        Condition::new(Dialect::SaxonPe, Version::new(9, 7)),
        Condition::new(Dialect::SaxonEe, Version::new(9, 7)),
        Condition::new(Dialect::BaseX, Version::new(8, 0)),
    ])
}

/// Saxon vendor syntax.
fn saxon_98() -> Requirement {
    Requirement::any_of(&[SAXON_PE_98, SAXON_EE_98])
}

const XQUERY_30_REQUIRES: &str =
    "XQuery 3.0 (w3c 3.0, marklogic 8.0, saxon 9.4, or basex 7.8)";
const XQUERY_31_REQUIRES: &str =
    "XQuery 3.1 (w3c 3.1, marklogic 9.0, saxon 9.7, or basex 8.0)";
const SAXON_98_REQUIRES: &str = "Saxon 9.8 (saxon-pe or saxon-ee)";

impl Default for ConformanceRegistry {
    fn default() -> Self {
        let mut registry = ConformanceRegistry {
            entries: IndexMap::new(),
        };

        for (kind, feature) in [
            (NodeKind::SwitchExpr, "switch expression"),
            (NodeKind::TryCatchExpr, "try/catch expression"),
            (NodeKind::AllowingEmpty, "for .. allowing empty"),
            (NodeKind::CountClause, "count clause"),
            (NodeKind::StringConcatExpr, "string concatenation operator"),
            (NodeKind::SimpleMapExpr, "simple map operator"),
            (NodeKind::NamedFunctionRef, "named function reference"),
            (NodeKind::InlineFunctionExpr, "inline function expression"),
            (NodeKind::FunctionTest, "function test"),
            (NodeKind::Annotation, "annotation"),
            (NodeKind::ContextItemDecl, "context item declaration"),
        ] {
            registry.register(kind, feature, XQUERY_30_REQUIRES, xquery_30());
        }

        for (kind, feature) in [
            (NodeKind::MapConstructor, "map constructor"),
            (NodeKind::SquareArrayConstructor, "array constructor"),
            (NodeKind::CurlyArrayConstructor, "array constructor"),
            (NodeKind::Lookup, "lookup operator"),
            (NodeKind::ArrowExpr, "arrow operator"),
            (NodeKind::MapTest, "map test"),
            (NodeKind::ArrayTest, "array test"),
        ] {
            registry.register(kind, feature, XQUERY_31_REQUIRES, xquery_31());
        }

        for (kind, feature) in [
            (NodeKind::TupleType, "tuple type"),
            (NodeKind::UnionType, "union type"),
        ] {
            registry.register(kind, feature, SAXON_98_REQUIRES, saxon_98());
        }

        // Everything else parses everywhere; nothing to register.
        registry
    }
}

impl ConformanceRegistry {
    pub fn empty() -> Self {
        ConformanceRegistry {
            entries: IndexMap::new(),
        }
    }

    pub fn register(
        &mut self,
        kind: NodeKind,
        feature: &'static str,
        requires: &'static str,
        requirement: Requirement,
    ) {
        self.entries.insert(
            kind,
            Entry {
                feature,
                requires,
                requirement,
            },
        );
    }
}

/// Walks the tree and reports every construct the target does not
/// support. Findings are warnings; the tree stays usable either way.
pub fn validate(
    tree: &SyntaxTree,
    registry: &ConformanceRegistry,
    target: &DialectVersion,
) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for id in tree.descendants(tree.root()) {
        let Some(kind) = tree.node_kind(id) else {
            continue;
        };
        let Some(entry) = registry.entries.get(&kind) else {
            continue;
        };
        if !entry.requirement.allows(target) {
            diagnostics
                .report(DiagnosticKind::UnsupportedConstruct, tree.range(id))
                .message_raw(format!(
                    "{} is not available in {target}; requires {}",
                    entry.feature, entry.requires
                ))
                .emit();
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn check(source: &str, target: &str) -> Vec<String> {
        let parse = parse(source).unwrap();
        let target: DialectVersion = target.parse().unwrap();
        validate(&parse.tree, &ConformanceRegistry::default(), &target)
            .to_records()
            .into_iter()
            .map(|r| r.message)
            .collect()
    }

    #[test]
    fn tuple_type_is_saxon_only() {
        let source = "1 instance of tuple(a: xs:string)";
        let findings = check(source, "w3c/3.1");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("tuple type"), "{findings:?}");

        assert!(check(source, "saxon-pe/9.8").is_empty());
        // Before Saxon introduced the syntax.
        assert_eq!(check(source, "saxon-pe/9.4").len(), 1);
    }

    #[test]
    fn map_constructor_needs_31() {
        let source = r#"map { "a": 1 }"#;
        assert!(check(source, "w3c/3.1").is_empty());
        assert_eq!(check(source, "w3c/3.0").len(), 1);
        assert!(check(source, "basex/8.0").is_empty());
        assert_eq!(check(source, "marklogic/8.0").len(), 1);
    }

    #[test]
    fn unknown_dialect_combinations_fail_closed() {
        let requirement = Requirement::any_of(&[Condition::new(
            Dialect::SaxonEe,
            Version::new(9, 8),
        )]);
        let target = DialectVersion::new(Dialect::BaseX, Version::new(9, 0));
        assert!(!requirement.allows(&target));
    }

    #[test]
    fn findings_are_warnings_not_errors() {
        let parse = parse("1 instance of tuple(a: xs:string)").unwrap();
        let target: DialectVersion = "w3c/3.1".parse().unwrap();
        let findings = validate(&parse.tree, &ConformanceRegistry::default(), &target);
        assert!(findings.has_warnings());
        assert!(!findings.has_errors());
    }
}
