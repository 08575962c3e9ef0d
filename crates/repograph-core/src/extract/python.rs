//! Python-like scanner: `class Name:` and `def name(` declarations.

use crate::entity::EntityKind;

use super::scanner::{indentation, leading_identifier, ClassScope, Declaration, Scanner};

pub struct PythonScanner;

impl Scanner for PythonScanner {
    fn scan(&self, text: &str) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        let mut scope = ClassScope::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let indent = indentation(raw);
            scope.observe(indent);

            if let Some(rest) = line.strip_prefix("class ") {
                if !line.contains(':') {
                    continue;
                }
                if let Some(name) = leading_identifier(rest) {
                    declarations.push(Declaration {
                        kind: EntityKind::Class,
                        name: name.to_string(),
                        line_number: idx + 1,
                        line: line.to_string(),
                    });
                    scope.open(indent);
                }
                continue;
            }

            let def = line
                .strip_prefix("def ")
                .or_else(|| line.strip_prefix("async def "));

            if let Some(rest) = def {
                if !rest.contains('(') {
                    continue;
                }
                if let Some(name) = leading_identifier(rest) {
                    declarations.push(Declaration {
                        kind: scope.routine_kind(indent),
                        name: name.to_string(),
                        line_number: idx + 1,
                        line: line.to_string(),
                    });
                }
            }
        }

        declarations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_names(text: &str) -> Vec<(EntityKind, String, usize)> {
        PythonScanner
            .scan(text)
            .into_iter()
            .map(|d| (d.kind, d.name, d.line_number))
            .collect()
    }

    #[test]
    fn test_class_with_method() {
        let found = kinds_and_names("class Foo:\n    def bar(self):\n        pass\n");
        assert_eq!(
            found,
            vec![
                (EntityKind::Class, "Foo".to_string(), 1),
                (EntityKind::Method, "bar".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_top_level_function_after_class() {
        let text = "class Repo(Base):\n    async def load(self):\n        pass\n\ndef main():\n    run()\n";
        let found = kinds_and_names(text);
        assert_eq!(found[0], (EntityKind::Class, "Repo".to_string(), 1));
        assert_eq!(found[1], (EntityKind::Method, "load".to_string(), 2));
        assert_eq!(found[2], (EntityKind::Subroutine, "main".to_string(), 5));
    }

    #[test]
    fn test_method_after_nested_class_stays_method() {
        let text = "class Model:\n    class Meta:\n        ordering = 1\n    def save(self):\n        pass\n\ndef build():\n    pass\n";
        let found = kinds_and_names(text);
        assert_eq!(
            found,
            vec![
                (EntityKind::Class, "Model".to_string(), 1),
                (EntityKind::Class, "Meta".to_string(), 2),
                (EntityKind::Method, "save".to_string(), 4),
                (EntityKind::Subroutine, "build".to_string(), 7),
            ]
        );
    }

    #[test]
    fn test_nested_function_outside_class_is_subroutine() {
        let found = kinds_and_names("def outer():\n    def inner():\n        pass\n");
        assert!(found.iter().all(|(kind, _, _)| *kind == EntityKind::Subroutine));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "class :\nclass Broken\ndef (x):\ndef nothing\n\u{0}\u{fffd}def ok():\n";
        let found = kinds_and_names(text);
        assert!(found.is_empty());
    }
}
