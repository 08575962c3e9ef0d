//! Heuristic entity extraction.
//!
//! Every file yields one `Module` entity plus whatever declarations the
//! scanner for its language recognizes. Scanning is line-level and
//! approximate; it never fails on malformed input.

pub mod brace;
pub mod language;
pub mod python;
pub mod scanner;

pub use language::Language;
pub use scanner::{Declaration, Scanner};

use tracing::debug;

use crate::entity::{
    Entity, EntityKind, EntityPayload, EntityStatus, Relation, RelationKind,
};
use crate::source::FileContent;

/// Default cap on the module source excerpt, in characters.
pub const DEFAULT_EXCERPT_LIMIT: usize = 10_000;

/// Pick the scanner for a language.
pub fn scanner_for(language: Language) -> Box<dyn Scanner> {
    match language {
        Language::Python => Box::new(python::PythonScanner),
        Language::Unknown => Box::new(scanner::UnknownScanner),
        other => Box::new(brace::BraceScanner::new(other)),
    }
}

/// Turns fetched files into graph entities for one revision.
#[derive(Debug, Clone)]
pub struct Extractor {
    excerpt_limit: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_EXCERPT_LIMIT)
    }
}

impl Extractor {
    pub fn new(excerpt_limit: usize) -> Self {
        Self { excerpt_limit }
    }

    /// Extract the module entity and its child entities from one file.
    pub fn extract_file(&self, file: &FileContent, revision: &str, timestamp: &str) -> Vec<Entity> {
        let language = Language::detect(&file.path);
        let text = file.text.as_str();

        let module = Entity {
            kind: EntityKind::Module,
            path: file.path.clone(),
            name: file.path.clone(),
            language,
            status: EntityStatus::Active,
            old_status: None,
            revision: revision.to_string(),
            last_updated: timestamp.to_string(),
            version: 1,
            payload: EntityPayload {
                code: truncate_chars(text, self.excerpt_limit),
                size: file.size,
                lines: line_count(text),
                line_number: None,
                content_hash: Some(file.content_hash.clone()).filter(|h| !h.is_empty()),
            },
            relations: Vec::new(),
        };

        let mut entities = vec![module];

        for decl in scanner_for(language).scan(text) {
            let relation = match decl.kind {
                EntityKind::Class => RelationKind::HasClass,
                EntityKind::Method => RelationKind::DefinesMethod,
                EntityKind::Subroutine => RelationKind::HasSubroutine,
                EntityKind::Module => continue,
            };

            entities.push(Entity {
                kind: decl.kind,
                path: format!("{}:{}", file.path, decl.line_number),
                name: decl.name,
                language,
                status: EntityStatus::Active,
                old_status: None,
                revision: revision.to_string(),
                last_updated: timestamp.to_string(),
                version: 1,
                payload: EntityPayload {
                    size: decl.line.len() as i64,
                    lines: 1,
                    code: truncate_chars(&decl.line, self.excerpt_limit),
                    line_number: Some(decl.line_number as i64),
                    content_hash: None,
                },
                relations: vec![Relation {
                    kind: relation,
                    container_kind: EntityKind::Module,
                    container_path: file.path.clone(),
                }],
            });
        }

        debug!(path = %file.path, %language, entities = entities.len(), "Extracted entities");
        entities
    }

    /// Extract entities from every file of a revision batch.
    pub fn extract_all(&self, files: &[FileContent], revision: &str, timestamp: &str) -> Vec<Entity> {
        files
            .iter()
            .flat_map(|file| self.extract_file(file, revision, timestamp))
            .collect()
    }
}

fn line_count(text: &str) -> i64 {
    if text.is_empty() {
        0
    } else {
        text.matches('\n').count() as i64 + 1
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, text: &str) -> FileContent {
        FileContent {
            path: path.to_string(),
            text: text.to_string(),
            content_hash: "deadbeef".to_string(),
            size: text.len() as i64,
        }
    }

    #[test]
    fn test_python_module_class_method() {
        let entities = Extractor::default().extract_file(
            &file("a.py", "class Foo:\n    def bar(self):\n        pass\n"),
            "r1",
            "2026-01-01T00:00:00Z",
        );

        assert_eq!(entities.len(), 3);

        let module = &entities[0];
        assert_eq!(module.kind, EntityKind::Module);
        assert_eq!(module.path, "a.py");
        assert_eq!(module.language, Language::Python);
        assert_eq!(module.payload.lines, 4);
        assert_eq!(module.payload.content_hash.as_deref(), Some("deadbeef"));

        let class = &entities[1];
        assert_eq!(class.kind, EntityKind::Class);
        assert_eq!(class.name, "Foo");
        assert_eq!(class.path, "a.py:1");
        assert_eq!(class.relations[0].kind, RelationKind::HasClass);
        assert_eq!(class.relations[0].container_path, "a.py");

        let method = &entities[2];
        assert_eq!(method.kind, EntityKind::Method);
        assert_eq!(method.name, "bar");
        assert_eq!(method.path, "a.py:2");
        assert_eq!(method.payload.line_number, Some(2));
        assert_eq!(method.relations[0].kind, RelationKind::DefinesMethod);
    }

    #[test]
    fn test_unknown_language_yields_module_only() {
        let entities = Extractor::default().extract_file(
            &file("deploy.yaml", "class: Foo\ndef bar():\n"),
            "r1",
            "t",
        );
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].language, Language::Unknown);
        assert!(entities[0].relations.is_empty());
    }

    #[test]
    fn test_excerpt_is_capped() {
        let text = "é".repeat(50);
        let entities = Extractor::new(10).extract_file(&file("x.txt", &text), "r1", "t");
        assert_eq!(entities[0].payload.code.chars().count(), 10);
        assert_eq!(entities[0].payload.size, 100);
    }

    #[test]
    fn test_empty_file() {
        let entities = Extractor::default().extract_file(&file("empty.py", ""), "r1", "t");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].payload.lines, 0);
    }

    #[test]
    fn test_scanner_selection() {
        let text = "class A {\n  run() {\n  }\n}\n";
        assert_eq!(scanner_for(Language::TypeScript).scan(text).len(), 2);
        assert!(scanner_for(Language::Unknown).scan(text).is_empty());
    }
}
