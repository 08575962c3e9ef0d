//! C-family / brace-style scanner.
//!
//! Recognizes class-like declarations by keyword and routines by either a
//! function keyword (`function`, `func`, `fn`), an arrow assignment
//! (`const f = (..) =>`), or a parenthesized signature followed by `{`.

use crate::entity::EntityKind;

use super::language::Language;
use super::scanner::{
    indentation, is_identifier, leading_identifier, ClassScope, Declaration, Scanner,
};

/// Declaration modifiers stripped before keyword matching.
const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "final", "abstract", "sealed",
    "export", "default", "async", "pub", "pub(crate)", "pub(super)", "unsafe", "partial",
    "virtual", "override", "inline", "extern", "readonly", "declare", "open", "synchronized",
];

/// Statements that look like signatures but are not declarations.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "foreach", "while", "do", "switch", "case", "catch", "try", "return",
    "new", "throw", "using", "lock", "await", "yield", "typeof", "sizeof", "delete", "match",
    "loop", "defer", "go", "select",
];

pub struct BraceScanner {
    language: Language,
}

impl BraceScanner {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    fn class_keywords(&self) -> &'static [&'static str] {
        match self.language {
            Language::Java => &["class", "interface", "enum", "record"],
            Language::CSharp => &["class", "struct", "interface", "record"],
            Language::Cpp => &["class", "struct"],
            Language::C => &["struct"],
            Language::Rust => &["struct", "enum", "trait"],
            Language::TypeScript => &["class", "interface"],
            Language::Php => &["class", "interface", "trait"],
            _ => &["class"],
        }
    }

    fn function_keywords(&self) -> &'static [&'static str] {
        match self.language {
            Language::JavaScript | Language::TypeScript | Language::Php => &["function"],
            Language::Go => &["func"],
            Language::Rust => &["fn"],
            _ => &[],
        }
    }

    /// Whether `name(args) {` lines count as routine declarations.
    fn matches_signatures(&self) -> bool {
        !matches!(self.language, Language::Go | Language::Rust | Language::Php)
    }

    fn matches_arrows(&self) -> bool {
        matches!(self.language, Language::JavaScript | Language::TypeScript)
    }

    fn class_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        if self.language == Language::Go {
            let rest = line.strip_prefix("type ")?;
            if !(rest.contains(" struct") || rest.contains(" interface")) {
                return None;
            }
            return leading_identifier(rest);
        }

        self.class_keywords()
            .iter()
            .find_map(|kw| line.strip_prefix(kw)?.strip_prefix(' '))
            .and_then(leading_identifier)
    }

    /// Rust `impl` blocks scope methods without declaring a class.
    fn opens_scope(&self, line: &str) -> bool {
        self.language == Language::Rust
            && (line.starts_with("impl ") || line.starts_with("impl<"))
    }

    fn keyword_routine<'a>(&self, line: &'a str) -> Option<(&'a str, bool)> {
        let rest = self.function_keywords().iter().find_map(|kw| {
            let rest = line.strip_prefix(kw)?;
            (rest.starts_with(' ') || rest.starts_with('(') || rest.starts_with('*'))
                .then(|| rest.trim_start_matches('*').trim_start())
        })?;

        // Go method receiver: `func (s *Server) Start(`
        if let Some(receiver) = rest.strip_prefix('(') {
            let (_, after) = receiver.split_once(')')?;
            return leading_identifier(after).map(|name| (name, true));
        }

        if !rest.contains('(') {
            return None;
        }
        leading_identifier(rest).map(|name| (name, false))
    }

    fn arrow_routine<'a>(&self, line: &'a str) -> Option<&'a str> {
        if !line.contains("=>") || !line.contains('(') {
            return None;
        }
        let (lhs, rhs) = line.split_once('=')?;
        if rhs.starts_with('>') || rhs.starts_with('=') {
            return None;
        }
        let lhs = lhs.trim().trim_end_matches(|c: char| c == ':' || c.is_whitespace());
        let lhs = ["const ", "let ", "var "]
            .iter()
            .find_map(|kw| lhs.strip_prefix(kw))
            .unwrap_or(lhs)
            .trim();
        // Drop a type annotation: `handler: Handler = (..) =>`
        let name = lhs.split(':').next().unwrap_or(lhs).trim();
        is_identifier(name).then_some(name)
    }

    fn signature_routine<'a>(&self, line: &'a str) -> Option<&'a str> {
        if line.ends_with(';') || line.contains("=>") {
            return None;
        }
        let open = line.find('(')?;
        let close = line.rfind(')')?;
        if close < open || !line[close..].contains('{') {
            return None;
        }

        let head = &line[..open];
        if head.contains('=') {
            return None;
        }
        let first = head.split_whitespace().next().unwrap_or("");
        if CONTROL_KEYWORDS.contains(&first) {
            return None;
        }

        let token = head.split_whitespace().last()?;
        let token = token.rsplit("::").next().unwrap_or(token);
        let token = token.trim_start_matches(['*', '&']);
        if CONTROL_KEYWORDS.contains(&token) {
            return None;
        }
        is_identifier(token).then_some(token)
    }
}

fn strip_modifiers(mut line: &str) -> &str {
    loop {
        let stripped = MODIFIERS.iter().find_map(|m| {
            let rest = line.strip_prefix(m)?;
            rest.starts_with(' ').then(|| rest.trim_start())
        });
        match stripped {
            Some(rest) => line = rest,
            None => return line,
        }
    }
}

fn is_comment_or_noise(line: &str) -> bool {
    line.starts_with("//")
        || line.starts_with("/*")
        || line.starts_with('*')
        || line.starts_with('#')
        || line.starts_with('@')
        || line == "{"
        || line.starts_with("<?")
}

impl Scanner for BraceScanner {
    fn scan(&self, text: &str) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        let mut scope = ClassScope::default();

        for (idx, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || is_comment_or_noise(trimmed) {
                continue;
            }

            let indent = indentation(raw);
            scope.observe(indent);

            let line = strip_modifiers(trimmed);
            let mut push = |kind: EntityKind, name: &str| {
                declarations.push(Declaration {
                    kind,
                    name: name.to_string(),
                    line_number: idx + 1,
                    line: trimmed.to_string(),
                });
            };

            if let Some(name) = self.class_name(line) {
                push(EntityKind::Class, name);
                scope.open(indent);
                continue;
            }

            if self.opens_scope(line) {
                scope.open(indent);
                continue;
            }

            if let Some((name, has_receiver)) = self.keyword_routine(line) {
                let kind = if has_receiver {
                    EntityKind::Method
                } else {
                    scope.routine_kind(indent)
                };
                push(kind, name);
                continue;
            }

            if self.matches_arrows() {
                if let Some(name) = self.arrow_routine(line) {
                    push(scope.routine_kind(indent), name);
                    continue;
                }
            }

            if self.matches_signatures() {
                if let Some(name) = self.signature_routine(line) {
                    push(scope.routine_kind(indent), name);
                }
            }
        }

        declarations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(language: Language, text: &str) -> Vec<(EntityKind, String)> {
        BraceScanner::new(language)
            .scan(text)
            .into_iter()
            .map(|d| (d.kind, d.name))
            .collect()
    }

    #[test]
    fn test_javascript_class_and_functions() {
        let text = r#"
export class Cart {
  addItem(item) {
    this.items.push(item);
  }
  total = () => this.items.length;
}

function checkout(cart) {
  if (cart.empty()) {
    return;
  }
}

const render = async (props) => {
  return props;
};
"#;
        let found = scan(Language::JavaScript, text);
        assert_eq!(
            found,
            vec![
                (EntityKind::Class, "Cart".to_string()),
                (EntityKind::Method, "addItem".to_string()),
                (EntityKind::Method, "total".to_string()),
                (EntityKind::Subroutine, "checkout".to_string()),
                (EntityKind::Subroutine, "render".to_string()),
            ]
        );
    }

    #[test]
    fn test_java_methods() {
        let text = r#"
public class OrderService {
    private final Repo repo;

    public Order find(long id) {
        for (int i = 0; i < 3; i++) {
        }
        return repo.get(id);
    }

    protected static <T> List<T> wrap(T value) {
        return List.of(value);
    }
}
"#;
        let found = scan(Language::Java, text);
        assert_eq!(
            found,
            vec![
                (EntityKind::Class, "OrderService".to_string()),
                (EntityKind::Method, "find".to_string()),
                (EntityKind::Method, "wrap".to_string()),
            ]
        );
    }

    #[test]
    fn test_java_inner_class_keeps_outer_methods() {
        let text = r#"
public class Outer {
    static class Inner {
        void run() {
        }
    }

    public void save() {
    }
}
"#;
        let found = scan(Language::Java, text);
        assert_eq!(
            found,
            vec![
                (EntityKind::Class, "Outer".to_string()),
                (EntityKind::Class, "Inner".to_string()),
                (EntityKind::Method, "run".to_string()),
                (EntityKind::Method, "save".to_string()),
            ]
        );
    }

    #[test]
    fn test_go_receiver_is_method() {
        let text = "type Server struct {\n\taddr string\n}\n\nfunc (s *Server) Start() error {\n\treturn nil\n}\n\nfunc main() {\n}\n";
        let found = scan(Language::Go, text);
        assert_eq!(
            found,
            vec![
                (EntityKind::Class, "Server".to_string()),
                (EntityKind::Method, "Start".to_string()),
                (EntityKind::Subroutine, "main".to_string()),
            ]
        );
    }

    #[test]
    fn test_rust_impl_scopes_methods() {
        let text = "pub struct Pool {\n    size: usize,\n}\n\nimpl Pool {\n    pub fn new(size: usize) -> Self {\n        Self { size }\n    }\n}\n\nfn helper<T>(value: T) -> T {\n    value\n}\n";
        let found = scan(Language::Rust, text);
        assert_eq!(
            found,
            vec![
                (EntityKind::Class, "Pool".to_string()),
                (EntityKind::Method, "new".to_string()),
                (EntityKind::Subroutine, "helper".to_string()),
            ]
        );
    }

    #[test]
    fn test_c_function_and_control_flow() {
        let text = "static int *alloc_buf(size_t n) {\n    while (n) {\n    }\n}\nint x = compute(3);\n";
        let found = scan(Language::C, text);
        assert_eq!(found, vec![(EntityKind::Subroutine, "alloc_buf".to_string())]);
    }

    #[test]
    fn test_minified_and_garbage_input() {
        let minified = "var a=function(){return 1},b=(c)=>{c()};class{}";
        let _ = scan(Language::JavaScript, minified);
        let garbage = "\u{feff}(((({{{{ ))) }}}\n=>=>=>\nfunction (\n class";
        let found = scan(Language::TypeScript, garbage);
        assert!(found.is_empty());
    }
}
