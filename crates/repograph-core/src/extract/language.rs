//! Language detection by file extension.

use serde::{Deserialize, Serialize};

/// Source language of a file, as far as extraction cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    C,
    Cpp,
    CSharp,
    Go,
    Rust,
    Php,
    Unknown,
}

impl Language {
    /// Detect the language of a file from its extension (case-insensitive).
    pub fn detect(file_path: &str) -> Self {
        let file_name = file_path.rsplit('/').next().unwrap_or(file_path);
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return Language::Unknown;
        };

        match ext.to_ascii_lowercase().as_str() {
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Language::Cpp,
            "cs" => Language::CSharp,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "php" => Language::Php,
            _ => Language::Unknown,
        }
    }

    /// Display name stored on graph nodes.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Java => "Java",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Php => "PHP",
            Language::Unknown => "Unknown",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "Python" => Language::Python,
            "JavaScript" => Language::JavaScript,
            "TypeScript" => Language::TypeScript,
            "Java" => Language::Java,
            "C" => Language::C,
            "C++" => Language::Cpp,
            "C#" => Language::CSharp,
            "Go" => Language::Go,
            "Rust" => Language::Rust,
            "PHP" => Language::Php,
            _ => Language::Unknown,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(Language::detect("src/app.py"), Language::Python);
        assert_eq!(Language::detect("web/App.TSX"), Language::TypeScript);
        assert_eq!(Language::detect("lib/util.hpp"), Language::Cpp);
        assert_eq!(Language::detect("Main.java"), Language::Java);
        assert_eq!(Language::detect("config.yaml"), Language::Unknown);
        assert_eq!(Language::detect("Makefile"), Language::Unknown);
        assert_eq!(Language::detect("dir.v2/README"), Language::Unknown);
    }

    #[test]
    fn test_name_round_trip() {
        for lang in [Language::Cpp, Language::CSharp, Language::Php, Language::Unknown] {
            assert_eq!(Language::from_name(lang.name()), lang);
        }
    }
}
