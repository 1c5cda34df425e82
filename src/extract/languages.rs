//! Per-language recognition table
//!
//! Each entry knows its file extensions, an optional package/namespace
//! declaration pattern and the pattern for class-like declarations. All
//! patterns are line-anchored text matches; nothing here parses a grammar.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub struct Language {
    pub name: &'static str,
    extensions: &'static [&'static str],
    package: Option<Regex>,
    declarations: Regex,
    /// Namespace separator rewritten to `.` (`::` for C++, `\` for PHP)
    separator: Option<&'static str>,
}

impl Language {
    /// Declared package or namespace, normalized to dot notation
    pub fn package_name(&self, source: &str) -> Option<String> {
        let caps = self.package.as_ref()?.captures(source)?;
        let raw = caps.get(1)?.as_str();
        let name = match self.separator {
            Some(sep) => raw.split(sep).filter(|s| !s.is_empty()).collect::<Vec<_>>().join("."),
            None => raw.to_string(),
        };
        (!name.is_empty()).then_some(name)
    }

    /// Class-like declarations in source order, first occurrence only
    pub fn class_names(&self, source: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in self.declarations.captures_iter(source) {
            if let Some(m) = caps.get(1) {
                if !names.iter().any(|n| n == m.as_str()) {
                    names.push(m.as_str().to_string());
                }
            }
        }
        names
    }
}

fn language(
    name: &'static str,
    extensions: &'static [&'static str],
    package: Option<&str>,
    declarations: &str,
    separator: Option<&'static str>,
) -> Language {
    Language {
        name,
        extensions,
        package: package.map(|p| Regex::new(p).expect("package pattern is valid")),
        declarations: Regex::new(declarations).expect("declaration pattern is valid"),
        separator,
    }
}

pub fn all() -> &'static [Language] {
    static TABLE: OnceLock<Vec<Language>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            language(
                "java",
                &["java"],
                Some(r"(?m)^\s*package\s+([\w.]+)\s*;"),
                r"(?m)^\s*(?:(?:public|private|protected|abstract|final|static|sealed|non-sealed|strictfp)\s+)*(?:class|interface|enum|record|@interface)\s+(\w+)",
                None,
            ),
            language(
                "kotlin",
                &["kt", "kts"],
                Some(r"(?m)^\s*package\s+([\w.]+)"),
                r"(?m)^\s*(?:(?:public|private|protected|internal|abstract|open|final|sealed|data|enum|annotation|inner|value)\s+)*(?:class|interface|object)\s+(\w+)",
                None,
            ),
            language(
                "scala",
                &["scala"],
                Some(r"(?m)^\s*package\s+([\w.]+)"),
                r"(?m)^\s*(?:(?:abstract|final|sealed|case|private|protected|implicit)\s+)*(?:class|trait|object)\s+(\w+)",
                None,
            ),
            language(
                "csharp",
                &["cs"],
                Some(r"(?m)^\s*namespace\s+([\w.]+)"),
                r"(?m)^\s*(?:(?:public|private|protected|internal|abstract|sealed|static|partial|readonly)\s+)*(?:class|interface|struct|enum|record)\s+(\w+)",
                None,
            ),
            language("python", &["py"], None, r"(?m)^\s*class\s+(\w+)", None),
            language(
                "javascript",
                &["js", "jsx", "mjs", "ts", "tsx"],
                None,
                r"(?m)^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?(?:class|interface)\s+(\w+)",
                None,
            ),
            language(
                "go",
                &["go"],
                Some(r"(?m)^\s*package\s+(\w+)"),
                r"(?m)^\s*type\s+(\w+)\s+(?:struct|interface)\b",
                None,
            ),
            language(
                "rust",
                &["rs"],
                None,
                r"(?m)^\s*(?:pub(?:\([\w:]+\))?\s+)?(?:struct|enum|trait)\s+(\w+)",
                None,
            ),
            language(
                "cpp",
                &["cpp", "cc", "cxx", "hpp", "hh", "h"],
                Some(r"(?m)^\s*namespace\s+([\w:]+)"),
                r"(?m)^\s*(?:template\s*<[^>]*>\s*)?(?:class|struct)\s+(\w+)\s*(?:final\s*)?[:{]",
                Some("::"),
            ),
            language(
                "php",
                &["php"],
                Some(r"(?m)^\s*namespace\s+([\w\\]+)\s*;"),
                r"(?m)^\s*(?:(?:abstract|final|readonly)\s+)*(?:class|interface|trait|enum)\s+(\w+)",
                Some("\\"),
            ),
            language("ruby", &["rb"], None, r"(?m)^\s*class\s+([A-Z]\w*)", None),
            language(
                "swift",
                &["swift"],
                None,
                r"(?m)^\s*(?:(?:public|private|fileprivate|internal|open|final)\s+)*(?:class|struct|enum|protocol|actor)\s+(\w+)",
                None,
            ),
        ]
    })
}

/// Language for a file, by case-insensitive extension
pub fn for_path(path: &Path) -> Option<&'static Language> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    all().iter().find(|lang| lang.extensions.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(file: &str) -> &'static Language {
        for_path(Path::new(file)).unwrap()
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(lang("A.java").name, "java");
        assert_eq!(lang("view.tsx").name, "javascript");
        assert_eq!(lang("net.hpp").name, "cpp");
        assert!(for_path(Path::new("README.md")).is_none());
        assert!(for_path(Path::new("Makefile")).is_none());
    }

    #[test]
    fn test_extension_lookup_ignores_case() {
        assert_eq!(lang("Foo.JAVA").name, "java");
        assert_eq!(lang("Bar.H").name, "cpp");
        assert_eq!(lang("App.Kt").name, "kotlin");
        assert!(for_path(Path::new("NOTES.MD")).is_none());
    }

    #[test]
    fn test_java() {
        let src = "package com.acme.core;\n\npublic final class Engine {\n}\n\ninterface Part {}\n// class Commented\nenum Mode { A }\n";
        let java = lang("x.java");
        assert_eq!(java.package_name(src).as_deref(), Some("com.acme.core"));
        assert_eq!(java.class_names(src), vec!["Engine", "Part", "Mode"]);
    }

    #[test]
    fn test_kotlin_and_scala_modifiers() {
        let kt = "package app.ui\n\ndata class Point(val x: Int)\nsealed interface Shape\nobject Registry\n";
        assert_eq!(lang("a.kt").class_names(kt), vec!["Point", "Shape", "Registry"]);

        let scala = "package svc\ncase class Order(id: Long)\ntrait Repo\n";
        assert_eq!(lang("a.scala").package_name(scala).as_deref(), Some("svc"));
        assert_eq!(lang("a.scala").class_names(scala), vec!["Order", "Repo"]);
    }

    #[test]
    fn test_namespace_separators() {
        let cpp = "namespace acme::net {\nclass Socket : public Base {\n};\nclass Forward;\nstruct Buffer {\n};\n}\n";
        let cpp_lang = lang("a.cpp");
        assert_eq!(cpp_lang.package_name(cpp).as_deref(), Some("acme.net"));
        assert_eq!(cpp_lang.class_names(cpp), vec!["Socket", "Buffer"]);

        let php = "<?php\nnamespace App\\Http;\n\nfinal class Kernel {}\n";
        assert_eq!(lang("a.php").package_name(php).as_deref(), Some("App.Http"));
        assert_eq!(lang("a.php").class_names(php), vec!["Kernel"]);
    }

    #[test]
    fn test_languages_without_package() {
        let py = "class Parser:\n    class Inner:\n        pass\n";
        assert!(lang("a.py").package_name(py).is_none());
        assert_eq!(lang("a.py").class_names(py), vec!["Parser", "Inner"]);

        let rs = "pub struct Foo;\npub(crate) enum Bar { A }\ntrait Baz {}\nfn main() {}\n";
        assert_eq!(lang("a.rs").class_names(rs), vec!["Foo", "Bar", "Baz"]);

        let go = "package store\n\ntype Cache struct {\n}\ntype ID int\n";
        assert_eq!(lang("a.go").package_name(go).as_deref(), Some("store"));
        assert_eq!(lang("a.go").class_names(go), vec!["Cache"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let ts = "export class A {}\nclass A {}\nexport default class B {}\n";
        assert_eq!(lang("a.ts").class_names(ts), vec!["A", "B"]);
    }
}
