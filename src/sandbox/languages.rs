//! Static language registry
//!
//! Maps a language identifier to the container image, source file extension,
//! and run command used for it. Defined once at startup, never mutated per
//! request. Unrecognized identifiers resolve to a generic shell profile
//! instead of failing, so callers never hit a hard error on unknown input.

/// Static configuration for one supported language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageProfile {
    /// Canonical identifier
    pub name: &'static str,
    /// Container image the code runs in
    pub image: &'static str,
    /// Source file extension (without the dot)
    pub extension: &'static str,
    /// Run command template; `{file}` is replaced with the materialized
    /// file's basename. No user-controlled value ever enters this vector.
    pub run_command: &'static [&'static str],
}

impl LanguageProfile {
    /// Expand the run-command template against a materialized file name
    pub fn command_for(&self, file_name: &str) -> Vec<String> {
        self.run_command
            .iter()
            .map(|arg| arg.replace("{file}", file_name))
            .collect()
    }
}

const PYTHON: LanguageProfile = LanguageProfile {
    name: "python",
    image: "python:3.12-slim",
    extension: "py",
    run_command: &["python3", "{file}"],
};

const JAVASCRIPT: LanguageProfile = LanguageProfile {
    name: "javascript",
    image: "node:20-slim",
    extension: "js",
    run_command: &["node", "{file}"],
};

const TYPESCRIPT: LanguageProfile = LanguageProfile {
    name: "typescript",
    image: "denoland/deno:alpine",
    extension: "ts",
    run_command: &["deno", "run", "--allow-read=.", "{file}"],
};

const RUST: LanguageProfile = LanguageProfile {
    name: "rust",
    image: "rust:1.79-slim",
    extension: "rs",
    run_command: &["sh", "-c", "rustc --edition=2021 -o /tmp/main {file} && /tmp/main"],
};

const GO: LanguageProfile = LanguageProfile {
    name: "go",
    image: "golang:1.22-alpine",
    extension: "go",
    run_command: &["go", "run", "{file}"],
};

const C: LanguageProfile = LanguageProfile {
    name: "c",
    image: "gcc:13",
    extension: "c",
    run_command: &["sh", "-c", "gcc -O2 -o /tmp/main {file} && /tmp/main"],
};

const CPP: LanguageProfile = LanguageProfile {
    name: "cpp",
    image: "gcc:13",
    extension: "cpp",
    run_command: &["sh", "-c", "g++ -O2 -o /tmp/main {file} && /tmp/main"],
};

const JAVA: LanguageProfile = LanguageProfile {
    name: "java",
    image: "eclipse-temurin:21-jdk",
    extension: "java",
    // Single-file source launch, no separate javac step
    run_command: &["java", "{file}"],
};

const RUBY: LanguageProfile = LanguageProfile {
    name: "ruby",
    image: "ruby:3.3-slim",
    extension: "rb",
    run_command: &["ruby", "{file}"],
};

const BASH: LanguageProfile = LanguageProfile {
    name: "bash",
    image: "bash:5.2",
    extension: "sh",
    run_command: &["bash", "{file}"],
};

/// Fallback for unrecognized identifiers: plain text run through a shell
const GENERIC: LanguageProfile = LanguageProfile {
    name: "plain",
    image: "alpine:3.20",
    extension: "txt",
    run_command: &["sh", "{file}"],
};

const REGISTRY: &[LanguageProfile] = &[
    PYTHON, JAVASCRIPT, TYPESCRIPT, RUST, GO, C, CPP, JAVA, RUBY, BASH,
];

/// Resolve a language identifier to its profile.
///
/// Falls back to the generic shell profile for anything unrecognized.
pub fn resolve_profile(language: &str) -> &'static LanguageProfile {
    match language.to_lowercase().as_str() {
        "python" | "py" | "python3" => &PYTHON,
        "javascript" | "js" | "node" => &JAVASCRIPT,
        "typescript" | "ts" => &TYPESCRIPT,
        "rust" | "rs" => &RUST,
        "go" | "golang" => &GO,
        "c" => &C,
        "cpp" | "c++" | "cxx" => &CPP,
        "java" => &JAVA,
        "ruby" | "rb" => &RUBY,
        "bash" | "sh" | "shell" => &BASH,
        _ => &GENERIC,
    }
}

/// Canonical names of all registered languages
pub fn supported_languages() -> Vec<&'static str> {
    REGISTRY.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_languages() {
        assert_eq!(resolve_profile("python").name, "python");
        assert_eq!(resolve_profile("py").name, "python");
        assert_eq!(resolve_profile("PYTHON").name, "python");
        assert_eq!(resolve_profile("js").name, "javascript");
        assert_eq!(resolve_profile("c++").name, "cpp");
    }

    #[test]
    fn test_unknown_language_falls_back_to_generic() {
        let profile = resolve_profile("brainfuck");
        assert_eq!(profile.name, "plain");
        assert_eq!(profile.extension, "txt");

        // Empty identifier takes the same fallback
        assert_eq!(resolve_profile("").name, "plain");
    }

    #[test]
    fn test_command_template_expansion() {
        let cmd = resolve_profile("python").command_for("code.py");
        assert_eq!(cmd, vec!["python3", "code.py"]);

        let cmd = resolve_profile("c").command_for("code.c");
        assert!(cmd.iter().any(|arg| arg.contains("code.c")));
        assert!(!cmd.iter().any(|arg| arg.contains("{file}")));
    }

    #[test]
    fn test_registry_listing() {
        let names = supported_languages();
        assert!(names.contains(&"python"));
        assert!(names.contains(&"java"));
        // The fallback profile is not advertised
        assert!(!names.contains(&"plain"));
    }
}
