use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;

pub const IMPORT_PREAMBLE: &str = "from manim import *";
pub const FALLBACK_SCENE_NAME: &str = "Scene";

/// Sanitized scene source plus the entry identifier extracted from it.
#[derive(Debug, Clone)]
pub struct SanitizedScene {
    pub source: String,
    pub scene_name: String,
}

/// Clean generated text into a plausible Manim source file.
///
/// Best-effort, not a parser: markdown fences are dropped, lines before the
/// scene class definition pass through unchanged, and once inside the class
/// body copying stops at the first line that looks like explanatory prose
/// (word characters followed by a colon or hyphen). That heuristic can
/// misfire on legitimate code such as dict literals; callers must tolerate
/// truncated output.
pub fn clean_code(raw: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut inside_class = false;

    for line in raw.trim().lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            continue;
        }

        if !inside_class {
            if trimmed.starts_with("class") && line.contains("Scene") {
                inside_class = true;
            }
            kept.push(line);
        } else {
            if explanation_regex().map(|re| re.is_match(trimmed)).unwrap_or(false) {
                break;
            }
            kept.push(line);
        }
    }

    format!("{IMPORT_PREAMBLE}\n\n{}", kept.join("\n"))
}

/// Extract the scene class name from cleaned source, falling back to
/// `"Scene"` when no class inheriting from a `*Scene*` base is found.
pub fn extract_scene_name(code: &str) -> String {
    scene_class_regex()
        .ok()
        .and_then(|re| re.captures(code))
        .map(|cap| cap[1].to_string())
        .unwrap_or_else(|| FALLBACK_SCENE_NAME.to_string())
}

pub fn sanitize(raw: &str) -> SanitizedScene {
    let source = clean_code(raw);
    let scene_name = extract_scene_name(&source);
    SanitizedScene { source, scene_name }
}

fn explanation_regex() -> Result<&'static Regex> {
    static EXPL_RE: OnceCell<Regex> = OnceCell::new();
    EXPL_RE.get_or_try_init(|| {
        Regex::new(r"^\w+[\s\w]*[:\-]").context("failed to compile explanation regex")
    })
}

fn scene_class_regex() -> Result<&'static Regex> {
    static SCENE_RE: OnceCell<Regex> = OnceCell::new();
    SCENE_RE.get_or_try_init(|| {
        Regex::new(r"class\s+(\w+)\(\s*[\w.]*Scene[\w.]*\s*\)")
            .context("failed to compile scene class regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_never_survive() {
        let raw = "```python\nfrom manim import *\n\nclass TestScene(Scene):\n    def construct(self):\n        pass\n```";
        let cleaned = clean_code(raw);
        assert!(!cleaned.contains("```"));
        assert!(cleaned.contains("class TestScene(Scene):"));
    }

    #[test]
    fn sanitize_sample_fixture() {
        let raw = "```python\nfrom manim import *\n\nclass TestScene(Scene):\n    def construct(self):\n        circle = Circle()\n        self.play(Create(circle))\n```";
        let scene = sanitize(raw);
        assert!(!scene.source.contains("```"));
        assert!(scene.source.contains("class TestScene(Scene):"));
        assert_eq!(scene.scene_name, "TestScene");
    }

    #[test]
    fn preamble_lines_pass_through_unchanged() {
        let raw = "import numpy as np\nCOLOR = BLUE\n\nclass Spin(Scene):\n    def construct(self):\n        pass";
        let cleaned = clean_code(raw);
        assert!(cleaned.starts_with("from manim import *\n\n"));
        assert!(cleaned.contains("import numpy as np\nCOLOR = BLUE\n"));
        assert!(cleaned.contains("class Spin(Scene):"));
    }

    #[test]
    fn truncates_trailing_explanation() {
        let raw = "class Spin(Scene):\n    def construct(self):\n        self.wait()\n\nExplanation: this scene rotates a square.";
        let cleaned = clean_code(raw);
        assert!(cleaned.contains("self.wait()"));
        assert!(!cleaned.contains("Explanation"));
    }

    #[test]
    fn truncates_hyphen_section_header() {
        let raw = "class Spin(Scene):\n    def construct(self):\n        pass\nHow it works - step by step";
        let cleaned = clean_code(raw);
        assert!(!cleaned.contains("How it works"));
    }

    #[test]
    fn code_lines_survive_explanation_heuristic() {
        // Method defs and call expressions contain parens before any colon,
        // so the prose detector must not fire on them.
        let raw = "class Spin(Scene):\n    def construct(self):\n        square = Square()\n        self.play(Rotate(square))";
        let cleaned = clean_code(raw);
        assert!(cleaned.contains("def construct(self):"));
        assert!(cleaned.contains("self.play(Rotate(square))"));
    }

    #[test]
    fn heuristic_misfires_on_dict_literals() {
        // Known limitation: a bare `key: value` line inside the class body
        // looks like prose and truncates the rest.
        let raw = "class Spin(Scene):\n    def construct(self):\n        pass\n    labels = {\nx: 1,\n}";
        let cleaned = clean_code(raw);
        assert!(!cleaned.contains("x: 1"));
    }

    #[test]
    fn no_scene_definition_falls_back() {
        let raw = "print('hello')";
        let scene = sanitize(raw);
        assert_eq!(scene.scene_name, FALLBACK_SCENE_NAME);
        assert!(scene.source.starts_with("from manim import *\n\n"));
        assert!(scene.source.contains("print('hello')"));
    }

    #[test]
    fn empty_input_yields_preamble_only() {
        let scene = sanitize("");
        assert_eq!(scene.source, "from manim import *\n\n");
        assert_eq!(scene.scene_name, FALLBACK_SCENE_NAME);
    }

    #[test]
    fn extracts_subclassed_scene_bases() {
        assert_eq!(
            extract_scene_name("class Orbit(ThreeDScene):\n    pass"),
            "Orbit"
        );
        assert_eq!(
            extract_scene_name("class Pan(MovingCameraScene):\n    pass"),
            "Pan"
        );
    }

    #[test]
    fn plain_class_does_not_match_scene_pattern() {
        assert_eq!(
            extract_scene_name("class Helper(object):\n    pass"),
            FALLBACK_SCENE_NAME
        );
    }
}
