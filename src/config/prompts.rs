//! Prompt templates for coursegen.
//!
//! Every template asks for a JSON answer and spells out the exact keys, since the
//! model has no other contract to follow. Templates can be customized by placing
//! TOML files (`course.toml`, `quiz.toml`, `homework.toml`, `solution.toml`) in
//! the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub course: PromptTemplate,
    pub quiz: PromptTemplate,
    pub homework: PromptTemplate,
    pub solution: PromptTemplate,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// A system persona plus a user prompt with `{{name}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            course: course_template(),
            quiz: quiz_template(),
            homework: homework_template(),
            solution: solution_template(),
            variables: HashMap::new(),
        }
    }
}

fn course_template() -> PromptTemplate {
    PromptTemplate {
        system: "You are a helpful assistant.".to_string(),
        user: r#"Create a course outline for '{{title}}' with {{sessions}} sessions.
Each session should have {{topics}} distinct topics.
Return JSON in this format:
{
  "subject": "{{title}}",
  "level": "beginner",
  "total_sessions": {{sessions}},
  "sessions": [
    {
      "session_no": 1,
      "session_name": "Intro to ...",
      "learning_objectives": ["..."],
      "topics": [
        {"title": "Topic 1"}
      ]
    }
  ]
}
Respond with the JSON object only."#
            .to_string(),
    }
}

fn quiz_template() -> PromptTemplate {
    PromptTemplate {
        system: "You are a helpful assistant.".to_string(),
        user: r#"Generate {{count}} multiple choice questions for the YouTube video '{{title}}'.
Each question should have 4 options and specify the correct answer.
The correct answer must be copied exactly from one of the options.
Return a valid JSON list matching this format:
[
  {
    "question": "What is the main topic?",
    "options": ["A", "B", "C", "D"],
    "correct_answer": "A"
  }
]"#
        .to_string(),
    }
}

fn homework_template() -> PromptTemplate {
    PromptTemplate {
        system: "You are an expert educational assistant.".to_string(),
        user: r#"You are an educational assistant. Based on the following transcript:
"""{{transcript}}"""

Generate **1 Python homework problem** related to the main concepts.
Include:
1. Problem statement (like a LeetCode description)
2. Python skeleton code with function signature
3. 3-5 hints guiding the student to solve it

Return valid JSON like this:
[
  {
    "problem_statement": "Write a function to ...",
    "skeleton_code": "def my_function(...):\n    pass",
    "hints": ["Hint 1", "Hint 2", "Hint 3"]
  }
]"#
        .to_string(),
    }
}

fn solution_template() -> PromptTemplate {
    PromptTemplate {
        system: "You are a helpful Python coding assistant.".to_string(),
        user: r#"You are a Python expert.
Given this problem statement and skeleton code, fill in the solution.
Return valid JSON with keys: problem_statement, skeleton_code, solution_code.

Problem Statement:
"""{{problem}}"""

Skeleton Code:
"""{{skeleton}}""""#
            .to_string(),
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            for (name, slot) in [
                ("course", &mut prompts.course),
                ("quiz", &mut prompts.quiz),
                ("homework", &mut prompts.homework),
                ("solution", &mut prompts.solution),
            ] {
                let path = custom_path.join(format!("{}.toml", name));
                if path.exists() {
                    let content = std::fs::read_to_string(&path)?;
                    *slot = toml::from_str(&content)?;
                }
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Single left-to-right pass over the template. Substituted values are
    /// never scanned again, so a value containing `{{name}}` stays literal.
    /// Unknown placeholders are kept as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let name = after.find("}}").map(|end| &after[..end]);
            match name.filter(|n| is_placeholder_name(n)) {
                Some(name) => {
                    match vars.get(name) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(name);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[name.len() + 2..];
                }
                None => {
                    result.push('{');
                    rest = &rest[start + 1..];
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.course.user.contains("\"sessions\""));
        assert!(prompts.quiz.user.contains("\"correct_answer\""));
        assert!(prompts.homework.user.contains("\"hints\""));
        assert!(prompts.solution.user.contains("solution_code"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let result = Prompts::render(template, &vars(&[("name", "Alice"), ("count", "5")]));
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_course_template_keeps_json_braces() {
        let prompts = Prompts::default();
        let rendered = prompts.render_with_custom(
            &prompts.course.user,
            &vars(&[("title", "Rust Basics"), ("sessions", "3"), ("topics", "2")]),
        );
        assert!(rendered.contains("'Rust Basics' with 3 sessions"));
        assert!(rendered.contains("\"total_sessions\": 3,"));
        assert!(rendered.contains("{\"title\": \"Topic 1\"}"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let prompts = Prompts::default();
        let vars = vars(&[
            ("problem", "Print the literal text {{skeleton}}"),
            ("skeleton", "def f(): pass"),
        ]);

        let first = prompts.render_with_custom(&prompts.solution.user, &vars);
        assert!(first.contains("\"\"\"Print the literal text {{skeleton}}\"\"\""));
        assert!(first.contains("\"\"\"def f(): pass\"\"\""));

        for _ in 0..32 {
            let fresh = Prompts::default();
            assert_eq!(fresh.render_with_custom(&fresh.solution.user, &vars), first);
        }
    }

    #[test]
    fn test_render_keeps_unknown_and_stray_braces() {
        let rendered = Prompts::render(
            "{{missing}} {{{name}}} {{ spaced }} {{name",
            &vars(&[("name", "x")]),
        );
        assert_eq!(rendered, "{{missing}} {x} {{ spaced }} {{name");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables = vars(&[("audience", "teenagers"), ("title", "ignored")]);

        let rendered = prompts.render_with_custom(
            "{{title}} for {{audience}}",
            &vars(&[("title", "Loops")]),
        );
        assert_eq!(rendered, "Loops for teenagers");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("quiz.toml"),
            "system = \"You are a strict examiner.\"\nuser = \"{{count}} questions on {{title}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.quiz.system, "You are a strict examiner.");
        assert_eq!(prompts.course.system, "You are a helpful assistant.");
    }
}
