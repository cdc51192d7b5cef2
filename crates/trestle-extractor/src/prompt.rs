//! LLM prompt engineering for knowledge extraction

use trestle_domain::{ENTITY_TYPES, RELATIONSHIP_TYPES};

/// JSON shape the extraction call must return. Passed to the gateway,
/// which embeds it in the strict-JSON system instruction.
pub const EXTRACTION_SCHEMA: &str = r#"{
  "summary": "concise 2-3 sentence technical summary of the text",
  "entities": [
    {"id": "e1", "name": "exact entity name from the text", "type": "<entity type>", "properties": {}}
  ],
  "relationships": [
    {"source_id": "e1", "target_id": "e2", "type": "<relationship type>", "properties": {}}
  ]
}"#;

/// Builds the user prompt for one extraction call
pub struct PromptBuilder<'a> {
    text: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt builder for one chunk of text.
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Build the complete extraction prompt.
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\nAllowed entity types:\n");
        for entity_type in ENTITY_TYPES {
            prompt.push_str("- ");
            prompt.push_str(entity_type);
            prompt.push('\n');
        }
        prompt.push_str("\nAllowed relationship types:\n");
        for rel_type in RELATIONSHIP_TYPES {
            prompt.push_str("- ");
            prompt.push_str(rel_type);
            prompt.push('\n');
        }

        prompt.push_str("\nText to analyze:\n---\n");
        prompt.push_str(self.text);
        prompt.push_str("\n---\n");

        prompt
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are analyzing bridge engineering documentation. Extract a knowledge graph from the text: the entities it mentions and the relationships between them, plus a short summary.

Rules:
- Assign each entity a temporary id: "e1", "e2", ... in order of appearance
- Use the exact name from the text; do not invent, merge, or normalize names
- Use only the allowed entity and relationship types listed below; skip anything that fits none of them
- Relationships reference entities by their temporary ids and must connect two different entities
- Put measured values, grades, dates, and other attributes found in the text into "properties" as key-value pairs
- Extract only what the text states; do not add outside knowledge"#;
