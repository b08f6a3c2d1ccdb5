//! Instruction prompt sent with the project photo.

/// Fewest steps the model is asked for.
pub const MIN_STEPS: usize = 3;
/// Most steps the model is asked for.
pub const MAX_STEPS: usize = 7;

/// Output contract included verbatim in every prompt.
const OUTPUT_FORMAT: &str = r#"IMPORTANT: Your response must be ONLY a JSON array in the following format, with NO additional text or formatting:

[{
    "step_number": 1,
    "title": "First step title",
    "description": "Detailed description of what needs to be done",
    "estimated_time": "30 minutes",
    "materials_needed": ["item1", "item2"]
}]

Each step MUST have these fields:
- step_number (number)
- title (text)
- description (text)
- estimated_time (text)
- materials_needed (array of strings)
"#;

/// Build the roadmap instruction prompt for a project.
pub fn build_roadmap_prompt(project_name: &str, description: &str) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(&format!(
        "Analyze this image and create a step-by-step roadmap for the upcycling project: \
         {project_name} - {description}.\n\n"
    ));
    prompt.push_str(OUTPUT_FORMAT);
    prompt.push('\n');
    prompt.push_str(&format!(
        "Provide {MIN_STEPS}-{MAX_STEPS} detailed steps that clearly explain how to complete \
         this upcycling project.\n"
    ));
    prompt.push_str("Be specific about materials and time estimates.\n");
    prompt.push_str("Ensure the steps are in logical order.\n\n");
    prompt.push_str("Return ONLY the JSON array with NO additional text.\n");

    prompt
}
