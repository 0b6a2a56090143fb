//! Prompt construction for answers and summaries.

use companion_core::Project;

const PERSONA: &str = "You are an academic AI assistant for the Unified Academic Project Portal.";

const GROUNDING: &str = "Answer the question using only the project information and thesis text \
above. If the answer is not contained there, say that the project documents do not cover it.";

fn field(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => "N/A",
    }
}

fn students(project: &Project) -> String {
    if project.students.is_empty() {
        "N/A".to_string()
    } else {
        project.student_list()
    }
}

/// Build the grounded question-answering prompt.
///
/// `excerpt` is the (already truncated) document text.
pub fn answer_prompt(project: &Project, excerpt: &str, question: &str) -> String {
    format!(
        "{PERSONA}\n\n\
         Project Information:\n\
         Title: {title}\n\
         Description: {description}\n\
         Guide: {guide}\n\
         Students: {students}\n\n\
         Thesis Text (from PDF):\n\
         ---\n\
         {excerpt}\n\
         ---\n\n\
         {GROUNDING}\n\n\
         Question: {question}\n",
        title = field(project.title.as_deref()),
        description = field(project.description.as_deref()),
        guide = field(project.guide_name.as_deref()),
        students = students(project),
    )
}

/// Build the faculty-evaluation summary prompt.
pub fn summary_prompt(project: &Project) -> String {
    format!(
        "Summarize this student project for faculty evaluation:\n\
         Title: {title}\n\
         Description: {description}\n\
         Guide: {guide}\n\
         Co-Guide: {co_guide}\n\
         Students: {students}\n\
         Repository: {repo}\n",
        title = field(project.title.as_deref()),
        description = field(project.description.as_deref()),
        guide = field(project.guide_name.as_deref()),
        co_guide = field(project.co_guide_name.as_deref()),
        students = students(project),
        repo = field(project.github_repo.as_deref()),
    )
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
