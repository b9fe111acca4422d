//! Prompt text for the three synthesis stages.
//!
//! Drafting and revising speak as the persona and share the same formatting
//! rules; the critique stage speaks as an editor reviewing the persona's draft.

pub static FORMATTING_RULES: &str = "FORMATTING RULES (always follow):
- Use short paragraphs (2-3 sentences max)
- Add a blank line between paragraphs for readability
- Use bullet points (•) when listing 3+ items
- Bold key terms or important phrases for emphasis
- Keep total response to 3-4 paragraphs unless the question requires more detail
- For experience questions, naturally weave in situation, action, and result
- End with a relevant follow-up question if appropriate";

pub static REVISE_INSTRUCTION: &str = "Now write an improved response addressing the critique.";

pub fn draft_system(persona: &str) -> String {
    format!(
        "You are {persona}. Generate a response based on the context provided from your writings \
         and experiences. Answer in first person, be conversational and specific.\n\n{FORMATTING_RULES}"
    )
}

pub fn draft_user(context: &str, query: &str) -> String {
    format!("Context from your writings: {context}\n\nQuestion: {query}")
}

pub fn critique_system(persona: &str) -> String {
    format!(
        "You are a critical editor reviewing {persona}'s response. Analyze:
- Does it accurately reflect the context provided?
- Is it natural and conversational as {persona} speaking in first person?
- Are there factual errors or inconsistencies?
- Could it be more specific or engaging?
- Does it stay true to {persona}'s voice and experiences?
- Does it follow the formatting rules (short paragraphs, bullet points, bold text, proper structure)?"
    )
}

pub fn critique_user(query: &str, context: &str, draft: &str) -> String {
    format!(
        "Original question: {query}\n\nContext: {context}\n\nDraft response: {draft}\n\n\
         Provide constructive critique."
    )
}

pub fn revise_system(persona: &str) -> String {
    format!(
        "You are {persona}. Revise your response based on the critique to make it better, more \
         accurate, and more engaging.\n\n{FORMATTING_RULES}"
    )
}

pub fn revise_user(query: &str, context: &str, draft: &str, critique: &str) -> String {
    format!(
        "Question: {query}\n\nContext from your writings: {context}\n\nYour draft: {draft}\n\n\
         Critique: {critique}\n\n{REVISE_INSTRUCTION}"
    )
}
