//! Prompt templates and the message lists built from them

use crate::state::EssayState;
use essaycraft_provider::ChatMessage;

const PLAN_PROMPT: &str = "You are an expert writer tasked with writing a high-level outline of an essay. \
Write such an outline for the topic the user provides. Give an outline of the essay along with any \
relevant notes or instructions for each section.";

const WRITER_PROMPT: &str = "You are an essay assistant tasked with writing excellent 5-paragraph essays. \
Generate the best essay possible for the user's request and the initial outline. \
If the user provides critique, respond with a revised version of your previous attempt. \
Use any of the research below as needed:\n\n------\n\n";

const REFLECTION_PROMPT: &str = "You are a teacher grading an essay submission. \
Generate critique and recommendations for the user's submission. \
Provide detailed recommendations, including requests for length, depth, style, etc.";

const RESEARCH_PLAN_PROMPT: &str = "You are a researcher charged with providing information that can \
be used when writing the following essay. Generate a list of search queries that will gather any \
relevant information.";

const RESEARCH_CRITIQUE_PROMPT: &str = "You are a researcher charged with providing information that can \
be used when making any requested revisions (as outlined below). Generate a list of search queries \
that will gather any relevant information.";

pub(crate) fn plan_messages(state: &EssayState) -> Vec<ChatMessage> {
    vec![ChatMessage::system(PLAN_PROMPT), ChatMessage::user(&state.topic)]
}

/// The first research pass works from the topic; later passes work from the
/// latest critique.
pub(crate) fn research_messages(state: &EssayState, max_queries: usize) -> Vec<ChatMessage> {
    let limit = format!(
        " Only generate {} queries max, one per line, with no other text.",
        max_queries
    );

    if state.has_critique() {
        vec![
            ChatMessage::system(format!("{}{}", RESEARCH_CRITIQUE_PROMPT, limit)),
            ChatMessage::user(&state.critique),
        ]
    } else {
        vec![
            ChatMessage::system(format!("{}{}", RESEARCH_PLAN_PROMPT, limit)),
            ChatMessage::user(&state.topic),
        ]
    }
}

/// When a critiqued draft exists it is replayed so the model revises it
/// rather than starting over.
pub(crate) fn generate_messages(state: &EssayState) -> Vec<ChatMessage> {
    let mut messages = vec![
        ChatMessage::system(format!("{}{}", WRITER_PROMPT, state.research_text())),
        ChatMessage::user(format!(
            "{}\n\nHere is my plan:\n\n{}",
            state.topic, state.outline
        )),
    ];

    if state.has_draft() && state.has_critique() {
        messages.push(ChatMessage::assistant(&state.draft));
        messages.push(ChatMessage::user(format!(
            "Here is my critique of that essay:\n\n{}\n\nPlease revise it.",
            state.critique
        )));
    }

    messages
}

pub(crate) fn reflect_messages(state: &EssayState) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(REFLECTION_PROMPT),
        ChatMessage::user(&state.draft),
    ]
}

/// Pull search queries out of a free-form LLM answer.
///
/// One query per non-blank line; list markers and wrapping quotes are
/// stripped and at most `max_queries` are kept.
pub fn parse_queries(text: &str, max_queries: usize) -> Vec<String> {
    text.lines()
        .map(clean_query)
        .filter(|q| !q.is_empty())
        .take(max_queries)
        .collect()
}

fn clean_query(line: &str) -> String {
    let q = strip_list_marker(line.trim());
    q.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

/// Drop a leading `-`, `*`, `•`, `1.` or `2)` when it stands alone, i.e. is
/// followed by whitespace or ends the line. `1.5 billion` is left intact.
fn strip_list_marker(line: &str) -> &str {
    let marker_len = match line.chars().next() {
        Some(c @ ('-' | '*' | '•')) => c.len_utf8(),
        Some(c) if c.is_ascii_digit() => {
            let digits = line.bytes().take_while(u8::is_ascii_digit).count();
            match line.as_bytes().get(digits) {
                Some(b'.') | Some(b')') => digits + 1,
                _ => return line,
            }
        }
        _ => return line,
    };

    let rest = &line[marker_len..];
    match rest.chars().next() {
        None => "",
        Some(c) if c.is_whitespace() => rest.trim_start(),
        Some(_) => line,
    }
}
