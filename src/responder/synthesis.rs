//! Templated fallback replies
//!
//! Used when neither a pattern nor stored knowledge answers a turn. Pure
//! text generation from the current turn; nothing here reads or writes the
//! knowledge store.

use rand::Rng;

/// Question templates and the placeholder used when there are no keywords
const QUESTION_TEMPLATES: &[(&str, &str)] = &[
    (
        "That's an interesting question! Based on what I know, {topic} is quite fascinating. What specifically would you like to know?",
        "this topic",
    ),
    (
        "Good question! I'm learning about {topic}. Can you tell me more details?",
        "this",
    ),
    (
        "Let me think about that... Regarding {topic}, I'd say it depends on the context. What's your take on it?",
        "your question",
    ),
];

const TOPIC_TEMPLATES: &[&str] = &[
    "Interesting! I'm noting down information about {topic}. This will help me learn.",
    "Thanks for sharing that about {topic}! I'm learning from this conversation.",
    "I see you're talking about {topic}. That's useful information!",
    "Got it! I've learned something new about {topic}. Tell me more!",
    "That's helpful information about {topic}! I'm storing this in my knowledge base.",
];

const GENERIC_TEMPLATES: &[&str] = &[
    "I understand. Can you elaborate on that?",
    "Interesting! Tell me more.",
    "I'm listening. Please continue.",
    "That's good to know! What else?",
];

/// Which template family produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Question,
    Topic,
    Generic,
}

/// Template family for a turn
pub fn classify(text: &str, keywords: &[String]) -> TemplateKind {
    if text.contains('?') {
        TemplateKind::Question
    } else if !keywords.is_empty() {
        TemplateKind::Topic
    } else {
        TemplateKind::Generic
    }
}

/// First keyword, or the first two joined with "and"
pub fn topic(keywords: &[String]) -> Option<String> {
    match keywords {
        [] => None,
        [only] => Some(only.clone()),
        [first, second, ..] => Some(format!("{} and {}", first, second)),
    }
}

/// Build a fallback reply for the turn
pub fn synthesize<R: Rng + ?Sized>(text: &str, keywords: &[String], rng: &mut R) -> String {
    match classify(text, keywords) {
        TemplateKind::Question => {
            let (template, placeholder) = QUESTION_TEMPLATES[rng.random_range(0..QUESTION_TEMPLATES.len())];
            let subject = keywords.first().map(String::as_str).unwrap_or(placeholder);
            template.replace("{topic}", subject)
        }
        TemplateKind::Topic => {
            let template = TOPIC_TEMPLATES[rng.random_range(0..TOPIC_TEMPLATES.len())];
            let subject = topic(keywords).unwrap_or_default();
            template.replace("{topic}", &subject)
        }
        TemplateKind::Generic => GENERIC_TEMPLATES[rng.random_range(0..GENERIC_TEMPLATES.len())].to_string(),
    }
}

/// Every reply the question family can produce for these keywords
pub fn question_replies(keywords: &[String]) -> Vec<String> {
    QUESTION_TEMPLATES
        .iter()
        .map(|&(template, placeholder)| {
            template.replace("{topic}", keywords.first().map(String::as_str).unwrap_or(placeholder))
        })
        .collect()
}

/// Every reply the topic family can produce for these keywords
pub fn topic_replies(keywords: &[String]) -> Vec<String> {
    let subject = topic(keywords).unwrap_or_default();
    TOPIC_TEMPLATES
        .iter()
        .map(|template| template.replace("{topic}", &subject))
        .collect()
}

/// The no-keyword continuation prompts
pub fn generic_replies() -> Vec<String> {
    GENERIC_TEMPLATES.iter().map(|s| s.to_string()).collect()
}
