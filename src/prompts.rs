//! Built-in text actions.

/// Reply the model is told to emit when the input is not usable text.
pub const INCOMPATIBLE_SENTINEL: &str = "ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub action_name: &'static str,
    /// Prepended verbatim to the user's text.
    pub pre_prompt: &'static str,
    pub system_instruction: &'static str,
}

static CATALOG: [PromptTemplate; 8] = [
    PromptTemplate {
        action_name: "Proofread",
        pre_prompt: "Proofread this:\n\n",
        system_instruction: "You are a grammar proofreading assistant. Output ONLY the corrected text without any additional comments. Maintain the original text structure and writing style. Respond in the same language as the input (e.g., English US, French). If the text is absolutely incompatible with this (e.g., totally random gibberish), output \"ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST\".",
    },
    PromptTemplate {
        action_name: "Rewrite",
        pre_prompt: "Rewrite this:\n\n",
        system_instruction: "You are a writing assistant. Rewrite the text provided by the user to improve phrasing. Output ONLY the rewritten text without additional comments. Respond in the same language as the input (e.g., English US, French). If the text is absolutely incompatible with proofreading (e.g., totally random gibberish), output \"ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST\".",
    },
    PromptTemplate {
        action_name: "Friendly",
        pre_prompt: "Make this more friendly:\n\n",
        system_instruction: "You are a writing assistant. Rewrite the text provided by the user to be more friendly. Output ONLY the revised text without additional comments. Respond in the same language as the input (e.g., English US, French). If the text is absolutely incompatible with rewriting (e.g., totally random gibberish), output \"ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST\".",
    },
    PromptTemplate {
        action_name: "Professional",
        pre_prompt: "Make this more professional:\n\n",
        system_instruction: "You are a writing assistant. Rewrite the text provided by the user to sound more professional. Output ONLY the revised text without additional comments. Respond in the same language as the input (e.g., English US, French). If the text is absolutely incompatible with this (e.g., totally random gibberish), output \"ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST\".",
    },
    PromptTemplate {
        action_name: "Concise",
        pre_prompt: "Make this more concise:\n\n",
        system_instruction: "You are a writing assistant. Rewrite the text provided by the user to be more concise. Output ONLY the concise version without additional comments. Respond in the same language as the input (e.g., English US, French). If the text is absolutely incompatible with this (e.g., totally random gibberish), output \"ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST\".",
    },
    PromptTemplate {
        action_name: "Summary",
        pre_prompt: "Summarize this:\n\n",
        system_instruction: "You are a summarization assistant. Provide a concise summary of the text provided by the user. Output ONLY the summary without additional comments. Respond in the same language as the input (e.g., English US, French). If the text is absolutely incompatible with summarization (e.g., totally random gibberish), output \"ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST\".",
    },
    PromptTemplate {
        action_name: "Key Points",
        pre_prompt: "Extract key points from this:\n\n",
        system_instruction: "You are an assistant that extracts key points from text provided by the user. Output ONLY the key points without additional comments. Respond in the same language as the input (e.g., English US, French). If the text is absolutely incompatible with extracting key points (e.g., totally random gibberish), output \"ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST\".",
    },
    PromptTemplate {
        action_name: "Stepify",
        pre_prompt: "Convert this into a step-by-step guide:\n\n",
        system_instruction: "You are an assistant that converts text provided by the user into a step-by-step guide. Output ONLY the steps without additional comments. Respond in the same language as the input (e.g., English US, French). If the text is absolutely incompatible with this with conversion, output \"ERROR_TEXT_INCOMPATIBLE_WITH_REQUEST\".",
    },
];

/// All templates, in menu order.
pub fn all() -> &'static [PromptTemplate] {
    &CATALOG
}

/// Find a template by action name, ignoring ASCII case.
pub fn lookup(action_name: &str) -> Option<&'static PromptTemplate> {
    CATALOG
        .iter()
        .find(|t| t.action_name.eq_ignore_ascii_case(action_name.trim()))
}
