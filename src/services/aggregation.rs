//! Supervisor-side reply assembly.
//!
//! Every text produced here is non-empty and written in the user's language.
//! The user's name is left as `{{username}}` for the session layer.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::models::{Language, SpecialistOutcome, SpecialistRole, TurnStatus};

static NARRATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(vou|irei|estou|agora vou|deixe-me)\s+(executar|processar|rodar|chamar|consultar|usar|utilizar)\b",
        r"(?i)\b(executando|executei|processando|processei|rodando|rodei)\s+(o|a|os|as)?\s*(c[oó]digo|consulta|query|comando|ferramenta|script)\b",
        r"(?i)\b(chamando|chamei|usando|utilizando|usei|utilizei)\s+a\s+ferramenta\b",
        r"(?i)\b(let me|i will|i'll|i am going to|i'm going to)\s+(run|execute|call|query|check|process|use)\b",
        r"(?i)\b(executing|running|calling|ran|executed|called)\s+(the\s+)?(code|query|tool|command|script)\b",
        r"(?i)\bprocessing (your|the) request\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid narration regex"))
    .collect()
});

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid code fence regex"));

static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("valid digit regex"));

/// Punctuation that closes a clause when followed by whitespace or the end of the line.
const CLAUSE_ENDS: &[char] = &['.', '!', '?', ':', ';'];

/// Drop code blocks and clauses narrating execution or processing.
///
/// Only the narrating clause is removed; the rest of its line is kept.
/// Clauses that carry numbers are kept even if they narrate.
pub fn strip_narration(text: &str) -> String {
    let without_code = CODE_FENCE.replace_all(text, "");
    let kept: Vec<String> = without_code
        .lines()
        .filter_map(|line| {
            let cleaned = strip_narrating_clauses(line);
            // A line that was all narration disappears instead of leaving a blank
            if cleaned.trim().is_empty() && !line.trim().is_empty() {
                None
            } else {
                Some(cleaned)
            }
        })
        .collect();

    collapse_blank_lines(&kept).trim().to_string()
}

fn strip_narrating_clauses(line: &str) -> String {
    let parts = clauses(line);
    let kept: Vec<&str> = parts
        .iter()
        .copied()
        .filter(|clause| {
            DIGIT.is_match(clause) || !NARRATION_PATTERNS.iter().any(|re| re.is_match(clause))
        })
        .collect();

    if kept.len() == parts.len() {
        line.to_string()
    } else {
        kept.concat().trim().to_string()
    }
}

/// Split `line` after each clause-ending punctuation mark, keeping the marks.
///
/// Marks inside tokens (`36.5`, `/a.b`) do not split.
fn clauses(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if CLAUSE_ENDS.contains(&c) && at_boundary {
            let end = i + c.len_utf8();
            parts.push(&line[start..end]);
            start = end;
        }
    }
    if start < line.len() {
        parts.push(&line[start..]);
    }
    parts
}

fn collapse_blank_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut previous_blank = false;
    for line in lines {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        out.push_str(line.trim_end());
        out.push('\n');
        previous_blank = blank;
    }
    out
}

/// Lowercase the first letter of `body` so it reads on after "{{username}}, ".
///
/// Words that are capitalized throughout (acronyms, "I") keep their case.
fn continue_sentence(body: &str) -> String {
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_lowercase() => {
            first.to_lowercase().chain(body[first.len_utf8()..].chars()).collect()
        }
        _ => body.to_string(),
    }
}

/// Self-introduction for greetings and first contact.
pub fn greeting(language: Language) -> String {
    match language {
        Language::Portuguese => "Olá, {{username}}! Sou o assistente da plataforma. Posso ajudar com \
            cadastros e dúvidas de navegação, gerar relatórios e gráficos sobre os seus dados e \
            otimizar o sequenciamento de carregamento e descarregamento de navios. Como posso ajudar?"
            .to_string(),
        Language::English => "Hello, {{username}}! I'm the platform assistant. I can help with \
            registering records and navigating the platform, generate reports and charts from \
            your data, and optimize ship loading and unloading sequences. How can I help?"
            .to_string(),
    }
}

/// Short confirmation for the analytics branch; the artifact itself is
/// delivered through the platform.
pub fn analytics_confirmation(language: Language) -> String {
    match language {
        Language::Portuguese => {
            "{{username}}, sua solicitação foi processada e o resultado já está disponível na plataforma."
                .to_string()
        }
        Language::English => {
            "{{username}}, your request was processed and the result is now available on the platform."
                .to_string()
        }
    }
}

/// Minimal reply when the specialist produced nothing usable.
pub fn acknowledgment(language: Language) -> String {
    match language {
        Language::Portuguese => "{{username}}, recebi sua mensagem, mas não obtive uma resposta \
            do especialista. Pode reformular ou dar mais detalhes?"
            .to_string(),
        Language::English => "{{username}}, I received your message but the specialist returned \
            no answer. Could you rephrase or add more details?"
            .to_string(),
    }
}

/// Explicit failure text for a specialist turn that did not complete.
pub fn failure_notice(status: TurnStatus, role: SpecialistRole, language: Language) -> String {
    let agent = role.agent_name();
    match (status, language) {
        (TurnStatus::BudgetExceeded, Language::Portuguese) => format!(
            "Erro: o agente {agent} atingiu o limite de etapas sem concluir a solicitação. \
             Nenhum resultado foi gerado; tente novamente com mais detalhes."
        ),
        (TurnStatus::BudgetExceeded, Language::English) => format!(
            "Error: the {agent} agent reached its step limit without completing the request. \
             No result was produced; please try again with more details."
        ),
        (TurnStatus::DeadlineExceeded, Language::Portuguese) => format!(
            "Erro: o agente {agent} excedeu o tempo limite e a solicitação não foi concluída."
        ),
        (TurnStatus::DeadlineExceeded, Language::English) => format!(
            "Error: the {agent} agent timed out and the request was not completed."
        ),
        (TurnStatus::ModelFailed, Language::Portuguese) => format!(
            "Erro: o agente {agent} não conseguiu processar a solicitação no momento. Tente novamente."
        ),
        (TurnStatus::ModelFailed, Language::English) => format!(
            "Error: the {agent} agent could not process the request right now. Please try again."
        ),
        (TurnStatus::Completed, _) => String::new(),
    }
}

/// Note appended when a tool error is missing from the specialist's text.
pub fn tool_error_note(tool: &str, observation: &str, language: Language) -> String {
    match language {
        Language::Portuguese => format!("Erro na ferramenta {tool}: {observation}"),
        Language::English => format!("Error in tool {tool}: {observation}"),
    }
}

/// Whether `text` already tells the user something went wrong.
pub fn mentions_error(text: &str) -> bool {
    let folded = crate::domain::models::routing::fold_text(text);
    ["erro", "error", "falh", "fail", "nao foi possivel", "could not", "unable"]
        .iter()
        .any(|marker| folded.contains(marker))
}

/// Final text for a specialist branch.
pub fn aggregate(outcome: &SpecialistOutcome, language: Language) -> String {
    if outcome.status.is_failure() {
        return non_empty_or_ack(outcome.text.trim(), language);
    }

    let body = strip_narration(&outcome.text);
    if outcome.role == SpecialistRole::Analytics {
        // Errors are relayed; published artifacts are only confirmed
        if outcome.failed_tools().next().is_some() && mentions_error(&body) {
            return non_empty_or_ack(&body, language);
        }
        if outcome.published_artifact() {
            return analytics_confirmation(language);
        }
    }

    if body.is_empty() {
        return acknowledgment(language);
    }
    format!("{{{{username}}}}, {}", continue_sentence(&body))
}

fn non_empty_or_ack(text: &str, language: Language) -> String {
    if text.is_empty() {
        acknowledgment(language)
    } else {
        text.to_string()
    }
}
