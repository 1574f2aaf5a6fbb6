//! Prompt assembly for the onboarding assistant.
//!
//! Questions are enriched with up to [`MAX_CONTEXT_FAQS`] keyword-matched FAQ entries before
//! they reach the model server.

use crate::infrastructure::entities::Faq;
use minijinja::{Environment, context};

pub const MAX_CONTEXT_FAQS: i64 = 3;

const PROMPT_TEMPLATE: &str = "{% if context %}Contexto: {{ context }}\n\nPregunta: {{ question }}{% else %}{{ question }}{% endif %}";

const FAQ_CONTEXT_TEMPLATE: &str = "FAQs relevantes encontradas:\n{% for faq in faqs %}\nPregunta: {{ faq.question }}\nRespuesta: {{ faq.answer }}\n{% endfor %}";

/// Splits a question into the lowercase keywords used for FAQ lookup.
///
/// Leading and trailing punctuation (`¿`, `?`, `,`...) is not part of a keyword.
pub fn keywords(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Renders the prompt sent to the model. Empty context is the same as no context.
pub fn build_prompt(question: &str, context: Option<&str>) -> Result<String, minijinja::Error> {
    Environment::new().render_str(PROMPT_TEMPLATE, context! { question, context })
}

/// Renders matched FAQs as prompt context, or `None` when nothing matched.
pub fn build_faq_context(faqs: &[Faq]) -> Result<Option<String>, minijinja::Error> {
    if faqs.is_empty() {
        return Ok(None);
    }

    Environment::new()
        .render_str(FAQ_CONTEXT_TEMPLATE, context! { faqs })
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn faq(question: &str, answer: &str) -> Faq {
        Faq {
            id: Uuid::new_v4(),
            question: question.to_owned(),
            answer: answer.to_owned(),
        }
    }

    #[test]
    fn test_keywords_are_lowercase_and_whitespace_split() {
        assert_eq!(
            keywords("¿Cómo  solicito\tVACACIONES?"),
            vec!["cómo", "solicito", "vacaciones"]
        );
    }

    #[test]
    fn test_keywords_drop_bare_punctuation() {
        assert_eq!(
            keywords("¿ Horario, días-libres ... ?"),
            vec!["horario", "días-libres"]
        );
    }

    #[test]
    fn test_keywords_of_blank_question_is_empty() {
        assert!(keywords("   ").is_empty());
        assert!(keywords(" ¿? ").is_empty());
    }

    #[test]
    fn test_prompt_without_context_is_the_question() {
        let prompt = build_prompt("¿Dónde está la cafetería?", None).unwrap();
        assert_eq!(prompt, "¿Dónde está la cafetería?");
    }

    #[test]
    fn test_prompt_with_empty_context_is_the_question() {
        let prompt = build_prompt("Hola", Some("")).unwrap();
        assert_eq!(prompt, "Hola");
    }

    #[test]
    fn test_prompt_with_context_prefixes_it() {
        let prompt = build_prompt("Hola", Some("algo útil")).unwrap();
        assert_eq!(prompt, "Contexto: algo útil\n\nPregunta: Hola");
    }

    #[test]
    fn test_prompt_does_not_escape_markup() {
        let prompt = build_prompt("<b>a & b</b>", None).unwrap();
        assert_eq!(prompt, "<b>a & b</b>");
    }

    #[test]
    fn test_faq_context_none_without_matches() {
        assert_eq!(build_faq_context(&[]).unwrap(), None);
    }

    #[test]
    fn test_faq_context_lists_question_answer_pairs() {
        let context = build_faq_context(&[
            faq("¿Horario?", "De 9 a 18."),
            faq("¿Vacaciones?", "Se piden en el portal."),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(
            context,
            "FAQs relevantes encontradas:\n\
             \nPregunta: ¿Horario?\nRespuesta: De 9 a 18.\n\
             \nPregunta: ¿Vacaciones?\nRespuesta: Se piden en el portal.\n"
        );
    }
}
