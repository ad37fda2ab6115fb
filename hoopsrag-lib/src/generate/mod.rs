//! Answer generation with a hosted language model
//!
//! The retrieved documents become the context of a fixed prompt
//! ([`PromptTemplate`]) that is sent to a [`Generator`]. The model's text is
//! returned verbatim.
//!
//! Staying within the context is a prompt-level contract the model may
//! break. [`AnswerGenerator`] flags numbers in an answer that the context
//! never mentions, but it cannot prove the answer faithful.
//!
//! # Usage
//!
//! ```ignore
//! use hoopsrag_lib::generate::{AnswerGenerator, OpenAiGenerator, PromptTemplate};
//!
//! let generator = OpenAiGenerator::from_config(&config.generation)?;
//! let mut answers = AnswerGenerator::new(generator, PromptTemplate::TURKISH);
//! let answer = answers.answer(&documents, "Jayson Tatum kaç sayı attı?")?;
//! ```

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::normalize::NormalizedDocument;
use crate::{Error, Result};

/// Trait for text generation backends
pub trait Generator: Send + Sync {
    /// Complete `prompt`, returning the model's raw text
    fn generate(&mut self, prompt: &str) -> Result<String>;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Turns retrieved documents and a question into an answer.
pub struct AnswerGenerator<G: Generator> {
    generator: G,
    template: PromptTemplate,
}

impl<G: Generator> AnswerGenerator<G> {
    #[must_use]
    pub fn new(generator: G, template: PromptTemplate) -> Self {
        Self {
            generator,
            template,
        }
    }

    /// Answer `question` from `documents`, in retrieval order.
    ///
    /// Fails with [`Error::InvalidInput`] when there are no documents; check
    /// retrieval results before calling. Backend failures are
    /// [`Error::Generation`].
    pub fn answer(&mut self, documents: &[NormalizedDocument], question: &str) -> Result<String> {
        if documents.is_empty() {
            return Err(Error::InvalidInput("no context documents to answer from".to_string()));
        }

        let context = PromptTemplate::context(documents);
        let prompt = self.template.render(&context, question);
        debug!(
            model = self.generator.model_name(),
            documents = documents.len(),
            prompt_chars = prompt.chars().count(),
            "generating answer"
        );

        let answer = self.generator.generate(&prompt)?;

        let ungrounded = ungrounded_numbers(&answer, &context);
        if !ungrounded.is_empty() {
            warn!(?ungrounded, "answer mentions numbers that are not in the context");
        }

        Ok(answer)
    }

    /// The prompt template in use
    #[must_use]
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Returns a reference to the generator.
    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }
}

/// Numbers in `answer` that never appear in `context`.
///
/// Decimal commas are treated as points, so `50,0` matches `50.0`.
#[must_use]
pub fn ungrounded_numbers(answer: &str, context: &str) -> Vec<String> {
    let known: HashSet<String> = numbers(context).collect();
    let mut seen = HashSet::new();
    numbers(answer)
        .filter(|n| !known.contains(n))
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

fn numbers(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .map(|t| t.trim_matches(|c: char| c == '.' || c == ','))
        .filter(|t| t.starts_with(|c: char| c.is_ascii_digit()))
        .map(|t| t.replace(',', "."))
}

mod openai;
mod prompt;

pub use openai::*;
pub use prompt::*;

#[cfg(test)]
mod tests {
    use super::*;

    /// Generator that records the prompt and replies with a canned answer.
    struct Canned {
        reply: Result<String>,
        prompts: Vec<String>,
    }

    impl Canned {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Vec::new(),
            }
        }
    }

    impl Generator for Canned {
        fn generate(&mut self, prompt: &str) -> Result<String> {
            self.prompts.push(prompt.to_string());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(e) => Err(Error::Generation(e.to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn docs() -> Vec<NormalizedDocument> {
        vec![
            NormalizedDocument::new("Jayson Tatum 30 sayı attı.", None),
            NormalizedDocument::new("Jaylen Brown 24 sayı attı.", None),
        ]
    }

    #[test]
    fn test_answer_is_returned_verbatim() {
        let mut answers = AnswerGenerator::new(Canned::replying("  Jayson Tatum 30 sayı attı.\n"), PromptTemplate::TURKISH);
        let answer = answers.answer(&docs(), "Jayson Tatum kaç sayı attı?").unwrap();
        assert_eq!(answer, "  Jayson Tatum 30 sayı attı.\n");
    }

    #[test]
    fn test_prompt_carries_context_in_order() {
        let mut answers = AnswerGenerator::new(Canned::replying("30"), PromptTemplate::TURKISH);
        answers.answer(&docs(), "Jayson Tatum kaç sayı attı?").unwrap();

        let prompt = &answers.generator().prompts[0];
        let tatum = prompt.find("Jayson Tatum 30").unwrap();
        let brown = prompt.find("Jaylen Brown 24").unwrap();
        assert!(tatum < brown);
        assert!(prompt.contains("Soru: Jayson Tatum kaç sayı attı?"));
    }

    #[test]
    fn test_no_documents_is_invalid_input() {
        let mut answers = AnswerGenerator::new(Canned::replying("x"), PromptTemplate::ENGLISH);
        let result = answers.answer(&[], "anything");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(answers.generator().prompts.is_empty());
    }

    #[test]
    fn test_backend_failure_is_generation_error() {
        let canned = Canned {
            reply: Err(Error::Generation("quota exceeded".to_string())),
            prompts: Vec::new(),
        };
        let mut answers = AnswerGenerator::new(canned, PromptTemplate::TURKISH);
        assert!(matches!(answers.answer(&docs(), "q"), Err(Error::Generation(_))));
    }

    #[test]
    fn test_ungrounded_numbers() {
        let context = "Tatum 30 sayı, 8 ribaund. Saha içi isabet oranı 50.0% idi.";

        assert!(ungrounded_numbers("Tatum 30 sayı attı.", context).is_empty());
        assert!(ungrounded_numbers("İsabet oranı %50,0 idi.", context).is_empty());
        assert_eq!(ungrounded_numbers("Tatum 35 sayı ve 35 asist.", context), vec!["35"]);
    }
}
