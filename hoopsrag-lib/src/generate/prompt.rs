use crate::normalize::{Language, NormalizedDocument};

/// Instruction wrapper around retrieved context and the user's question.
///
/// The instructions restrict the model to the context, fix the answer
/// language, and name the exact phrase to use when the context has no
/// answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    instructions: &'static str,
    context_label: &'static str,
    question_label: &'static str,
    answer_label: &'static str,
    unknown_answer: &'static str,
}

impl PromptTemplate {
    pub const TURKISH: Self = Self {
        instructions: "Sen NBA maç istatistikleri hakkında soruları yanıtlayan bir asistansın. \
            Soruyu yalnızca aşağıdaki bağlamdaki bilgilere dayanarak yanıtla. \
            Bağlamda olmayan hiçbir bilgiyi ekleme ve tahmin yürütme. \
            Cevabını Türkçe ver. \
            Bağlam sorunun cevabını içermiyorsa yalnızca şu cümleyi yaz: ",
        context_label: "Bağlam:",
        question_label: "Soru:",
        answer_label: "Cevap:",
        unknown_answer: "Bu sorunun cevabı veri setinde bulunmuyor.",
    };

    pub const ENGLISH: Self = Self {
        instructions: "You are an assistant answering questions about NBA game statistics. \
            Answer the question using only the information in the context below. \
            Do not add facts that are not in the context and do not guess. \
            Answer in English. \
            If the context does not contain the answer, reply with exactly this sentence: ",
        context_label: "Context:",
        question_label: "Question:",
        answer_label: "Answer:",
        unknown_answer: "The answer to this question is not in the dataset.",
    };

    #[must_use]
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Turkish => Self::TURKISH,
            Language::English => Self::ENGLISH,
        }
    }

    /// The sentinel the model is told to use when the context has no answer
    #[must_use]
    pub fn unknown_answer(&self) -> &'static str {
        self.unknown_answer
    }

    /// Join document texts into one context block, one document per line.
    #[must_use]
    pub fn context(documents: &[NormalizedDocument]) -> String {
        documents
            .iter()
            .map(|d| format!("- {}", d.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render the full prompt
    #[must_use]
    pub fn render(&self, context: &str, question: &str) -> String {
        format!(
            "{instructions}\"{unknown}\"\n\n{context_label}\n{context}\n\n{question_label} {question}\n{answer_label}",
            instructions = self.instructions,
            unknown = self.unknown_answer,
            context_label = self.context_label,
            question_label = self.question_label,
            answer_label = self.answer_label,
            question = question.trim(),
        )
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::TURKISH
    }
}
