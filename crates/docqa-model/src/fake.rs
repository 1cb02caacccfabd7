use anyhow::{bail, Result};
use docqa_core::Inferencer;

/// Deterministic stand-in for the language model.
///
/// Answers with the context sentence sharing the most words with the question,
/// which is enough to exercise the whole pipeline without loading weights.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeModel;

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| w.len() > 2).map(str::to_lowercase).collect()
}

impl Inferencer for FakeModel {
    fn infer(&self, context: &str, question: &str) -> Result<String> {
        if context.trim().is_empty() { bail!("empty context"); }
        let wanted = words(question);
        let best = context
            .split_inclusive(['.', '!', '?', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| (words(s).iter().filter(|w| wanted.contains(w)).count(), s))
            .fold((0usize, ""), |acc, cur| if cur.0 > acc.0 { cur } else { acc });
        match best {
            (0, _) => Ok("I could not find that in the document.".to_string()),
            (_, sentence) => Ok(sentence.to_string()),
        }
    }
}
