//! Operator notes on individual results, keyed by loan identifier.
//!
//! Notes live on the results of one run only; the next run starts clean.

use std::collections::HashMap;

use crate::model::{ReconOutcome, ReconciliationResult};

pub struct AnnotationStore<'a> {
    results: &'a mut [ReconciliationResult],
    index: HashMap<String, usize>,
}

impl<'a> AnnotationStore<'a> {
    pub fn new(results: &'a mut [ReconciliationResult]) -> Self {
        let index = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.loan_id.clone(), i))
            .collect();
        Self { results, index }
    }

    /// Replace the note on `loan_id`. Returns false if no such result exists.
    /// Blank text clears the note.
    pub fn set_note(&mut self, loan_id: &str, text: impl Into<String>) -> bool {
        let Some(&i) = self.index.get(loan_id) else {
            log::debug!("no result for loan '{loan_id}', note dropped");
            return false;
        };
        let text = text.into();
        self.results[i].notes = if text.trim().is_empty() { None } else { Some(text) };
        true
    }

    pub fn get_note(&self, loan_id: &str) -> Option<&str> {
        let &i = self.index.get(loan_id)?;
        self.results[i].notes.as_deref()
    }

    /// Apply notes in bulk. Returns the loan ids that matched no result.
    pub fn apply<I, K, V>(&mut self, notes: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut unknown = Vec::new();
        for (loan_id, text) in notes {
            if !self.set_note(loan_id.as_ref(), text) {
                unknown.push(loan_id.as_ref().to_string());
            }
        }
        unknown
    }
}

impl ReconOutcome {
    pub fn annotations(&mut self) -> AnnotationStore<'_> {
        AnnotationStore::new(&mut self.results)
    }
}
