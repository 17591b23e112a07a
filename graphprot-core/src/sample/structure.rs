use std::collections::HashMap;

use crate::types::StructureContext;

/// Parsed RNA secondary structure of one sample.
///
/// Built from a balanced dot-bracket string. Keeps the pair table (partner
/// of each position) and the loop context of every position.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pairs: Vec<Option<usize>>,
    contexts: Vec<StructureContext>,
}

impl Structure {
    /// Parse a dot-bracket string (`(`, `)`, `.`).
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the string contains other symbols
    /// or the brackets are unbalanced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graphprot_core::sample::structure::Structure;
    /// use graphprot_core::types::StructureContext;
    ///
    /// let structure = Structure::from_dot_bracket(b"..((...))..").unwrap();
    /// assert_eq!(structure.partner(2), Some(8));
    /// assert_eq!(structure.context(4), StructureContext::Hairpin);
    /// assert_eq!(structure.context(0), StructureContext::External);
    /// ```
    pub fn from_dot_bracket(dot_bracket: &[u8]) -> Result<Self, String> {
        let mut pairs = vec![None; dot_bracket.len()];
        let mut open = Vec::new();

        for (i, &symbol) in dot_bracket.iter().enumerate() {
            match symbol {
                b'(' => open.push(i),
                b')' => {
                    let j = open
                        .pop()
                        .ok_or_else(|| format!("unmatched ')' at structure position {i}"))?;
                    pairs[j] = Some(i);
                    pairs[i] = Some(j);
                }
                b'.' => {}
                other => {
                    return Err(format!(
                        "invalid structure symbol '{}' at position {i}",
                        other as char
                    ));
                }
            }
        }
        if let Some(j) = open.pop() {
            return Err(format!("unmatched '(' at structure position {j}"));
        }

        let contexts = loop_contexts(&pairs);
        Ok(Self { pairs, contexts })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairing partner of `position`, if paired
    #[must_use]
    pub fn partner(&self, position: usize) -> Option<usize> {
        self.pairs[position]
    }

    #[must_use]
    pub fn context(&self, position: usize) -> StructureContext {
        self.contexts[position]
    }

    /// All base pairs `(i, j)` with `i < j`, in order of `i`
    pub fn base_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs
            .iter()
            .enumerate()
            .filter_map(|(i, partner)| partner.filter(|&j| j > i).map(|j| (i, j)))
    }

    /// Render back to dot-bracket notation
    #[must_use]
    pub fn to_dot_bracket(&self) -> String {
        self.pairs
            .iter()
            .enumerate()
            .map(|(i, partner)| match partner {
                Some(j) if *j > i => '(',
                Some(_) => ')',
                None => '.',
            })
            .collect()
    }
}

/// Assign a loop context to every position of a pair table.
fn loop_contexts(pairs: &[Option<usize>]) -> Vec<StructureContext> {
    let mut contexts = vec![StructureContext::External; pairs.len()];
    let mut enclosing: Vec<usize> = Vec::new();
    let mut loop_types: HashMap<usize, StructureContext> = HashMap::new();

    for i in 0..pairs.len() {
        match pairs[i] {
            Some(j) if j > i => {
                contexts[i] = StructureContext::Stem;
                enclosing.push(i);
            }
            Some(_) => {
                contexts[i] = StructureContext::Stem;
                enclosing.pop();
            }
            None => {
                if let Some(&opening) = enclosing.last() {
                    let context = *loop_types
                        .entry(opening)
                        .or_insert_with(|| classify_loop(pairs, opening));
                    contexts[i] = context;
                }
            }
        }
    }

    contexts
}

/// Classify the loop closed by the pair starting at `opening`.
fn classify_loop(pairs: &[Option<usize>], opening: usize) -> StructureContext {
    let Some(closing) = pairs[opening] else {
        return StructureContext::External;
    };

    let mut inner_pairs = Vec::new();
    let mut p = opening + 1;
    while p < closing {
        match pairs[p] {
            Some(q) if q > p => {
                inner_pairs.push((p, q));
                p = q + 1;
            }
            _ => p += 1,
        }
    }

    match inner_pairs.as_slice() {
        [] => StructureContext::Hairpin,
        [(p, q)] => {
            let left_unpaired = p - opening - 1;
            let right_unpaired = closing - q - 1;
            if left_unpaired > 0 && right_unpaired > 0 {
                StructureContext::Interior
            } else {
                StructureContext::Bulge
            }
        }
        _ => StructureContext::Multi,
    }
}
