use crate::constants::WINDOW_PADDING;

/// Position-frequency matrix: one row per window offset, one column per symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionMatrix {
    alphabet: Vec<char>,
    counts: Vec<Vec<u32>>,
}

impl PositionMatrix {
    #[must_use]
    pub fn new(alphabet: &[char], width: usize) -> Self {
        Self {
            alphabet: alphabet.to_vec(),
            counts: vec![vec![0; alphabet.len()]; width],
        }
    }

    #[must_use]
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Number of window offsets
    #[must_use]
    pub fn width(&self) -> usize {
        self.counts.len()
    }

    /// Count the symbols of one aligned window. Symbols outside the alphabet
    /// (padding, N) are skipped.
    pub fn add_window<I: IntoIterator<Item = char>>(&mut self, window: I) {
        for (row, symbol) in self.counts.iter_mut().zip(window) {
            if symbol == WINDOW_PADDING {
                continue;
            }
            if let Some(column) = self.alphabet.iter().position(|&a| a == symbol) {
                row[column] += 1;
            }
        }
    }

    #[must_use]
    pub fn counts(&self) -> &[Vec<u32>] {
        &self.counts
    }

    /// Row-normalized frequencies; rows without observations are all zero.
    #[must_use]
    pub fn frequencies(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let total: u32 = row.iter().sum();
                row.iter()
                    .map(|&c| {
                        if total == 0 {
                            0.0
                        } else {
                            f64::from(c) / f64::from(total)
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
