use std::io::Write;

use crate::motif::PositionMatrix;
use crate::types::GraphProtError;

/// Position-frequency table: header of symbols, then one row per window
/// offset (`-flank..=flank`).
pub fn write_motif_format<W: Write>(
    writer: &mut W,
    matrix: &PositionMatrix,
    flank: usize,
) -> Result<(), GraphProtError> {
    write!(writer, "offset")?;
    for symbol in matrix.alphabet() {
        write!(writer, "\t{symbol}")?;
    }
    writeln!(writer)?;

    for (row, frequencies) in matrix.frequencies().iter().enumerate() {
        write!(writer, "{}", row as i64 - flank as i64)?;
        for frequency in frequencies {
            write!(writer, "\t{frequency:.4}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_motif_table() {
        let mut matrix = PositionMatrix::new(&['P', 'U'], 3);
        matrix.add_window("PPU".chars());
        matrix.add_window("UP-".chars());

        let mut buffer = Vec::new();
        write_motif_format(&mut buffer, &matrix, 1).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "offset\tP\tU\n-1\t0.5000\t0.5000\n0\t1.0000\t0.0000\n1\t0.0000\t1.0000\n"
        );
    }
}
