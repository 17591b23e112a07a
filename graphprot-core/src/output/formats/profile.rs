use std::io::Write;

use crate::profile::Profile;
use crate::types::GraphProtError;

/// `sample_index<TAB>position<TAB>margin`, one line per profiled position
pub fn write_profile_format<W: Write>(
    writer: &mut W,
    profiles: &[Profile<'_>],
) -> Result<(), GraphProtError> {
    for (sample_index, profile) in profiles.iter().enumerate() {
        for entry in profile {
            writeln!(writer, "{sample_index}\t{}\t{:.6}", entry.position, entry.margin)?;
        }
    }
    Ok(())
}
