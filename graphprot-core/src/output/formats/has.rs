use std::io::Write;

use crate::motif::SelectedSite;
use crate::types::GraphProtError;

/// `id<TAB>position<TAB>margin<TAB>window`
pub fn write_has_format<W: Write>(
    writer: &mut W,
    sites: &[SelectedSite],
) -> Result<(), GraphProtError> {
    for site in sites {
        writeln!(
            writer,
            "{}\t{}\t{:.6}\t{}",
            site.id, site.position, site.margin, site.window
        )?;
    }
    Ok(())
}
