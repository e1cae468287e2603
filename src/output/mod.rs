//! Output serialization
//!
//! The whole harvest is written as one pretty-printed JSON array. There is
//! no incremental format: a run either produces the complete array or
//! nothing at all.

use std::io::Write;

use crate::record::SpellRecord;
use crate::Result;

/// Writes the records as a JSON array to the given sink
pub fn write_records<W: Write>(mut writer: W, records: &[SpellRecord]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}
