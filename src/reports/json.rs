use crate::Result;
use crate::facts::CollectionRecord;
use core::fmt::Write;

pub fn generate<W: Write>(records: &[CollectionRecord], writer: &mut W) -> Result<()> {
    write!(writer, "{}", serde_json::to_string_pretty(records)?)?;
    Ok(())
}
