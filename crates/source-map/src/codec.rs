//! Encoding and decoding of the `mappings` string.
//!
//! Lines are separated by `;` and points within a line by `,`. Every field is
//! a delta against the previous value of the same field across the whole map,
//! except the generated column, which restarts at zero on each line.

use crate::mapping::{Mapping, MappingTable, OriginalRef};
use crate::vlq;
use crate::{Error, Result};

/// Decodes `text` into `table`, whose sources and names are already loaded.
pub(crate) fn decode_mappings(text: &str, table: &mut MappingTable) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    let bytes = text.as_bytes();
    let source_count = table.sources().len() as u32;
    let name_count = table.names().len() as u32;

    let mut line: u32 = 0;
    let mut cursor = 0;
    let mut generated_column: i64 = 0;
    let mut source: i64 = 0;
    let mut source_line: i64 = 0;
    let mut source_column: i64 = 0;
    let mut name: i64 = 0;

    while cursor < bytes.len() {
        match bytes[cursor] {
            b';' => {
                line += 1;
                generated_column = 0;
                cursor += 1;
            }
            b',' => cursor += 1,
            _ => {
                let mut fields = [0i64; 5];
                let mut count = 0;
                while cursor < bytes.len() && !matches!(bytes[cursor], b';' | b',') {
                    if count == fields.len() {
                        return Err(Error::InvalidSegment {
                            line,
                            fields: count + 1,
                        });
                    }
                    fields[count] = vlq::decode(bytes, &mut cursor)
                        .map_err(|source| Error::Vlq { line, source })?;
                    count += 1;
                }
                if !matches!(count, 1 | 4 | 5) {
                    return Err(Error::InvalidSegment {
                        line,
                        fields: count,
                    });
                }

                generated_column = generated_column.saturating_add(fields[0]);
                let original = if count >= 4 {
                    source = source.saturating_add(fields[1]);
                    source_line = source_line.saturating_add(fields[2]);
                    source_column = source_column.saturating_add(fields[3]);

                    let index = position(source, line, "source index")?;
                    if index >= source_count {
                        return Err(Error::SourceIndexOutOfRange { line, index });
                    }
                    let name = if count == 5 {
                        name = name.saturating_add(fields[4]);
                        let index = position(name, line, "name index")?;
                        if index >= name_count {
                            return Err(Error::NameIndexOutOfRange { line, index });
                        }
                        Some(index)
                    } else {
                        None
                    };

                    Some(OriginalRef {
                        source: index,
                        line: position(source_line, line, "source line")?,
                        column: position(source_column, line, "source column")?,
                        name,
                    })
                } else {
                    None
                };

                table.insert(
                    line,
                    Mapping {
                        generated_column: position(generated_column, line, "generated column")?,
                        original,
                    },
                );
            }
        }
    }

    // Keep trailing empty lines so the map re-encodes identically.
    table.ensure_lines(line as usize + 1);
    Ok(())
}

fn position(value: i64, line: u32, field: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ValueOutOfRange { line, field })
}

/// Encodes every line of `table` into a `mappings` string.
pub(crate) fn encode_mappings(table: &MappingTable) -> String {
    let mut out = String::new();
    let mut source: i64 = 0;
    let mut source_line: i64 = 0;
    let mut source_column: i64 = 0;
    let mut name: i64 = 0;

    for line in 0..table.line_count() as u32 {
        if line > 0 {
            out.push(';');
        }
        let mut generated_column: i64 = 0;
        for (index, mapping) in table.line(line).unwrap_or_default().iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            vlq::encode(mapping.generated_column as i64 - generated_column, &mut out);
            generated_column = mapping.generated_column as i64;

            let Some(original) = mapping.original else {
                continue;
            };
            vlq::encode(original.source as i64 - source, &mut out);
            vlq::encode(original.line as i64 - source_line, &mut out);
            vlq::encode(original.column as i64 - source_column, &mut out);
            source = original.source as i64;
            source_line = original.line as i64;
            source_column = original.column as i64;

            if let Some(index) = original.name {
                vlq::encode(index as i64 - name, &mut out);
                name = index as i64;
            }
        }
    }

    out
}
