//! Version 3 source maps.
//!
//! [`SourceMap`] keeps decoded mappings; the VLQ form only exists in JSON.
//! Generated lines are 0-based in [`Mapping`] and original lines are
//! 1-based like Lua spans. The JSON encoding is 0-based on both sides.

pub mod vlq;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use vlq::VlqError;

#[derive(Debug, Error)]
pub enum SourceMapError {
    #[error("invalid source map JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported source map version {0}")]
    Version(u32),
    #[error("bad mappings on generated line {line}: {source}")]
    Vlq { line: u32, source: VlqError },
    #[error("bad mappings on generated line {line}: segment with {fields} fields")]
    Segment { line: u32, fields: usize },
    #[error("mapping refers to missing source {0}")]
    MissingSource(i64),
}

/// Where a generated position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Original {
    pub source: u32,
    /// 1-based.
    pub line: u32,
    pub column: u32,
    pub name: Option<u32>,
}

/// A segment: from `generated_line:generated_column` up to the next
/// segment, the text maps to `original`, or to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// 0-based.
    pub generated_line: u32,
    pub generated_column: u32,
    pub original: Option<Original>,
}

/// Result of [`SourceMap::original_position_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalPosition<'a> {
    pub source: &'a str,
    pub line: u32,
    pub column: u32,
    pub name: Option<&'a str>,
}

/// Result of [`SourceMap::generated_position_for`]; 1-based line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedPosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawSourceMap", try_from = "RawSourceMap")]
pub struct SourceMap {
    pub file: Option<String>,
    pub sources: Vec<String>,
    pub sources_content: Vec<Option<String>>,
    pub names: Vec<String>,
    /// Ordered by generated position, strictly increasing.
    pub mappings: Vec<Mapping>,
}

impl SourceMap {
    pub fn new(file: Option<String>) -> Self {
        Self {
            file,
            ..Self::default()
        }
    }

    /// Registers a source and returns its index.
    pub fn add_source(&mut self, name: impl Into<String>, content: Option<String>) -> u32 {
        self.sources.push(name.into());
        self.sources_content.push(content);
        (self.sources.len() - 1) as u32
    }

    /// Appends a segment after all existing ones.
    pub fn add_mapping(&mut self, mapping: Mapping) {
        debug_assert!(
            self.mappings.last().is_none_or(|last| {
                (last.generated_line, last.generated_column)
                    < (mapping.generated_line, mapping.generated_column)
            }),
            "mappings out of order"
        );
        self.mappings.push(mapping);
    }

    pub fn to_json(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The original position of generated `line` (1-based) and `column`,
    /// taken from the closest segment at or before it on that line.
    pub fn original_position_for(&self, line: u32, column: u32) -> Option<OriginalPosition<'_>> {
        let generated_line = line.checked_sub(1)?;
        let end = self.mappings.partition_point(|m| {
            (m.generated_line, m.generated_column) <= (generated_line, column)
        });
        let mapping = self.mappings[..end].last()?;
        if mapping.generated_line != generated_line {
            return None;
        }
        let original = mapping.original?;
        Some(OriginalPosition {
            source: self.sources.get(original.source as usize)?,
            line: original.line,
            column: original.column,
            name: original
                .name
                .and_then(|name| self.names.get(name as usize))
                .map(String::as_str),
        })
    }

    /// The first generated position mapped to the closest original
    /// position at or before `line` (1-based) and `column` of `source`,
    /// on that line.
    pub fn generated_position_for(
        &self,
        source: &str,
        line: u32,
        column: u32,
    ) -> Option<GeneratedPosition> {
        let source = self.sources.iter().position(|s| s == source)? as u32;
        let mut best: Option<(u32, &Mapping)> = None;
        for mapping in &self.mappings {
            let Some(original) = mapping.original else {
                continue;
            };
            if original.source != source || original.line != line || original.column > column {
                continue;
            }
            if best.is_none_or(|(best_column, _)| original.column > best_column) {
                best = Some((original.column, mapping));
            }
        }
        best.map(|(_, mapping)| GeneratedPosition {
            line: mapping.generated_line + 1,
            column: mapping.generated_column,
        })
    }

    fn encode_mappings(&self) -> String {
        let mut out = String::new();
        let mut line = 0;
        let mut previous_column = 0i64;
        let mut previous_source = 0i64;
        let mut previous_line = 0i64;
        let mut previous_original_column = 0i64;
        let mut previous_name = 0i64;
        let mut first_on_line = true;

        for mapping in &self.mappings {
            while line < mapping.generated_line {
                out.push(';');
                line += 1;
                previous_column = 0;
                first_on_line = true;
            }
            if !first_on_line {
                out.push(',');
            }
            first_on_line = false;

            let column = i64::from(mapping.generated_column);
            vlq::encode_into(column - previous_column, &mut out);
            previous_column = column;

            let Some(original) = mapping.original else {
                continue;
            };
            let source = i64::from(original.source);
            let original_line = i64::from(original.line) - 1;
            let original_column = i64::from(original.column);
            vlq::encode_into(source - previous_source, &mut out);
            vlq::encode_into(original_line - previous_line, &mut out);
            vlq::encode_into(original_column - previous_original_column, &mut out);
            previous_source = source;
            previous_line = original_line;
            previous_original_column = original_column;

            if let Some(name) = original.name {
                let name = i64::from(name);
                vlq::encode_into(name - previous_name, &mut out);
                previous_name = name;
            }
        }
        out
    }

    fn decode_mappings(&mut self, encoded: &str) -> Result<(), SourceMapError> {
        let mut previous_source = 0i64;
        let mut previous_line = 0i64;
        let mut previous_original_column = 0i64;
        let mut previous_name = 0i64;

        for (line, text) in (0u32..).zip(encoded.split(';')) {
            let mut previous_column = 0i64;
            for segment in text.split(',').filter(|s| !s.is_empty()) {
                let mut fields = [0i64; 5];
                let mut count = 0;
                let mut rest = segment;
                while !rest.is_empty() {
                    if count == fields.len() {
                        return Err(SourceMapError::Segment { line, fields: count + 1 });
                    }
                    let (value, consumed) =
                        vlq::decode(rest).map_err(|source| SourceMapError::Vlq { line, source })?;
                    fields[count] = value;
                    count += 1;
                    rest = &rest[consumed..];
                }

                previous_column += fields[0];
                let original = match count {
                    1 => None,
                    4 | 5 => {
                        previous_source += fields[1];
                        previous_line += fields[2];
                        previous_original_column += fields[3];
                        let name = (count == 5).then(|| {
                            previous_name += fields[4];
                            previous_name
                        });
                        if previous_source < 0 || previous_source as usize >= self.sources.len() {
                            return Err(SourceMapError::MissingSource(previous_source));
                        }
                        Some(Original {
                            source: previous_source as u32,
                            line: (previous_line + 1) as u32,
                            column: previous_original_column as u32,
                            name: name.map(|n| n as u32),
                        })
                    }
                    fields => return Err(SourceMapError::Segment { line, fields }),
                };
                self.mappings.push(Mapping {
                    generated_line: line,
                    generated_column: previous_column as u32,
                    original,
                });
            }
        }
        Ok(())
    }
}

/// The JSON shape of a source map.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sources_content: Vec<Option<String>>,
    #[serde(default)]
    names: Vec<String>,
    mappings: String,
}

impl From<SourceMap> for RawSourceMap {
    fn from(map: SourceMap) -> Self {
        let mappings = map.encode_mappings();
        let sources_content = if map.sources_content.iter().all(Option::is_none) {
            Vec::new()
        } else {
            map.sources_content
        };
        RawSourceMap {
            version: 3,
            file: map.file,
            sources: map.sources,
            sources_content,
            names: map.names,
            mappings,
        }
    }
}

impl TryFrom<RawSourceMap> for SourceMap {
    type Error = SourceMapError;

    fn try_from(raw: RawSourceMap) -> Result<Self, Self::Error> {
        if raw.version != 3 {
            return Err(SourceMapError::Version(raw.version));
        }
        let mut sources_content = raw.sources_content;
        sources_content.resize(raw.sources.len(), None);
        let mut map = SourceMap {
            file: raw.file,
            sources: raw.sources,
            sources_content,
            names: raw.names,
            mappings: Vec::new(),
        };
        map.decode_mappings(&raw.mappings)?;
        Ok(map)
    }
}
