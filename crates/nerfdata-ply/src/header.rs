use std::io::BufRead;

use super::{PlyDataType, PlyError, PlyPropertyDefinition, PlyPropertyKind};

/// Encoding of the body following the header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PlyFormat {
    /// Whitespace separated text, one record per line.
    Ascii,
    /// Packed little-endian values.
    BinaryLittleEndian,
    /// Packed big-endian values.
    BinaryBigEndian,
}

/// An element declared in the header, e.g. `element vertex 100`.
#[derive(Debug, PartialEq, Clone)]
pub struct PlyElementDefinition {
    /// Element name, e.g. `vertex` or `face`.
    pub name: String,
    /// Number of records of this element in the body.
    pub count: usize,
    /// Properties of each record, in declaration order.
    pub properties: Vec<PlyPropertyDefinition>,
}

impl PlyElementDefinition {
    /// Index of the property with exactly this name.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }
}

/// A parsed PLY header.
#[derive(Debug, PartialEq, Clone)]
pub struct PlyHeader {
    /// Body encoding.
    pub format: PlyFormat,
    /// Declared elements, in body order.
    pub elements: Vec<PlyElementDefinition>,
    /// Text of `comment` and `obj_info` lines.
    pub comments: Vec<String>,
}

impl PlyHeader {
    /// Index and definition of the element with exactly this name.
    pub fn element(&self, name: &str) -> Option<(usize, &PlyElementDefinition)> {
        self.elements.iter().enumerate().find(|(_, e)| e.name == name)
    }
}

fn parse_format(parts: &[&str]) -> Result<PlyFormat, PlyError> {
    match parts {
        [_, "ascii", _] => Ok(PlyFormat::Ascii),
        [_, "binary_little_endian", _] => Ok(PlyFormat::BinaryLittleEndian),
        [_, "binary_big_endian", _] => Ok(PlyFormat::BinaryBigEndian),
        [_, other, _] => Err(PlyError::UnsupportedFormat(other.to_string())),
        _ => Err(PlyError::MalformedHeader(format!(
            "invalid format line: {}",
            parts.join(" ")
        ))),
    }
}

fn parse_property(parts: &[&str]) -> Result<PlyPropertyDefinition, PlyError> {
    match parts {
        [_, "list", count, item, name] => Ok(PlyPropertyDefinition {
            name: name.to_string(),
            kind: PlyPropertyKind::List {
                count: PlyDataType::parse(count)?,
                item: PlyDataType::parse(item)?,
            },
        }),
        [_, data_type, name] => Ok(PlyPropertyDefinition {
            name: name.to_string(),
            kind: PlyPropertyKind::Scalar(PlyDataType::parse(data_type)?),
        }),
        _ => Err(PlyError::MalformedHeader(format!(
            "invalid property line: {}",
            parts.join(" ")
        ))),
    }
}

/// Parse the header and leave `reader` positioned at the first byte of the body.
pub fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    let mut line = String::new();

    if reader.read_line(&mut line)? == 0 || line.trim() != "ply" {
        return Err(PlyError::MalformedHeader("missing ply magic".to_string()));
    }

    let mut format = None;
    let mut elements: Vec<PlyElementDefinition> = Vec::new();
    let mut comments = Vec::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::MalformedHeader(
                "unexpected end of file before end_header".to_string(),
            ));
        }
        let trimmed = line.trim();
        let parts: Vec<&str> = trimmed.split_whitespace().collect();

        match parts.first().copied() {
            Some("end_header") => break,
            Some("format") => format = Some(parse_format(&parts)?),
            Some("comment") | Some("obj_info") => {
                let text = trimmed.split_once(char::is_whitespace).map(|(_, t)| t);
                comments.push(text.unwrap_or_default().trim().to_string());
            }
            Some("element") => {
                let [_, name, count] = parts[..] else {
                    return Err(PlyError::MalformedHeader(format!(
                        "invalid element line: {trimmed}"
                    )));
                };
                let count = count.parse().map_err(|_| {
                    PlyError::MalformedHeader(format!("invalid element count: {count}"))
                })?;
                elements.push(PlyElementDefinition {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let property = parse_property(&parts)?;
                let element = elements.last_mut().ok_or_else(|| {
                    PlyError::MalformedHeader(format!(
                        "property {} declared before any element",
                        property.name
                    ))
                })?;
                element.properties.push(property);
            }
            None => {}
            Some(keyword) => {
                return Err(PlyError::MalformedHeader(format!(
                    "unknown header keyword: {keyword}"
                )))
            }
        }
    }

    let format =
        format.ok_or_else(|| PlyError::MalformedHeader("missing format line".to_string()))?;

    Ok(PlyHeader {
        format,
        elements,
        comments,
    })
}
