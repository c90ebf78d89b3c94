use std::io::{BufRead, ErrorKind};
use std::iter::FusedIterator;

use super::{
    parse_header, PlyDataType, PlyError, PlyFormat, PlyHeader, PlyPropertyDefinition,
    PlyPropertyKind, PlyScalar, PlyValue,
};

/// One record of the body.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyRecord {
    /// Index of the element this record belongs to, into [`PlyHeader::elements`].
    pub element: usize,
    /// One value per property of the element, in header order.
    pub values: Vec<PlyValue>,
}

/// A single-pass reader over the records of a PLY stream.
///
/// The header is parsed by [`PlyReader::new`]. Iterating then yields every record of every
/// element in file order. The iterator stops for good after the first error.
///
/// Example:
///
/// ```
/// use nerfdata_ply::PlyReader;
///
/// let text = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nend_header\n1\n2\n";
/// let reader = PlyReader::new(text.as_bytes()).unwrap();
/// let records = reader.collect::<Result<Vec<_>, _>>().unwrap();
/// assert_eq!(records.len(), 2);
/// ```
pub struct PlyReader<R> {
    reader: R,
    header: PlyHeader,
    element: usize,
    read_in_element: usize,
    line: String,
    finished: bool,
}

impl<R: BufRead> PlyReader<R> {
    /// Parse the header from `reader` and prepare to read the body.
    pub fn new(mut reader: R) -> Result<Self, PlyError> {
        let header = parse_header(&mut reader)?;
        log::debug!(
            "ply header: format {:?}, elements {:?}",
            header.format,
            header
                .elements
                .iter()
                .map(|e| (e.name.as_str(), e.count))
                .collect::<Vec<_>>()
        );
        Ok(Self {
            reader,
            header,
            element: 0,
            read_in_element: 0,
            line: String::new(),
            finished: false,
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &PlyHeader {
        &self.header
    }
}

fn unexpected_eof() -> PlyError {
    PlyError::Io(std::io::Error::new(
        ErrorKind::UnexpectedEof,
        "ply body ended before all declared records were read",
    ))
}

fn read_binary_scalar<R: BufRead>(
    reader: &mut R,
    data_type: PlyDataType,
    little_endian: bool,
) -> Result<PlyScalar, PlyError> {
    let mut buf = [0u8; 8];
    let bytes = &mut buf[..data_type.size()];
    reader.read_exact(bytes).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => unexpected_eof(),
        _ => PlyError::Io(e),
    })?;
    Ok(PlyScalar::from_bytes(bytes, data_type, little_endian))
}

fn read_binary_record<R: BufRead>(
    reader: &mut R,
    properties: &[PlyPropertyDefinition],
    little_endian: bool,
) -> Result<Vec<PlyValue>, PlyError> {
    let mut values = Vec::with_capacity(properties.len());
    for property in properties {
        let value = match property.kind {
            PlyPropertyKind::Scalar(data_type) => {
                PlyValue::Scalar(read_binary_scalar(reader, data_type, little_endian)?)
            }
            PlyPropertyKind::List { count, item } => {
                let len = read_binary_scalar(reader, count, little_endian)?.as_count()?;
                let items = (0..len)
                    .map(|_| read_binary_scalar(reader, item, little_endian))
                    .collect::<Result<Vec<_>, _>>()?;
                PlyValue::List(items)
            }
        };
        values.push(value);
    }
    Ok(values)
}

fn read_ascii_record<R: BufRead>(
    reader: &mut R,
    line: &mut String,
    properties: &[PlyPropertyDefinition],
) -> Result<Vec<PlyValue>, PlyError> {
    // skip blank lines between records
    loop {
        line.clear();
        if reader.read_line(line)? == 0 {
            return Err(unexpected_eof());
        }
        if !line.trim().is_empty() {
            break;
        }
    }

    let mut tokens = line.split_whitespace();
    let mut next_token = |name: &str| {
        tokens
            .next()
            .ok_or_else(|| PlyError::InvalidValue(format!("missing value for {name}")))
    };

    let mut values = Vec::with_capacity(properties.len());
    for property in properties {
        let value = match property.kind {
            PlyPropertyKind::Scalar(data_type) => {
                PlyValue::Scalar(PlyScalar::parse_ascii(next_token(&property.name)?, data_type)?)
            }
            PlyPropertyKind::List { count, item } => {
                let len =
                    PlyScalar::parse_ascii(next_token(&property.name)?, count)?.as_count()?;
                let items = (0..len)
                    .map(|_| PlyScalar::parse_ascii(next_token(&property.name)?, item))
                    .collect::<Result<Vec<_>, _>>()?;
                PlyValue::List(items)
            }
        };
        values.push(value);
    }

    if let Some(extra) = tokens.next() {
        return Err(PlyError::InvalidValue(format!(
            "extra values in record starting at {extra:?}: {}",
            line.trim()
        )));
    }
    Ok(values)
}

impl<R: BufRead> Iterator for PlyReader<R> {
    type Item = Result<PlyRecord, PlyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        // move past elements whose records are all read
        while self
            .header
            .elements
            .get(self.element)
            .is_some_and(|e| self.read_in_element >= e.count)
        {
            self.element += 1;
            self.read_in_element = 0;
        }

        let Some(element) = self.header.elements.get(self.element) else {
            self.finished = true;
            return None;
        };

        let values = match self.header.format {
            PlyFormat::Ascii => {
                read_ascii_record(&mut self.reader, &mut self.line, &element.properties)
            }
            PlyFormat::BinaryLittleEndian => {
                read_binary_record(&mut self.reader, &element.properties, true)
            }
            PlyFormat::BinaryBigEndian => {
                read_binary_record(&mut self.reader, &element.properties, false)
            }
        };

        match values {
            Ok(values) => {
                self.read_in_element += 1;
                Some(Ok(PlyRecord {
                    element: self.element,
                    values,
                }))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for PlyReader<R> {}
