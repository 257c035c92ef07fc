//! Text assembler for the machine's instruction set.
//!
//! Source is line oriented:
//!
//! ```text
//! ; comment
//! loop:               ; label, at column 0
//!     LDA %value      ; instructions are indented
//!     OUT
//!     JMP %loop
//! value:
//!     42              ; raw data byte
//! ```
//!
//! Numerals may be decimal, `0x` hex, `0b` binary or `0`-prefixed octal.
//! `%name` stands for the address of label `name`.

use std::collections::HashMap;
use std::num::ParseIntError;

use crate::consts::ADDRESS_SPACE;
use crate::error::AsmError;
use crate::isa::Opcode;
use crate::memory::StackGeometry;

const COMMENT: char = ';';
const REFERENCE: char = '%';
const LABEL_END: char = ':';

/// Assembled program bytes and the label addresses they were built with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assembly {
    bytes: Vec<u8>,
    labels: HashMap<String, u8>,
}

impl Assembly {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn label(&self, name: &str) -> Option<u8> {
        self.labels.get(name).copied()
    }

    /// Zero-fill the program up to the size of the program region.
    pub fn into_image(self, stack: StackGeometry) -> Result<Vec<u8>, AsmError> {
        let capacity = stack.program_size();
        if self.bytes.len() > capacity {
            return Err(AsmError::TooLarge {
                size: self.bytes.len(),
                capacity,
            });
        }
        let mut image = self.bytes;
        image.resize(capacity, 0);
        Ok(image)
    }
}

/// Assemble `source` into program bytes.
pub fn assemble(source: &str) -> Result<Assembly, AsmError> {
    let mut bytes = Vec::new();
    let mut labels: HashMap<String, usize> = HashMap::new();
    // (label, byte offset, source line)
    let mut references: Vec<(String, usize, usize)> = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;

        if raw.starts_with(&[' ', '\t'][..]) {
            for token in raw.split_whitespace() {
                if token.starts_with(COMMENT) {
                    break;
                }
                if let Some(op) = Opcode::from_mnemonic(token) {
                    bytes.push(op.byte());
                } else if let Some(name) = token.strip_prefix(REFERENCE) {
                    if Opcode::from_mnemonic(name).is_some() {
                        return Err(AsmError::ReservedWord {
                            line,
                            name: name.to_string(),
                        });
                    }
                    references.push((name.to_string(), bytes.len(), line));
                    bytes.push(0);
                } else if let Some(value) = parse_numeral(token) {
                    let byte = value.map_err(|_| AsmError::OutOfRange {
                        line,
                        token: token.to_string(),
                    })?;
                    bytes.push(byte);
                } else {
                    return Err(AsmError::UnknownToken {
                        line,
                        token: token.to_string(),
                    });
                }
            }
            continue;
        }

        let text = raw.trim();
        if text.is_empty() || text.starts_with(COMMENT) {
            continue;
        }
        // Allow a trailing comment after a label.
        let text = text.split(COMMENT).next().unwrap_or_default().trim();
        let Some(name) = text.strip_suffix(LABEL_END).filter(|n| is_label(n)) else {
            return Err(AsmError::MalformedLabel {
                line,
                text: text.to_string(),
            });
        };
        if Opcode::from_mnemonic(name).is_some() {
            return Err(AsmError::ReservedWord {
                line,
                name: name.to_string(),
            });
        }
        if labels.insert(name.to_string(), bytes.len()).is_some() {
            return Err(AsmError::DuplicateLabel {
                line,
                name: name.to_string(),
            });
        }
    }

    if bytes.len() > ADDRESS_SPACE {
        return Err(AsmError::TooLarge {
            size: bytes.len(),
            capacity: ADDRESS_SPACE,
        });
    }

    let mut resolved = HashMap::with_capacity(labels.len());
    for (name, offset) in labels {
        let address = u8::try_from(offset).map_err(|_| AsmError::TooLarge {
            size: offset + 1,
            capacity: ADDRESS_SPACE,
        })?;
        resolved.insert(name, address);
    }

    for (name, offset, line) in references {
        let address = *resolved
            .get(&name)
            .ok_or(AsmError::UnresolvedReference { line, name })?;
        bytes[offset] = address;
    }

    log::debug!("assembled {} bytes, {} labels", bytes.len(), resolved.len());
    Ok(Assembly {
        bytes,
        labels: resolved,
    })
}

fn is_label(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `None` when the token is not a numeral at all, `Some(Err(_))` when it is
/// one but does not fit a byte.
fn parse_numeral(token: &str) -> Option<Result<u8, ParseIntError>> {
    let (digits, radix) = if let Some(hex) = token.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = token.strip_prefix("0b") {
        (bin, 2)
    } else if token.len() > 1 && token.starts_with('0') {
        (&token[1..], 8)
    } else {
        (token, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    Some(u8::from_str_radix(digits, radix))
}
