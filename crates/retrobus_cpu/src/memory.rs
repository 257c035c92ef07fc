use crate::consts::{ADDRESS_SPACE, MAX_STACK_SIZE};
use crate::error::SimError;

/// Reserved ring of stack slots at the top of the address space.
///
/// Slot `sp` lives at `0xFF - sp`, so successive pushes walk downwards.
/// The stack pointer wraps within `size`, never into the rest of memory.
/// Nothing stops ordinary loads and stores from touching these addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackGeometry {
    size: u8,
}

impl StackGeometry {
    pub fn new(size: u8) -> Result<Self, SimError> {
        if size == 0 || size > MAX_STACK_SIZE {
            return Err(SimError::StackSize {
                size,
                max: MAX_STACK_SIZE,
            });
        }
        Ok(Self { size })
    }

    #[inline]
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Bytes left for the program image below the stack.
    #[inline]
    pub fn program_size(&self) -> usize {
        ADDRESS_SPACE - self.size as usize
    }

    #[inline]
    pub fn slot_address(&self, sp: u8) -> u8 {
        0xFF - (sp % self.size)
    }

    #[inline]
    pub fn increment(&self, sp: u8) -> u8 {
        ((sp as u16 + 1) % self.size as u16) as u8
    }

    #[inline]
    pub fn decrement(&self, sp: u8) -> u8 {
        (sp % self.size).checked_sub(1).unwrap_or(self.size - 1)
    }
}

/// Byte-addressable RAM covering the whole 8-bit address space.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    bytes: [u8; ADDRESS_SPACE],
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            bytes: [0; ADDRESS_SPACE],
        }
    }
}

impl Memory {
    /// Place a program image in the low addresses.
    ///
    /// The image must fill the program region exactly; short or long images
    /// are rejected instead of padded or truncated.
    pub fn load(image: &[u8], stack: StackGeometry) -> Result<Self, SimError> {
        let expected = stack.program_size();
        if image.len() != expected {
            return Err(SimError::ImageSize {
                expected,
                actual: image.len(),
            });
        }
        let mut memory = Self::default();
        memory.bytes[..expected].copy_from_slice(image);
        Ok(memory)
    }

    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.bytes[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) {
        self.bytes[addr as usize] = value;
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (row, chunk) in self.bytes.chunks(16).enumerate() {
            write!(f, "{:02X}:", row * 16)?;
            for byte in chunk {
                write!(f, " {byte:02X}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
