use crate::constants::{Word, MEMORY_SIZE};

/// The unified memory of the machine: code, data and the operand stack
/// share the same address space.
///
/// Addresses are plain words and are not validated against any region
/// boundary: writing past the stack region silently lands in adjacent
/// cells, exactly like the unprotected hardware being emulated.
/// Addressing past the physical size is a program bug and panics, as
/// nothing is mapped there.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: Box<[Word; MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: vec![0; MEMORY_SIZE]
                .into_boxed_slice()
                .try_into()
                .unwrap(),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory {{ [...; {MEMORY_SIZE}] }}")
    }
}

impl Memory {
    /// Read the cell at an address.
    #[must_use]
    pub fn get(&self, address: Word) -> Word {
        self.inner[address as usize]
    }

    /// Write the cell at an address.
    pub fn set(&mut self, address: Word, value: Word) {
        self.inner[address as usize] = value;
    }

    /// Reset every cell to zero.
    pub fn clear(&mut self) {
        self.inner.fill(0);
    }

    /// View of the whole memory.
    #[must_use]
    pub fn as_slice(&self) -> &[Word] {
        &self.inner[..]
    }
}
