use crate::error::EngineError;

/// Growable append-only byte store for one response.
///
/// `capacity` is the logical reservation; growth doubles it (or jumps straight
/// to the requested size) so appends stay amortized O(1).
#[derive(Debug, Default)]
pub struct DynamicBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl DynamicBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
        }
    }

    /// Makes room for `additional` more bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::BufferAlloc`] when the allocator refuses to grow.
    pub fn ensure_space(&mut self, additional: usize) -> Result<(), EngineError> {
        let required = self.data.len().saturating_add(additional);
        if required <= self.capacity {
            return Ok(());
        }
        let new_capacity = self.capacity.saturating_mul(2).max(required);
        let extra = new_capacity.saturating_sub(self.data.len());
        self.data
            .try_reserve_exact(extra)
            .map_err(|source| EngineError::BufferAlloc {
                requested: extra,
                source,
            })?;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Appends `bytes` after the current content.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::BufferAlloc`] when growing fails.
    pub fn store(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        self.ensure_space(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Drops any reservation beyond the stored bytes.
    pub fn shrink(&mut self) {
        self.data.shrink_to_fit();
        self.capacity = self.data.len();
    }

    pub fn reset(&mut self) {
        self.data = Vec::new();
        self.capacity = 0;
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
