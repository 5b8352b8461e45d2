/// Indexed storage with slot reuse.
///
/// `insert` hands out a small integer key; `remove` frees it for the next
/// insertion. Used to keep waiter registrations that must be removable in
/// O(1) when a future is dropped before it is woken.
pub(crate) struct Slab<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Slab<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores `item`, reusing a freed slot when one is available.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        self.len += 1;

        if let Some(key) = self.free.pop() {
            self.slots[key] = Some(item);
            return key;
        }

        self.slots.push(Some(item));
        self.slots.len() - 1
    }

    /// Removes the item stored under `key`, if any.
    pub(crate) fn remove(&mut self, key: usize) -> Option<T> {
        let item = self.slots.get_mut(key)?.take()?;

        self.free.push(key);
        self.len -= 1;

        Some(item)
    }

    pub(crate) fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        self.slots.get_mut(key)?.as_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Removes every item and resets the key space.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + use<T> {
        self.free.clear();
        self.len = 0;

        std::mem::take(&mut self.slots).into_iter().flatten()
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}
