/// Index-addressed storage for tree nodes and traversal stacks.
///
/// Children are found by index rather than by pointer, which keeps the whole
/// tree in one allocation that `clear` hands back for the next step.
///
/// Elements are only ever appended or popped from the back, and the whole
/// list is emptied at once, so indices handed out by [`List::push`] stay
/// valid until the next [`List::clear`].
#[derive(Clone, Debug)]
pub(crate) struct List<T> {
    data: Vec<T>,
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, index: usize) -> &T {
        &self.data[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }

    /// Drops every element but keeps the allocation around for reuse.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn push(&mut self, element: T) -> usize {
        let index = self.data.len();
        self.data.push(element);
        index
    }

    pub fn pop(&mut self) -> Option<T> {
        self.data.pop()
    }
}
