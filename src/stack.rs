//! A LIFO buffer.

/// `Stack`
///
/// Elements are popped in the reverse order of their pushing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stack<T> {
    buffer: Vec<T>,
}

impl<T> Stack<T> {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Returns whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Pushes `element` on top.
    pub fn push(&mut self, element: T) {
        self.buffer.push(element);
    }

    /// Pops the top element, if any.
    pub fn pop(&mut self) -> Option<T> {
        self.buffer.pop()
    }

    /// Returns the top element, if any.
    pub fn top(&self) -> Option<&T> {
        self.buffer.last()
    }

    /// Returns the top element mutably, if any.
    pub fn top_mut(&mut self) -> Option<&mut T> {
        self.buffer.last_mut()
    }
}

impl<T> Extend<T> for Stack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, elements: I) {
        self.buffer.extend(elements);
    }
}
