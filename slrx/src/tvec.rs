// A Vec indexed by one of the int_alias! types, so a State cannot index a production table.

use core::marker::PhantomData;
use core::ops::{Index, IndexMut};

pub struct TVec<I, T> {
    items: Vec<T>,
    phantom_i: PhantomData<I>,
}

impl<I, T> TVec<I, T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            phantom_i: PhantomData,
        }
    }

    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<I, T: core::fmt::Debug> core::fmt::Debug for TVec<I, T> {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt.debug_list().entries(self.items.iter()).finish()
    }
}

impl<I: Into<usize>, T> Index<I> for TVec<I, T> {
    type Output = T;
    fn index(&self, index: I) -> &T {
        &self.items[index.into()]
    }
}

impl<I: Into<usize>, T> IndexMut<I> for TVec<I, T> {
    fn index_mut(&mut self, index: I) -> &mut T {
        &mut self.items[index.into()]
    }
}
