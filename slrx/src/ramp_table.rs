// A compact table of variable-length lists: `index[k]..index[k + 1]` is the range of `table`
// holding the values of key `k`.  Used for the kernel of each LR(0) state and for the
// productions of each non-terminal.

#[derive(Clone, Debug)]
pub struct RampTable<T> {
    index: Vec<usize>,
    table: Vec<T>,
}

impl<T> RampTable<T> {
    pub fn new() -> Self {
        Self {
            index: vec![0],
            table: Vec::new(),
        }
    }

    pub fn num_keys(&self) -> usize {
        self.index.len() - 1
    }

    pub fn values<Q: Into<usize>>(&self, key: Q) -> &[T] {
        let key: usize = key.into();
        &self.table[self.index[key]..self.index[key + 1]]
    }

    /// Appends a new key holding `values`.
    pub fn push_entry(&mut self, values: impl Iterator<Item = T>) {
        self.table.extend(values);
        self.index.push(self.table.len());
    }
}

/// Builds a RampTable key by key:
///
///   b.start_key();
///   b.push_value(...);
///   b.push_value(...);
///   b.start_key();
///   ...
///   let table = b.finish();
pub struct RampTableBuilder<T> {
    index: Vec<usize>,
    table: Vec<T>,
}

impl<T> RampTableBuilder<T> {
    pub fn with_capacity(keys: usize, values: usize) -> Self {
        Self {
            index: Vec::with_capacity(keys + 1),
            table: Vec::with_capacity(values),
        }
    }

    pub fn start_key(&mut self) {
        self.index.push(self.table.len());
    }

    pub fn push_value(&mut self, item: T) {
        self.table.push(item);
    }

    pub fn finish(mut self) -> RampTable<T> {
        self.index.push(self.table.len());
        RampTable {
            index: self.index,
            table: self.table,
        }
    }
}
