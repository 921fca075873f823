use super::{ChunkConfig, ChunkWindow};
use std::{iter::*, ops::Range};

impl<'a> IntoIterator for &'a ChunkConfig {
    type Item = ChunkWindow<'a>;
    type IntoIter = Map<Range<usize>, Box<dyn Fn(usize) -> ChunkWindow<'a> + 'a>>;

    fn into_iter(self) -> Self::IntoIter {
        let (count, func) = self.iter_mapper();
        (0..count).map(Box::new(func))
    }
}

impl ChunkConfig {
    pub(super) fn iter_mapper<'a>(&'a self) -> (usize, impl Fn(usize) -> ChunkWindow<'a> + 'a) {
        let rows = self.data_height();
        let span = self.end.saturating_sub(self.start);
        let count = (span + rows - 1) / rows;

        (count, move |i| {
            let start = self.start + i * rows;
            let len = rows.min(self.end - start);
            (self, start, len)
        })
    }

    /// Create an [ `ExactSizeIterator` ] from the configuration.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ChunkWindow> + '_ {
        let (count, func) = self.iter_mapper();
        (0..count).map(func)
    }
}
