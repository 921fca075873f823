use rayon::iter::Map;
use rayon::prelude::*;
use rayon::range::Iter;

use super::*;

impl ChunkConfig {
    /// Create an [ `IndexedParallelIterator` ] from the configuration.
    ///
    /// This function is only available with the "use-rayon" feature.
    pub fn par_iter(&self) -> impl IndexedParallelIterator<Item = ChunkWindow> {
        let (count, func) = self.iter_mapper();
        (0..count).into_par_iter().map(func)
    }
}

impl<'a> IntoParallelIterator for &'a ChunkConfig {
    type Item = ChunkWindow<'a>;
    type Iter = Map<Iter<usize>, Box<dyn Fn(usize) -> ChunkWindow<'a> + Send + Sync + 'a>>;

    fn into_par_iter(self) -> Self::Iter {
        let (count, func) = self.iter_mapper();
        (0..count).into_par_iter().map(Box::new(func))
    }
}
