use super::ChunkConfig;

/// Constructors
impl ChunkConfig {
    /// Construct a `ChunkConfig` with a given raster size.
    /// A zero-sized raster yields no chunks.
    pub fn with_dims(width: usize, height: usize) -> Self {
        ChunkConfig {
            width,
            height,

            data_height: height.max(1),
            tile_scale: 1,

            start: 0,
            end: height,
        }
    }
}

/// Builder methods to configure the parameters
impl ChunkConfig {
    /// Set the minimum `data_height` (before applying the tile
    /// scale).
    pub fn with_min_data_height(mut self, min_data_height: usize) -> Self {
        self.data_height = min_data_height.max(1);
        self
    }

    /// Set the minimum `data_height` by specifying minimum
    /// number of data pixels expected in each chunk.
    pub fn with_min_data_size(self, min_data_size: usize) -> Self {
        let width = self.width.max(1);
        let min_height = (min_data_size + width - 1) / width;
        self.with_min_data_height(min_height)
    }

    /// Split each chunk into `tile_scale` smaller ones.
    pub fn with_tile_scale(mut self, tile_scale: usize) -> Self {
        self.tile_scale = tile_scale.max(1);
        self
    }

    /// Set the start index of the iteration range.
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start.min(self.height);
        self
    }

    /// Set the end (not included) index of the iteration
    /// range.
    pub fn with_end(mut self, end: usize) -> Self {
        self.end = end.min(self.height);
        self
    }
}

/// Getter methods to read the parameters of the config
impl ChunkConfig {
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }

    /// Rows per chunk after applying the tile scale.
    pub fn data_height(&self) -> usize {
        (self.data_height / self.tile_scale).max(1)
    }
    pub fn tile_scale(&self) -> usize {
        self.tile_scale
    }

    pub fn start(&self) -> usize {
        self.start
    }
    pub fn end(&self) -> usize {
        self.end
    }
}
