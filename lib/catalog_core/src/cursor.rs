use crate::registry::{Dataset, DatasetHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationState {
    Idle,
    PerDataset(usize),
    Exhausted,
}

/// Walks datasets once, in registry order. When `use_cache` is off, the content
/// cache of a dataset is cleared as soon as the caller moves past it.
pub struct DatasetCursor<'a, H: DatasetHandle> {
    datasets: &'a [Dataset<H>],
    use_cache: bool,
    state: IterationState,
}

impl<'a, H: DatasetHandle> DatasetCursor<'a, H> {
    pub fn new(datasets: &'a [Dataset<H>], use_cache: bool) -> DatasetCursor<'a, H> {
        DatasetCursor {
            datasets,
            use_cache,
            state: IterationState::Idle,
        }
    }

    pub fn state(&self) -> IterationState {
        self.state
    }

    pub fn has_next(&self) -> bool {
        match self.state {
            IterationState::Idle => !self.datasets.is_empty(),
            IterationState::PerDataset(i) => i + 1 < self.datasets.len(),
            IterationState::Exhausted => false,
        }
    }
}

impl<'a, H: DatasetHandle> Iterator for DatasetCursor<'a, H> {
    type Item = &'a Dataset<H>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match self.state {
            IterationState::Idle => 0,
            IterationState::PerDataset(i) => {
                if !self.use_cache {
                    self.datasets[i].clear_cache();
                }
                i + 1
            }
            IterationState::Exhausted => return None,
        };
        if let Some(dataset) = self.datasets.get(next) {
            self.state = IterationState::PerDataset(next);
            Some(dataset)
        } else {
            self.state = IterationState::Exhausted;
            None
        }
    }
}
