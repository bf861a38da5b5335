use crate::error::DataError;

/// Represents a dataset that can be accessed by index.
///
/// A dataset is a collection of items, where each item can be a single tensor,
/// a tuple such as `(image, label)`, or any other type that is `Send + 'static`.
pub trait Dataset {
    /// The type of a single item returned by the dataset.
    type Item: Send + 'static;

    /// Returns the item at the given index.
    ///
    /// # Errors
    ///
    /// Returns `DataError::IndexOutOfBounds` if `index >= len()`, or any error
    /// raised while materializing the item.
    fn get(&self, index: usize) -> Result<Self::Item, DataError>;

    /// Returns the total number of items in the dataset.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
