use crate::{AllocError, DynamicArray, Transfer};

/// Collects iterators into a `DynamicArray`, reporting allocation failure
/// instead of aborting.
pub trait ArrayIterator: Iterator {
    fn try_collect_array<X>(self) -> Result<DynamicArray<Self::Item, X>, AllocError>
        where X: Transfer<Self::Item>;

    /// Collects the `Ok` items, stopping at the first `Err`.
    fn try_collect_result_array<I, E, X>(self) -> Result<DynamicArray<I, X>, E>
        where
            Self: Iterator<Item = Result<I, E>>,
            E: From<AllocError>,
            X: Transfer<I>;
}

impl<Q: Iterator> ArrayIterator for Q {
    fn try_collect_array<X>(self) -> Result<DynamicArray<Self::Item, X>, AllocError>
        where X: Transfer<Self::Item>
    {
        let (lower, _) = self.size_hint();
        let mut array = DynamicArray::with_capacity(lower)?;
        for item in self {
            array.push_back(item)?;
        }
        Ok(array)
    }

    fn try_collect_result_array<I, E, X>(self) -> Result<DynamicArray<I, X>, E>
        where
            Self: Iterator<Item = Result<I, E>>,
            E: From<AllocError>,
            X: Transfer<I>
    {
        let mut array = DynamicArray::new();
        for item in self {
            array.push_back(item?)?;
        }
        Ok(array)
    }
}

#[cfg(test)]
mod traits_tests {
    use crate::{AllocError, ArrayIterator, Duplicate, DynamicArray};

    #[derive(Debug, PartialEq)]
    enum ParseError {
        Alloc(AllocError),
        Negative(i32),
    }

    impl From<AllocError> for ParseError {
        fn from(e: AllocError) -> Self {
            ParseError::Alloc(e)
        }
    }

    fn check(v: i32) -> Result<i32, ParseError> {
        if v < 0 { Err(ParseError::Negative(v)) } else { Ok(v) }
    }

    #[test]
    fn collects_with_exact_capacity_for_exact_iterators() {
        let items: DynamicArray<i16> = (0..12).map(|v| v as i16).try_collect_array().unwrap();
        assert_eq!(12, items.len());
        assert_eq!(12, items.capacity());
        for (i, (item, expected)) in items.iter().zip((0..12).map(|v| v as i16)).enumerate() {
            assert_eq!(*item, expected, "at index {}", i);
        }
    }

    #[test]
    fn collects_through_filters() {
        let items: DynamicArray<u32, Duplicate> = (0..20u32).filter(|v| v % 3 == 0).try_collect_array().unwrap();
        assert_eq!(items, [0, 3, 6, 9, 12, 15, 18]);
    }

    #[test]
    fn result_collection_stops_at_first_error() {
        let ok: Result<DynamicArray<i32>, ParseError> = vec![1, 2, 3].into_iter().map(check).try_collect_result_array();
        assert_eq!([1, 2, 3], ok.unwrap().as_slice());

        let err: Result<DynamicArray<i32>, ParseError> = vec![1, -2, 3, -4].into_iter().map(check).try_collect_result_array();
        assert_eq!(ParseError::Negative(-2), err.unwrap_err());
    }
}
