//! Trait definitions for meterfocus.

/// Maps one source record into one output record.
///
/// Implementors provide [`map_one`](RecordMapper::map_one); the batch
/// method maps each record in order and stops at the first failure, so a
/// single bad record fails the whole batch.
pub trait RecordMapper {
    /// Input record type.
    type Source;
    /// Output record type.
    type Target;
    /// Error produced when a record cannot be mapped.
    type Error;

    /// Transforms a single source record.
    fn map_one(&self, source: &Self::Source) -> Result<Self::Target, Self::Error>;

    /// Transforms a batch of source records, preserving order.
    fn map_many(&self, sources: &[Self::Source]) -> Result<Vec<Self::Target>, Self::Error> {
        sources.iter().map(|source| self.map_one(source)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl RecordMapper for Doubler {
        type Source = i32;
        type Target = i32;
        type Error = String;

        fn map_one(&self, source: &i32) -> Result<i32, String> {
            if *source < 0 {
                return Err(format!("negative: {source}"));
            }
            Ok(source * 2)
        }
    }

    #[test]
    fn test_map_many_preserves_order() {
        assert_eq!(Doubler.map_many(&[3, 1, 2]).unwrap(), vec![6, 2, 4]);
    }

    #[test]
    fn test_map_many_fails_whole_batch() {
        let result = Doubler.map_many(&[1, -5, 2, -7]);
        assert_eq!(result.unwrap_err(), "negative: -5");
    }

    #[test]
    fn test_map_many_empty() {
        assert!(Doubler.map_many(&[]).unwrap().is_empty());
    }
}
