use crate::errors::FlagMaskError;
use polars::prelude::{BooleanChunked, NewChunkedArray, Series};

/// True where none of the flags are set. Missing flag values count as set.
pub fn create_basic_flag_mask(flags: &[Series]) -> Result<BooleanChunked, FlagMaskError> {
    let first = flags.first().ok_or(FlagMaskError::NoFlags)?;
    let expected = first.len();
    let mut out = vec![true; expected];
    for flag in flags {
        if flag.len() != expected {
            return Err(FlagMaskError::LengthMismatch {
                name: flag.name().to_string(),
                expected,
                actual: flag.len(),
            });
        }
        for (o, v) in out.iter_mut().zip(flag.bool()?.into_iter()) {
            *o &= !v.unwrap_or(true);
        }
    }
    Ok(BooleanChunked::from_slice("mask", &out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::NamedFrom;
    use rstest::rstest;

    fn values(mask: &BooleanChunked) -> Vec<Option<bool>> {
        mask.into_iter().collect()
    }

    #[test]
    fn test_all_false_gives_all_true() {
        let flag = Series::new("f", &[false; 5]);
        let mask = create_basic_flag_mask(&[flag]).unwrap();
        assert_eq!(values(&mask), vec![Some(true); 5]);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(4)]
    fn test_single_true_masks_only_its_position(#[case] position: usize) {
        let mut raw = [false; 5];
        raw[position] = true;
        let flags = [Series::new("a", &raw), Series::new("b", &[false; 5])];
        let mask = create_basic_flag_mask(&flags).unwrap();
        for (i, v) in values(&mask).into_iter().enumerate() {
            assert_eq!(v, Some(i != position));
        }
    }

    #[test]
    fn test_combines_several_flags() {
        let flags = [
            Series::new("a", &[true, false, false, false]),
            Series::new("b", &[false, false, true, false]),
            Series::new("c", &[false, false, false, false]),
        ];
        let mask = create_basic_flag_mask(&flags).unwrap();
        assert_eq!(
            values(&mask),
            vec![Some(false), Some(true), Some(false), Some(true)]
        );
    }

    #[test]
    fn test_missing_flag_counts_as_set() {
        let flag = Series::new("a", &[Some(false), None]);
        let mask = create_basic_flag_mask(&[flag]).unwrap();
        assert_eq!(values(&mask), vec![Some(true), Some(false)]);
    }

    #[test]
    fn test_no_flags_is_an_error() {
        assert!(matches!(
            create_basic_flag_mask(&[]),
            Err(FlagMaskError::NoFlags)
        ));
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let flags = [
            Series::new("a", &[false, false]),
            Series::new("b", &[false, false, false]),
        ];
        assert!(matches!(
            create_basic_flag_mask(&flags),
            Err(FlagMaskError::LengthMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn test_non_boolean_flag_is_an_error() {
        let flags = [Series::new("a", &[1i32, 0])];
        assert!(matches!(
            create_basic_flag_mask(&flags),
            Err(FlagMaskError::PolarsError(_))
        ));
    }
}
