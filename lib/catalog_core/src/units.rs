use polars::prelude::{DataType, NamedFrom, PolarsError, PolarsResult, Series};

const AB_MAG_ZP_WRT_JANSKY: f64 = 8.90;
// nano = 10^-9
const AB_MAG_ZP_WRT_NANOJANSKY: f64 = 2.5 * 9.0 + AB_MAG_ZP_WRT_JANSKY;

/// Converts instrumental flux to nJy given the flux of an AB magnitude of zero.
pub fn convert_flux_to_nanojansky(flux: f64, fluxmag0: f64) -> f64 {
    10f64.powf(AB_MAG_ZP_WRT_NANOJANSKY / 2.5) * flux / fluxmag0
}

pub fn convert_flux_series_to_nanojansky(flux: &Series, fluxmag0: &Series) -> PolarsResult<Series> {
    if flux.len() != fluxmag0.len() {
        return Err(PolarsError::ShapeMismatch(
            format!(
                "flux has length {} but fluxmag0 has length {}",
                flux.len(),
                fluxmag0.len()
            )
            .into(),
        ));
    }
    let flux_f64 = flux.cast(&DataType::Float64)?;
    let fluxmag0_f64 = fluxmag0.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = flux_f64
        .f64()?
        .into_iter()
        .zip(fluxmag0_f64.f64()?.into_iter())
        .map(|(f, z)| match (f, z) {
            (Some(f), Some(z)) => Some(convert_flux_to_nanojansky(f, z)),
            _ => None,
        })
        .collect();
    Ok(Series::new(flux.name(), values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_point_flux_is_3631_jansky() {
        let njy = convert_flux_to_nanojansky(1.0, 1.0);
        assert!((njy / 1e9 - 3630.78).abs() < 0.01);
    }

    #[test]
    fn test_series_conversion_propagates_missing() {
        let flux = Series::new("flux", &[Some(2.0f64), None]);
        let fluxmag0 = Series::new("fluxmag0", &[4.0f64, 4.0]);
        let out = convert_flux_series_to_nanojansky(&flux, &fluxmag0).unwrap();
        let out: Vec<Option<f64>> = out.f64().unwrap().into_iter().collect();
        assert!((out[0].unwrap() - convert_flux_to_nanojansky(2.0, 4.0)).abs() < 1e-6);
        assert_eq!(out[1], None);
    }
}
