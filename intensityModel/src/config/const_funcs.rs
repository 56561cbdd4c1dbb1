use crate::config::constants::*;

pub fn mw_to_kw(mw: f64) -> f64 {
    mw * KW_PER_MW
}

/// Heat input in TJ from gross generation (kWh) and gross heat rate
/// on a low-heating-value basis (kcal/kWh).
pub fn calc_heat_content_tj(gross_generation_kwh: f64, heat_rate_kcal_per_kwh: f64) -> f64 {
    gross_generation_kwh * heat_rate_kcal_per_kwh * TJ_PER_KCAL
}

/// Pollutant mass (kg) per net generation (kWh), expressed in g/kWh.
/// `None` when generation is zero or negative.
pub fn calc_mass_factor_g_per_kwh(mass_kg: f64, net_generation_kwh: f64) -> Option<f64> {
    if net_generation_kwh > 0.0 {
        Some(mass_kg * GRAMS_PER_KG / net_generation_kwh)
    } else {
        None
    }
}

/// Elementwise ratio with the zero-denominator guard: returns 0.0 where the
/// denominator is exactly zero. The second value is true when the guard fired.
pub fn guarded_ratio(numerator: f64, denominator: f64) -> (f64, bool) {
    if denominator == 0.0 {
        (0.0, true)
    } else {
        (numerator / denominator, false)
    }
}

/// Mean of consecutive windows of `window` samples. A trailing partial window
/// is averaged over the samples it has.
pub fn window_means(values: &[f64], window: usize) -> Vec<f64> {
    values
        .chunks(window.max(1))
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_means_truncates_trailing_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 10.0, 20.0];
        assert_eq!(window_means(&values, 6), vec![3.5, 15.0]);
    }

    #[test]
    fn guarded_ratio_zero_denominator() {
        assert_eq!(guarded_ratio(10.0, 0.0), (0.0, true));
        assert_eq!(guarded_ratio(20.0, 5.0), (4.0, false));
    }

    #[test]
    fn mass_factor_rejects_zero_generation() {
        assert_eq!(calc_mass_factor_g_per_kwh(5.0, 0.0), None);
        assert_eq!(calc_mass_factor_g_per_kwh(5.0, 1000.0), Some(5.0));
    }

    #[test]
    fn heat_content_from_kcal() {
        let tj = calc_heat_content_tj(1_000_000.0, 2_000.0);
        assert!((tj - 8.3736).abs() < 1e-9);
    }
}
