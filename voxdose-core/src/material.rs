//! Material traits and a tabulated reference implementation.

/// Interface to the physics reference library's material data.
///
/// Implementations are expected to be pure and deterministic; the
/// decomposition pipeline reads attenuation and density values but never
/// caches or mutates them.
pub trait Material: Send + Sync {
    /// Human-readable material name.
    fn name(&self) -> &str;

    /// Bulk density in g/cm³.
    fn standard_density(&self) -> f64;

    /// Mass attenuation coefficient in cm²/g at `energy` keV.
    fn mass_attenuation(&self, energy: f64) -> f64;
}

impl<M: Material + ?Sized> Material for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn standard_density(&self) -> f64 {
        (**self).standard_density()
    }

    fn mass_attenuation(&self, energy: f64) -> f64 {
        (**self).mass_attenuation(energy)
    }
}

/// Material backed by a sampled attenuation table.
///
/// Lookups interpolate linearly between table points and clamp outside the
/// tabulated range. Useful for callers feeding externally computed tables and
/// for tests; production tables normally come straight from the physics
/// library behind the [`Material`] trait.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedMaterial {
    name: String,
    density: f64,
    /// (energy keV, mass attenuation cm²/g), sorted by energy.
    table: Vec<(f64, f64)>,
}

impl TabulatedMaterial {
    /// Creates a material from an attenuation table.
    ///
    /// The table is sorted by energy internally; an empty table yields zero
    /// attenuation at every energy.
    pub fn new(name: impl Into<String>, density: f64, mut table: Vec<(f64, f64)>) -> Self {
        table.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            name: name.into(),
            density,
            table,
        }
    }

    /// Creates a material whose mass attenuation is constant over energy.
    pub fn constant(name: impl Into<String>, density: f64, attenuation: f64) -> Self {
        Self::new(name, density, vec![(0.0, attenuation)])
    }
}

impl Material for TabulatedMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn standard_density(&self) -> f64 {
        self.density
    }

    fn mass_attenuation(&self, energy: f64) -> f64 {
        let table = &self.table;
        if table.is_empty() {
            return 0.0;
        }
        let upper = table.partition_point(|&(e, _)| e < energy);
        if upper == 0 {
            return table[0].1;
        }
        if upper == table.len() {
            return table[table.len() - 1].1;
        }
        let (e0, a0) = table[upper - 1];
        let (e1, a1) = table[upper];
        let t = (energy - e0) / (e1 - e0);
        a0 + t * (a1 - a0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolation_between_points() {
        let m = TabulatedMaterial::new("water", 1.0, vec![(10.0, 5.0), (20.0, 1.0)]);
        assert_relative_eq!(m.mass_attenuation(15.0), 3.0);
        assert_relative_eq!(m.mass_attenuation(12.5), 4.0);
    }

    #[test]
    fn test_clamped_outside_table() {
        let m = TabulatedMaterial::new("bone", 1.9, vec![(10.0, 5.0), (20.0, 1.0)]);
        assert_relative_eq!(m.mass_attenuation(5.0), 5.0);
        assert_relative_eq!(m.mass_attenuation(150.0), 1.0);
    }

    #[test]
    fn test_unsorted_table_is_sorted() {
        let m = TabulatedMaterial::new("soft", 1.03, vec![(20.0, 1.0), (10.0, 5.0)]);
        assert_relative_eq!(m.mass_attenuation(15.0), 3.0);
    }

    #[test]
    fn test_constant_material() {
        let m = TabulatedMaterial::constant("air", 0.0012, 0.8);
        assert_relative_eq!(m.mass_attenuation(1.0), 0.8);
        assert_relative_eq!(m.mass_attenuation(120.0), 0.8);
        assert_relative_eq!(m.standard_density(), 0.0012);
    }

    #[test]
    fn test_empty_table_is_zero() {
        let m = TabulatedMaterial::new("placeholder", 0.0, vec![]);
        assert_relative_eq!(m.mass_attenuation(60.0), 0.0);
    }
}
