// tn-core/src/units.rs

use uom::si::f64::{
    HeatCapacity as UomHeatCapacity, Mass as UomMass, MassDensity as UomMassDensity,
    ThermodynamicTemperature as UomThermodynamicTemperature, Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type HeatCapacity = UomHeatCapacity;
pub type Mass = UomMass;
pub type Density = UomMassDensity;
pub type Temperature = UomThermodynamicTemperature;
pub type Volume = UomVolume;

/// Offset between the Celsius and Kelvin scales.
pub const ZERO_CELSIUS_K: f64 = 273.15;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn j_per_k(v: f64) -> HeatCapacity {
    use uom::si::heat_capacity::joule_per_kelvin;
    HeatCapacity::new::<joule_per_kelvin>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

/// Kelvin value of a temperature quantity.
#[inline]
pub fn kelvin_of(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    t.get::<kelvin>()
}

/// Celsius value of a temperature quantity.
#[inline]
pub fn celsius_of(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    t.get::<degree_celsius>()
}

#[inline]
pub fn celsius_to_kelvin(c: f64) -> f64 {
    kelvin_of(degc(c))
}

#[inline]
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    celsius_of(k(kelvin))
}

/// Thermal capacitance (J/K) of a lumped mass: `m * cp`.
///
/// `cp` is given in J/(kg K).
pub fn capacitance_of_mass(mass: Mass, specific_heat: f64) -> HeatCapacity {
    use uom::si::mass::kilogram;
    j_per_k(mass.get::<kilogram>() * specific_heat)
}

/// Thermal capacitance (J/K) of a volume of material: `V * rho * cp`.
pub fn capacitance_of_volume(volume: Volume, density: Density, specific_heat: f64) -> HeatCapacity {
    capacitance_of_mass(volume * density, specific_heat)
}

#[inline]
pub fn heat_capacity_value(c: HeatCapacity) -> f64 {
    use uom::si::heat_capacity::joule_per_kelvin;
    c.get::<joule_per_kelvin>()
}
