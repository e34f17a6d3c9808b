/// Farthest distance reported, in centimetres. Also what "no echo" is reported as.
pub const MAX_DISTANCE_CM: u16 = 200;

/// Distance sensor used to answer `REQ`.
pub trait Rangefinder {
    /// Take one measurement. `None` means no echo came back in time.
    fn measure_cm(&mut self) -> Option<u16>;
}

impl<F> Rangefinder for F
where
    F: FnMut() -> Option<u16>,
{
    fn measure_cm(&mut self) -> Option<u16> {
        self()
    }
}

/// A distance in centimetres, always within `0..=MAX_DISTANCE_CM`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceReading(u16);

impl DistanceReading {
    /// A missing echo, a zero reading or anything past the range limit all mean "nothing in
    /// range" and map to [`MAX_DISTANCE_CM`].
    pub fn from_measurement(measurement: Option<u16>) -> Self {
        match measurement {
            Some(cm) if cm > 0 && cm <= MAX_DISTANCE_CM => Self(cm),
            _ => Self(MAX_DISTANCE_CM),
        }
    }

    pub fn cm(&self) -> u16 {
        self.0
    }
}
