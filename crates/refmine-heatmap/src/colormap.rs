//! Sequential colormaps.
//!
//! Each map is a ColorBrewer nine-class ramp interpolated linearly, matching
//! the matplotlib maps of the same name.

use std::fmt;
use std::str::FromStr;

use refmine_core::RefmineError;

const YL_GN: [[u8; 3]; 9] = [
    [0xff, 0xff, 0xe5],
    [0xf7, 0xfc, 0xb9],
    [0xd9, 0xf0, 0xa3],
    [0xad, 0xdd, 0x8e],
    [0x78, 0xc6, 0x79],
    [0x41, 0xab, 0x5d],
    [0x23, 0x84, 0x43],
    [0x00, 0x68, 0x37],
    [0x00, 0x45, 0x29],
];

const GREENS: [[u8; 3]; 9] = [
    [0xf7, 0xfc, 0xf5],
    [0xe5, 0xf5, 0xe0],
    [0xc7, 0xe9, 0xc0],
    [0xa1, 0xd9, 0x9b],
    [0x74, 0xc4, 0x76],
    [0x41, 0xab, 0x5d],
    [0x23, 0x8b, 0x45],
    [0x00, 0x6d, 0x2c],
    [0x00, 0x44, 0x1b],
];

const BLUES: [[u8; 3]; 9] = [
    [0xf7, 0xfb, 0xff],
    [0xde, 0xeb, 0xf7],
    [0xc6, 0xdb, 0xef],
    [0x9e, 0xca, 0xe1],
    [0x6b, 0xae, 0xd6],
    [0x42, 0x92, 0xc6],
    [0x21, 0x71, 0xb5],
    [0x08, 0x51, 0x9c],
    [0x08, 0x30, 0x6b],
];

/// A named sequential colormap.
///
/// # Examples
///
/// ```
/// use refmine_heatmap::colormap::Colormap;
///
/// let cmap: Colormap = "YlGn".parse().unwrap();
/// assert_eq!(cmap.color_at(0.0), [0xff, 0xff, 0xe5]);
/// assert_eq!(cmap.color_at(1.0), [0x00, 0x45, 0x29]);
/// assert!("jet".parse::<Colormap>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Colormap {
    #[default]
    YlGn,
    Greens,
    Blues,
}

impl Colormap {
    fn stops(&self) -> &'static [[u8; 3]; 9] {
        match self {
            Colormap::YlGn => &YL_GN,
            Colormap::Greens => &GREENS,
            Colormap::Blues => &BLUES,
        }
    }

    /// Color for `t` in `[0, 1]`; values outside are clamped.
    pub fn color_at(&self, t: f64) -> [u8; 3] {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (stops.len() - 1) as f64;
        let lower = pos.floor() as usize;
        if lower >= stops.len() - 1 {
            return stops[stops.len() - 1];
        }
        let frac = pos - lower as f64;
        let (a, b) = (stops[lower], stops[lower + 1]);
        let mut out = [0u8; 3];
        for c in 0..3 {
            let v = f64::from(a[c]) + (f64::from(b[c]) - f64::from(a[c])) * frac;
            out[c] = v.round() as u8;
        }
        out
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Colormap::YlGn => write!(f, "YlGn"),
            Colormap::Greens => write!(f, "Greens"),
            Colormap::Blues => write!(f, "Blues"),
        }
    }
}

impl FromStr for Colormap {
    type Err = RefmineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YlGn" => Ok(Colormap::YlGn),
            "Greens" => Ok(Colormap::Greens),
            "Blues" => Ok(Colormap::Blues),
            other => Err(RefmineError::Config(format!(
                "unknown colormap {other:?} (expected YlGn, Greens or Blues)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_hits_middle_stop() {
        assert_eq!(Colormap::YlGn.color_at(0.5), YL_GN[4]);
        assert_eq!(Colormap::Blues.color_at(0.5), BLUES[4]);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(Colormap::Greens.color_at(-3.0), GREENS[0]);
        assert_eq!(Colormap::Greens.color_at(7.0), GREENS[8]);
        assert_eq!(Colormap::Greens.color_at(f64::NAN), GREENS[0]);
    }

    #[test]
    fn interpolates_between_stops() {
        // halfway between stop 0 and stop 1
        let c = Colormap::YlGn.color_at(1.0 / 16.0);
        assert_eq!(c, [0xfb, 0xfe, 0xcf]);
    }

    #[test]
    fn names_round_trip() {
        for cmap in [Colormap::YlGn, Colormap::Greens, Colormap::Blues] {
            assert_eq!(cmap.to_string().parse::<Colormap>().unwrap(), cmap);
        }
    }
}
