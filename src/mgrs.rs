//! Military Grid Reference System encoding and decoding.
//!
//! An MGRS string is `ZZB EE NN digits`: two-digit UTM zone, latitude band
//! letter, two 100 km square letters, then two equal-length digit groups
//! whose length is the resolution (0 to 5 digits each). Decoding accepts
//! strings with or without the leading zone designator; when absent, the
//! caller supplies defaults.

use crate::error::CoordError;

/// Scale of one digit at each resolution, metres.
const RESOLUTION_DIVISOR: [i64; 6] = [100_000, 10_000, 1_000, 100, 10, 1];

/// The 24 grid letters: A-Z with I and O omitted.
const GRID_LETTERS: [char; 24] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

/// Encode UTM coordinates as an MGRS string at the given resolution
/// (0 = 100 km square only, 5 = 1 m).
pub fn utm_to_mgrs(
    easting: f64,
    northing: f64,
    zone: u32,
    band: char,
    resolution: usize,
) -> Result<String, CoordError> {
    if resolution > 5 {
        return Err(CoordError::InvalidInput(format!(
            "MGRS resolution must be between 0 and 5 inclusive, got {resolution}"
        )));
    }

    // East-west 100 km square letter. The letter origin repeats every three
    // zones (24 letters, 8 per zone).
    let index = ((zone as i64 - 1) % 3) * 8 + (easting / 100_000.0) as i64 - 1;
    let easting_letter = GRID_LETTERS[index.clamp(0, 23) as usize];

    // North-south letter origin alternates between even and odd zones and
    // repeats every 2,000 km.
    let offset = if zone % 2 == 1 {
        northing.rem_euclid(2_000_000.0)
    } else {
        (northing + 500_000.0).rem_euclid(2_000_000.0)
    };
    let index = (offset / 100_000.0) as i64;
    let northing_letter = GRID_LETTERS[index.clamp(0, 23) as usize];

    let easting_num = (easting as i64 % 100_000) / RESOLUTION_DIVISOR[resolution];
    let northing_num = (northing as i64 % 100_000) / RESOLUTION_DIVISOR[resolution];

    let mut out = format!("{zone:02}{band}{easting_letter}{northing_letter}");
    if resolution > 0 {
        out.push_str(&format!(
            "{easting_num:0width$}{northing_num:0width$}",
            width = resolution
        ));
    }
    Ok(out)
}

/// Decode an MGRS string into a UTM zone, easting, and northing.
///
/// The returned position is the south-west corner of the referenced square.
/// Strings without the two-digit zone prefix use `default_zone` and
/// `default_band`.
pub fn mgrs_to_utm(
    default_zone: u32,
    default_band: char,
    mgrs: &str,
) -> Result<(u32, f64, f64), CoordError> {
    let chars: Vec<char> = mgrs.chars().collect();
    if chars.len() > 15 {
        return Err(CoordError::InvalidInput(
            "MGRS string must be no longer than 15 characters".into(),
        ));
    }
    if chars.len() < 2 {
        return Err(CoordError::InvalidInput(
            "MGRS string too short to hold grid letters".into(),
        ));
    }

    // An odd length means the zone designator is present (2 digits plus the
    // band letter in front of the even-length remainder).
    let (zone, band, working) = if chars.len() % 2 != 0 {
        if !(chars[0].is_ascii_digit() && chars[1].is_ascii_digit() && chars[2].is_ascii_alphabetic())
        {
            return Err(CoordError::InvalidInput(
                "MGRS string must begin with 2 digits followed by a letter".into(),
            ));
        }
        let zone = 10 * chars[0].to_digit(10).unwrap_or(0) + chars[1].to_digit(10).unwrap_or(0);
        (zone, chars[2], &chars[3..])
    } else {
        (default_zone, default_band, &chars[..])
    };

    if working.len() < 2 || !(working[0].is_ascii_alphabetic() && working[1].is_ascii_alphabetic()) {
        return Err(CoordError::InvalidInput(
            "the intra-zone grid designations must be letters".into(),
        ));
    }
    if working[2..].iter().any(|c| !c.is_ascii_digit()) {
        return Err(CoordError::InvalidInput(
            "all characters following the zone designations must be digits".into(),
        ));
    }

    let num_len = (working.len() - 2) / 2;
    if num_len > 5 {
        return Err(CoordError::InvalidInput(
            "MGRS digit groups may be at most 5 digits each".into(),
        ));
    }
    let parse_group = |s: &[char]| -> i64 {
        s.iter()
            .fold(0i64, |acc, c| acc * 10 + i64::from(c.to_digit(10).unwrap_or(0)))
    };
    let e_num = parse_group(&working[2..2 + num_len]) * RESOLUTION_DIVISOR[num_len];
    let n_num = parse_group(&working[2 + num_len..]) * RESOLUTION_DIVISOR[num_len];

    let band = band.to_ascii_uppercase();
    let e_char = working[0].to_ascii_uppercase();
    let n_char = working[1].to_ascii_uppercase();

    // Northing within the 2,000 km letter cycle.
    let mut northing = f64::from(n_char as u8 - b'A');
    if n_char > 'O' {
        northing -= 1.0;
    }
    if n_char > 'I' {
        northing -= 1.0;
    }
    northing *= 100_000.0;
    northing += n_num as f64;

    if zone % 2 == 0 {
        northing -= 500_000.0;
        if northing < 0.0 {
            northing += 2_000_000.0;
        }
    }

    // Disambiguate which 2,000 km cycle the square sits in from the
    // latitude band. The band thresholds come from the geodetic latitude
    // at the bottom edge of each cycle.
    let mut deg_base = f64::from(band as u8 as i32 - i32::from(b'A') - 3);
    if band > 'O' {
        deg_base -= 1.0;
    }
    if band > 'I' {
        deg_base -= 1.0;
    }
    deg_base *= 8.0;
    deg_base -= 72.0;

    if deg_base >= 0.0 {
        if deg_base >= 71.64 {
            northing += 8_000_000.0;
        } else if deg_base >= 53.91 {
            if deg_base > 63.0 && northing < 1_000_000.0 {
                northing += 8_000_000.0;
            } else {
                northing += 6_000_000.0;
            }
        } else if deg_base >= 36.02 {
            if deg_base > 45.0 && northing < 1_000_000.0 {
                northing += 6_000_000.0;
            } else {
                northing += 4_000_000.0;
            }
        } else if deg_base >= 18.03 {
            if deg_base > 28.0 && northing < 1_000_000.0 {
                northing += 4_000_000.0;
            } else {
                northing += 2_000_000.0;
            }
        } else if deg_base > 10.0 && northing < 1_000_000.0 {
            northing += 2_000_000.0;
        }
    } else if deg_base >= -18.03 {
        northing += 8_000_000.0;
    } else if deg_base >= -36.02 {
        if deg_base > -28.0 && northing < 1_000_000.0 {
            northing += 8_000_000.0;
        } else {
            northing += 6_000_000.0;
        }
    } else if deg_base >= -53.91 {
        if deg_base > -45.0 && northing < 1_000_000.0 {
            northing += 6_000_000.0;
        } else {
            northing += 4_000_000.0;
        }
    } else if deg_base >= -71.64 {
        if deg_base > -63.0 && northing < 1_000_000.0 {
            northing += 4_000_000.0;
        } else {
            northing += 2_000_000.0;
        }
    } else if deg_base > -81.0 && northing < 1_000_000.0 {
        northing += 2_000_000.0;
    }

    let mut easting = f64::from(e_char as u8 - b'A');
    if e_char > 'O' {
        easting -= 1.0;
    }
    if e_char > 'I' {
        easting -= 1.0;
    }
    easting += 1.0;
    easting -= (((zone as i64 - 1) % 3) * 8) as f64;
    easting *= 100_000.0;
    easting += e_num as f64;

    Ok((zone, easting, northing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_encode_resolutions() {
        let cases = [
            (600.433, 1000.4, 12, 'V', 5, "12VRF0060001000"),
            (7329.32, 40.83, 4, 'D', 4, "04DAF07320004"),
            (600.433, 1000.4, 11, 'B', 3, "11BHA006010"),
            (600.433, 1000.4, 9, 'W', 2, "09WRA0001"),
            (600.433, 1000.4, 42, 'S', 1, "42SRF00"),
        ];
        for (e, n, zone, band, res, expected) in cases {
            let s = utm_to_mgrs(e, n, zone, band, res).unwrap();
            assert_eq!(s, expected);
        }
    }

    #[test]
    fn test_encode_resolution_zero_has_no_digits() {
        let s = utm_to_mgrs(578_091.23, 3_810_201.79, 11, 'S', 0).unwrap();
        assert_eq!(s, "11SNU");
    }

    #[test]
    fn test_encode_survey_points_zone_11() {
        // Three surveyed positions, zone 11 band S, at each resolution.
        let op_cross = [
            "11SNU71",
            "11SNU7810",
            "11SNU780102",
            "11SNU78091020",
            "11SNU7809110201",
        ];
        for (res, expected) in op_cross.iter().enumerate() {
            let s = utm_to_mgrs(578_091.23, 3_810_201.79, 11, 'S', res + 1).unwrap();
            assert_eq!(&s, expected);
        }

        let s = utm_to_mgrs(588_290.0, 3_812_760.30, 11, 'S', 4).unwrap();
        assert_eq!(s, "11SNU88291276");
        let s = utm_to_mgrs(588_290.0, 3_812_760.30, 11, 'S', 5).unwrap();
        assert_eq!(s, "11SNU8829012760");

        let s = utm_to_mgrs(587_488.49, 3_801_418.65, 11, 'S', 5).unwrap();
        assert_eq!(s, "11SNU8748801418");
    }

    #[test]
    fn test_encode_rejects_bad_resolution() {
        assert!(utm_to_mgrs(0.0, 0.0, 11, 'S', 6).is_err());
    }

    #[test]
    fn test_decode_roundtrip_one_metre() {
        let points = [
            (578_091.23, 3_810_201.79),
            (588_290.0, 3_812_760.30),
            (587_488.49, 3_801_418.65),
        ];
        for (e, n) in points {
            let s = utm_to_mgrs(e, n, 11, 'S', 5).unwrap();
            let (zone, e2, n2) = mgrs_to_utm(0, 'A', &s).unwrap();
            assert_eq!(zone, 11);
            assert_relative_eq!(e2, e, epsilon = 1.0);
            assert_relative_eq!(n2, n, epsilon = 1.0);
        }
    }

    #[test]
    fn test_decode_easting_cycle_for_each_zone_residue() {
        // The 100 km easting letter origin repeats every three zones; the
        // decoder must subtract the right cycle offset for each residue.
        for zone in [9, 10, 11] {
            let s = utm_to_mgrs(342_000.5, 3_810_201.79, zone, 'S', 5).unwrap();
            let (zone2, e, n) = mgrs_to_utm(0, 'A', &s).unwrap();
            assert_eq!(zone2, zone);
            assert_relative_eq!(e, 342_000.0, epsilon = 1.0);
            assert_relative_eq!(n, 3_810_201.0, epsilon = 1.0);
        }
    }

    #[test]
    fn test_decode_uses_defaults_without_zone_prefix() {
        let (zone, e, n) = mgrs_to_utm(11, 'S', "NU7809110201").unwrap();
        assert_eq!(zone, 11);
        assert_relative_eq!(e, 578_091.0, epsilon = 1.0);
        assert_relative_eq!(n, 3_810_201.0, epsilon = 1.0);
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        let upper = mgrs_to_utm(0, 'A', "11SNU7809110201").unwrap();
        let lower = mgrs_to_utm(0, 'A', "11snu7809110201").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_decode_rejects_malformed_strings() {
        assert!(mgrs_to_utm(0, 'A', "11SNU78091102011234").is_err());
        assert!(mgrs_to_utm(0, 'A', "1xSNU71").is_err());
        assert!(mgrs_to_utm(0, 'A', "11S1U71").is_err());
        assert!(mgrs_to_utm(0, 'A', "11SNU7a").is_err());
        assert!(mgrs_to_utm(0, 'A', "X").is_err());
    }
}
