//! CSV input loading and reference-curve preparation.

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::Deserialize;

use crate::appliance::{Archetype, ArchetypeTable, ZipCoefficients};
use crate::config::TIME_FORMAT;
use crate::error::{Error, Result};
use crate::season::SeasonWeights;
use crate::series::{RefCurve, TimeIndex, output_step};
use crate::sim::arrival::lookahead_margin;

#[derive(Debug, Deserialize)]
struct CurveRow {
    timestamp: String,
    load: f64,
}

/// Reads a raw reference curve from `timestamp,load` CSV.
///
/// Timestamps must be strictly increasing and formatted as
/// `YYYY-mm-dd HH:MM:SS`; the sampling interval may be irregular.
///
/// # Errors
///
/// Fails on unreadable files, malformed rows, or a non-monotonic index.
pub fn load_curve_csv(path: &Path) -> Result<RefCurve> {
    let file = std::fs::File::open(path)?;
    read_curve_csv(file)
}

/// Reads a raw reference curve from any `timestamp,load` CSV reader.
pub fn read_curve_csv(reader: impl Read) -> Result<RefCurve> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let mut stamps = Vec::new();
    let mut values = Vec::new();
    for row in rdr.deserialize() {
        let row: CurveRow = row?;
        let stamp = NaiveDateTime::parse_from_str(&row.timestamp, TIME_FORMAT)
            .map_err(|e| Error::Data(format!("bad curve timestamp \"{}\": {e}", row.timestamp)))?;
        stamps.push(stamp);
        values.push(row.load);
    }
    if stamps.is_empty() {
        return Err(Error::Data("curve file has no data rows".to_string()));
    }
    RefCurve::new(TimeIndex::new(stamps)?, values)
}

/// Prepares a raw measured curve for simulation: clips it to the horizon
/// plus the arrival lookahead, resamples to hourly maxima with forward
/// fill, rescales into the base band against the in-horizon extrema, and
/// expands back onto the 1-minute output grid with order-0 interpolation.
///
/// # Errors
///
/// Fails when the raw curve does not cover the clip window, or when it is
/// flat inside the horizon (nothing to rescale against).
pub fn prepare_reference(
    raw: &RefCurve,
    start: NaiveDateTime,
    end: NaiveDateTime,
    base_min: f64,
    base_max: f64,
) -> Result<RefCurve> {
    let clip_to = end + lookahead_margin();
    if !raw.covers(start, clip_to) {
        return Err(Error::CurveWindow {
            curve_from: raw.index().first(),
            curve_to: raw.index().last(),
            from: start,
            to: clip_to,
        });
    }

    let hourly = resample_hourly_max(raw, start, clip_to)?;
    let scaled = hourly.rescaled_to_band(base_min, base_max, start, end)?;

    // order-0 expansion onto the output grid
    let grid = TimeIndex::regular(start, clip_to, output_step())?;
    let values = grid
        .stamps()
        .iter()
        .map(|t| {
            scaled
                .value_asof(*t)
                .ok_or(Error::CurveCoverage { at: *t })
        })
        .collect::<Result<Vec<f64>>>()?;
    RefCurve::new(grid, values)
}

/// Hourly-maximum resample over `[from, to]`, forward-filling hours the raw
/// curve leaves empty.
fn resample_hourly_max(raw: &RefCurve, from: NaiveDateTime, to: NaiveDateTime) -> Result<RefCurve> {
    let first_hour = from
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .ok_or_else(|| Error::invalid("resample window", "cannot truncate start to the hour"))?;
    let hours = TimeIndex::regular(first_hour, to, TimeDelta::hours(1))?;

    let stamps = raw.index().stamps();
    let mut values = Vec::with_capacity(hours.len());
    // the raw curve may begin inside the first bucket, so the fill value is
    // seeded from whichever comes first: an as-of sample or the bucket max
    let mut last = raw.value_asof(first_hour);
    for (i, hour) in hours.stamps().iter().enumerate() {
        let lo = raw.index().lower_bound(*hour);
        let hi = if i + 1 < hours.len() {
            raw.index().lower_bound(hours.stamp(i + 1))
        } else {
            stamps.len()
        };
        let bucket_max = raw.values()[lo..hi].iter().copied().reduce(f64::max);
        if bucket_max.is_some() {
            last = bucket_max;
        }
        values.push(last.ok_or(Error::CurveCoverage { at: *hour })?);
    }
    RefCurve::new(hours, values)
}

#[derive(Debug, Deserialize)]
struct ArchetypeRow {
    name: String,
    po: f64,
    qo: f64,
    zp: f64,
    ip: f64,
    pp: f64,
    zq: f64,
    iq: f64,
    pq: f64,
}

/// Reads the archetype table from `name,po,qo,zp,ip,pp,zq,iq,pq` CSV.
///
/// `po`/`qo` are the nominal active (W) and reactive (var) powers; the six
/// remaining columns are the ZIP coefficient triplets for each.
///
/// # Errors
///
/// Fails on unreadable files, malformed rows, an empty table, or
/// non-positive nominal active power.
pub fn load_archetypes_csv(path: &Path) -> Result<ArchetypeTable> {
    let file = std::fs::File::open(path)?;
    read_archetypes_csv(file)
}

/// Reads the archetype table from any CSV reader.
pub fn read_archetypes_csv(reader: impl Read) -> Result<ArchetypeTable> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        let row: ArchetypeRow = row?;
        rows.push(Archetype {
            name: row.name,
            active_w: row.po,
            reactive_var: row.qo,
            zip: ZipCoefficients {
                zp: row.zp,
                ip: row.ip,
                pp: row.pp,
                zq: row.zq,
                iq: row.iq,
                pq: row.pq,
            },
        });
    }
    ArchetypeTable::new(rows)
}

#[derive(Debug, Deserialize)]
struct WeightRow {
    archetype: String,
    spring: f64,
    summer: f64,
    winter: f64,
}

/// Reads seasonal participation weights from `archetype,spring,summer,winter`
/// CSV. Row order must match the archetype table.
///
/// # Errors
///
/// Fails on malformed rows, negative weights, or a name/order mismatch with
/// the table.
pub fn load_weights_csv(path: &Path, table: &ArchetypeTable) -> Result<SeasonWeights> {
    let file = std::fs::File::open(path)?;
    read_weights_csv(file, table)
}

/// Reads seasonal participation weights from any CSV reader.
pub fn read_weights_csv(reader: impl Read, table: &ArchetypeTable) -> Result<SeasonWeights> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let mut spring = Vec::new();
    let mut summer = Vec::new();
    let mut winter = Vec::new();
    for (i, row) in rdr.deserialize().enumerate() {
        let row: WeightRow = row?;
        if i >= table.len() || table.get(i).name != row.archetype {
            return Err(Error::Data(format!(
                "weight row {} (\"{}\") does not line up with the archetype table",
                i + 1,
                row.archetype
            )));
        }
        for w in [row.spring, row.summer, row.winter] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(Error::Data(format!(
                    "negative or non-finite weight for \"{}\"",
                    row.archetype
                )));
            }
        }
        spring.push(row.spring);
        summer.push(row.summer);
        winter.push(row.winter);
    }
    if spring.len() != table.len() {
        return Err(Error::Data(format!(
            "expected {} weight rows, got {}",
            table.len(),
            spring.len()
        )));
    }
    Ok(SeasonWeights {
        spring,
        summer,
        winter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn curve_csv_roundtrip() {
        let csv = "timestamp,load\n\
                   2014-01-01 00:00:00,1200.0\n\
                   2014-01-01 00:15:00,1500.0\n\
                   2014-01-01 00:30:00,900.0\n";
        let curve = read_curve_csv(csv.as_bytes()).unwrap();
        assert_eq!(curve.index().len(), 3);
        assert_eq!(curve.value_asof(dt("2014-01-01 00:20:00")), Some(1500.0));
    }

    #[test]
    fn curve_csv_rejects_bad_timestamp() {
        let csv = "timestamp,load\nnot-a-time,1200.0\n";
        assert!(read_curve_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn curve_csv_rejects_empty() {
        assert!(read_curve_csv("timestamp,load\n".as_bytes()).is_err());
    }

    #[test]
    fn hourly_resample_takes_bucket_max_and_forward_fills() {
        // 30-minute raw samples; the 01:00 hour has no samples at all
        let stamps = vec![
            dt("2014-01-01 00:00:00"),
            dt("2014-01-01 00:30:00"),
            dt("2014-01-01 02:00:00"),
            dt("2014-01-01 03:00:00"),
        ];
        let raw = RefCurve::new(TimeIndex::new(stamps).unwrap(), vec![10.0, 30.0, 20.0, 5.0])
            .unwrap();
        let hourly =
            resample_hourly_max(&raw, dt("2014-01-01 00:00:00"), dt("2014-01-01 03:00:00"))
                .unwrap();
        assert_eq!(hourly.values(), &[30.0, 30.0, 20.0, 5.0]);
    }

    #[test]
    fn prepare_reference_lands_on_minute_grid_in_band() {
        let start = dt("2014-01-01 00:00:00");
        let end = dt("2014-01-02 00:00:00");
        let raw_end = end + lookahead_margin();
        let index = TimeIndex::regular(start, raw_end, TimeDelta::minutes(15)).unwrap();
        let values: Vec<f64> = (0..index.len())
            .map(|i| 1000.0 + 500.0 * ((i as f64) / 8.0).sin())
            .collect();
        let raw = RefCurve::new(index, values).unwrap();

        let prepared = prepare_reference(&raw, start, end, 100.0, 5000.0).unwrap();
        assert_eq!(prepared.index().first(), start);
        assert_eq!(prepared.index().last(), raw_end);
        assert_eq!(
            prepared.index().stamp(1) - prepared.index().stamp(0),
            TimeDelta::minutes(1)
        );
        for v in prepared.values() {
            assert!((100.0..=5000.0).contains(v), "value {v} escaped the band");
        }
    }

    #[test]
    fn hourly_resample_seeds_from_a_partial_first_bucket() {
        // raw curve starts mid-hour; the truncated 00:00 bucket has no
        // as-of value, only the 00:30 sample inside it
        let stamps = vec![dt("2014-01-01 00:30:00"), dt("2014-01-01 01:15:00")];
        let raw =
            RefCurve::new(TimeIndex::new(stamps).unwrap(), vec![40.0, 10.0]).unwrap();
        let hourly =
            resample_hourly_max(&raw, dt("2014-01-01 00:30:00"), dt("2014-01-01 01:30:00"))
                .unwrap();
        assert_eq!(hourly.values(), &[40.0, 10.0]);
    }

    #[test]
    fn prepare_reference_accepts_mid_hour_start() {
        let start = dt("2014-01-01 00:30:00");
        let end = dt("2014-01-02 00:30:00");
        let raw_end = end + lookahead_margin();
        let index = TimeIndex::regular(start, raw_end, TimeDelta::minutes(15)).unwrap();
        let values: Vec<f64> = (0..index.len())
            .map(|i| 1000.0 + 500.0 * ((i as f64) / 8.0).sin())
            .collect();
        let raw = RefCurve::new(index, values).unwrap();

        let prepared = prepare_reference(&raw, start, end, 100.0, 5000.0).unwrap();
        assert_eq!(prepared.index().first(), start);
        assert_eq!(prepared.index().last(), raw_end);
        for v in prepared.values() {
            assert!((100.0..=5000.0).contains(v), "value {v} escaped the band");
        }
    }

    #[test]
    fn prepare_reference_needs_lookahead_coverage() {
        let start = dt("2014-01-01 00:00:00");
        let end = dt("2014-01-02 00:00:00");
        // raw stops exactly at the horizon end
        let index = TimeIndex::regular(start, end, TimeDelta::minutes(15)).unwrap();
        let values: Vec<f64> = (0..index.len()).map(|i| 1000.0 + i as f64).collect();
        let raw = RefCurve::new(index, values).unwrap();
        let err = prepare_reference(&raw, start, end, 100.0, 5000.0).unwrap_err();
        assert!(matches!(err, Error::CurveWindow { .. }));
    }

    #[test]
    fn archetype_csv_parses() {
        let csv = "name,po,qo,zp,ip,pp,zq,iq,pq\n\
                   refrigerator,150.0,30.0,1.17,-0.83,0.66,7.07,-10.94,4.87\n\
                   television,120.0,15.0,0.1,0.4,0.5,0.2,0.3,0.5\n";
        let table = read_archetypes_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).name, "refrigerator");
        assert_eq!(table.get(1).active_w, 120.0);
        assert_eq!(table.get(0).zip.zp, 1.17);
    }

    #[test]
    fn weights_csv_must_match_table_order() {
        let table = ArchetypeTable::demo();
        let csv = format!(
            "archetype,spring,summer,winter\n{},1.0,2.0,3.0\n",
            table.get(1).name
        );
        assert!(read_weights_csv(csv.as_bytes(), &table).is_err());
    }

    #[test]
    fn weights_csv_full_table() {
        let table = ArchetypeTable::demo();
        let mut csv = String::from("archetype,spring,summer,winter\n");
        for row in table.rows() {
            csv.push_str(&format!("{},1.0,0.5,2.0\n", row.name));
        }
        let weights = read_weights_csv(csv.as_bytes(), &table).unwrap();
        assert_eq!(weights.spring.len(), table.len());
        assert!(weights.summer.iter().all(|w| *w == 0.5));
    }
}
