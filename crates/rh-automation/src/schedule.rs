//! Keyframe schedules: parsing and evaluation
//!
//! The automation document maps a parameter name to either a single scalar
//! (a constant for the whole render) or an object mapping time strings to
//! values. Time strings follow the rh-core grammar: `<uint>` samples,
//! `<float>s` seconds, `<float>%` of the total input length.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use rh_core::{parse_frame_time, Sample};
use serde_json::Value;

use crate::{AutomationError, AutomationResult};

/// One parameter's schedule: sample time -> normalized value, ascending.
/// Keys are unique; the ascending order defines the interpolation segments.
pub type Keyframes = BTreeMap<u64, Sample>;

/// Parameter name -> keyframe schedule. Built once per render session and
/// read-only during the render loop.
pub type ParameterAutomation = HashMap<String, Keyframes>;

/// Parse an automation document into per-parameter keyframe schedules.
///
/// `sample_rate` resolves second-based times and `total_input_frames`
/// percentage-based ones. All parse and validation failures are hard errors;
/// nothing is rendered from a document that does not validate.
pub fn parse_document(
    json: &str,
    sample_rate: f64,
    total_input_frames: u64,
) -> AutomationResult<ParameterAutomation> {
    let document: Value = serde_json::from_str(json)?;

    let entries = document.as_object().ok_or_else(|| {
        AutomationError::InvalidDocument("top level must be an object of parameter names".into())
    })?;

    let mut automation = ParameterAutomation::new();

    for (param_name, definition) in entries {
        let mut keyframes = Keyframes::new();

        match definition {
            Value::Object(points) => {
                if points.is_empty() {
                    return Err(AutomationError::InvalidDocument(format!(
                        "parameter '{param_name}' has no keyframes"
                    )));
                }

                for (time_str, value) in points {
                    let time = parse_frame_time(time_str, sample_rate, total_input_frames)?;
                    if keyframes.contains_key(&time) {
                        return Err(AutomationError::DuplicateKeyframe {
                            time,
                            source: time_str.clone(),
                        });
                    }
                    keyframes.insert(time, parameter_value(param_name, value)?);
                }
            }
            // A single value holds for the entire render
            scalar => {
                keyframes.insert(0, parameter_value(param_name, scalar)?);
            }
        }

        automation.insert(param_name.clone(), keyframes);
    }

    Ok(automation)
}

/// Convert a JSON primitive to a normalized parameter value.
///
/// Text values would need the plugin's text-to-value interface, which this
/// host does not drive; they are rejected rather than silently substituted.
fn parameter_value(param_name: &str, value: &Value) -> AutomationResult<Sample> {
    match value {
        Value::Number(n) => {
            let v = n
                .as_f64()
                .ok_or_else(|| AutomationError::InvalidValueType(param_name.to_string()))?;
            if !(0.0..=1.0).contains(&v) {
                return Err(AutomationError::OutOfRange(v));
            }
            Ok(v as Sample)
        }
        Value::String(_) => Err(AutomationError::TextValueUnsupported(
            param_name.to_string(),
        )),
        _ => Err(AutomationError::InvalidValueType(param_name.to_string())),
    }
}

/// Evaluate every automated parameter at the given sample index.
pub fn values_at(automation: &ParameterAutomation, sample_index: u64) -> Vec<(&str, Sample)> {
    automation
        .iter()
        .map(|(name, keyframes)| (name.as_str(), value_at(keyframes, sample_index)))
        .collect()
}

/// Evaluate one schedule at the given sample index.
///
/// Before the first keyframe the first value holds; at or past the last
/// keyframe the last value holds; between two keyframes the value is linearly
/// interpolated. A query landing exactly on a keyframe time returns that
/// keyframe's value: the upper-bound search excludes equal times from "next",
/// so the query sits on the "prev" boundary of the following segment.
pub fn value_at(keyframes: &Keyframes, sample_index: u64) -> Sample {
    // First keyframe strictly after the query
    let next = keyframes
        .range((Bound::Excluded(sample_index), Bound::Unbounded))
        .next();
    // Last keyframe at or before the query
    let prev = keyframes.range(..=sample_index).next_back();

    match (prev, next) {
        // At or past the last keyframe: terminal hold
        (Some((_, &value)), None) => value,
        // Before the first keyframe: initial hold
        (None, Some((_, &value))) => value,
        (Some((&t0, &v0)), Some((&t1, &v1))) => {
            let relative = (sample_index - t0) as Sample / (t1 - t0) as Sample;
            v0 + (v1 - v0) * relative
        }
        // Empty schedules are rejected at parse time
        (None, None) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyframes(points: &[(u64, Sample)]) -> Keyframes {
        points.iter().copied().collect()
    }

    #[test]
    fn test_scalar_becomes_keyframe_at_zero() {
        let automation = parse_document(r#"{"cutoff": 0.75}"#, 44100.0, 0).unwrap();
        assert_eq!(automation["cutoff"], keyframes(&[(0, 0.75)]));
    }

    #[test]
    fn test_time_string_resolution() {
        let json = r#"{"gain": {"0": 0.0, "1.5s": 1.0, "50%": 0.5}}"#;
        let automation = parse_document(json, 44100.0, 1000).unwrap();
        let lane = &automation["gain"];
        assert_eq!(lane.get(&0), Some(&0.0));
        assert_eq!(lane.get(&66150), Some(&1.0));
        assert_eq!(lane.get(&500), Some(&0.5));
    }

    #[test]
    fn test_duplicate_keyframe_is_error() {
        // "0" and "0%" both resolve to sample 0
        let json = r#"{"gain": {"0": 0.0, "0%": 1.0}}"#;
        let err = parse_document(json, 44100.0, 1000).unwrap_err();
        match err {
            AutomationError::DuplicateKeyframe { time, source } => {
                assert_eq!(time, 0);
                assert!(source == "0" || source == "0%");
            }
            other => panic!("expected DuplicateKeyframe, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_value_is_error() {
        let err = parse_document(r#"{"gain": 1.5}"#, 44100.0, 0).unwrap_err();
        assert!(matches!(err, AutomationError::OutOfRange(v) if v == 1.5));

        let err = parse_document(r#"{"gain": {"0": -0.1}}"#, 44100.0, 0).unwrap_err();
        assert!(matches!(err, AutomationError::OutOfRange(_)));
    }

    #[test]
    fn test_text_value_is_surfaced_as_unsupported() {
        let err = parse_document(r#"{"mode": "bandpass"}"#, 44100.0, 0).unwrap_err();
        assert!(matches!(err, AutomationError::TextValueUnsupported(p) if p == "mode"));
    }

    #[test]
    fn test_invalid_value_type_is_error() {
        let err = parse_document(r#"{"gain": [0.0, 1.0]}"#, 44100.0, 0).unwrap_err();
        assert!(matches!(err, AutomationError::InvalidValueType(_)));
    }

    #[test]
    fn test_empty_keyframe_object_is_error() {
        let err = parse_document(r#"{"gain": {}}"#, 44100.0, 0).unwrap_err();
        assert!(matches!(err, AutomationError::InvalidDocument(_)));
    }

    #[test]
    fn test_malformed_time_string_is_error() {
        let err = parse_document(r#"{"gain": {"abc": 0.5}}"#, 44100.0, 0).unwrap_err();
        assert!(matches!(err, AutomationError::Time(_)));
    }

    #[test]
    fn test_exact_keyframe_times_return_exact_values() {
        let lane = keyframes(&[(100, 0.25), (200, 0.75), (300, 0.5)]);
        assert_eq!(value_at(&lane, 100), 0.25);
        assert_eq!(value_at(&lane, 200), 0.75);
        assert_eq!(value_at(&lane, 300), 0.5);
    }

    #[test]
    fn test_initial_and_terminal_hold() {
        let lane = keyframes(&[(100, 0.25), (200, 0.75)]);
        assert_eq!(value_at(&lane, 0), 0.25);
        assert_eq!(value_at(&lane, 99), 0.25);
        assert_eq!(value_at(&lane, 200), 0.75);
        assert_eq!(value_at(&lane, 10_000), 0.75);
    }

    #[test]
    fn test_linear_interpolation_between_keyframes() {
        let lane = keyframes(&[(0, 0.0), (100, 1.0)]);
        assert!((value_at(&lane, 50) - 0.5).abs() < 1e-6);
        assert!((value_at(&lane, 25) - 0.25).abs() < 1e-6);

        // Strictly monotonic inside a rising segment
        let mut last = value_at(&lane, 1);
        for t in 2..100 {
            let v = value_at(&lane, t);
            assert!(v > last);
            last = v;
        }
    }

    #[test]
    fn test_values_at_covers_every_parameter() {
        let json = r#"{"a": 0.1, "b": {"0": 0.0, "100": 1.0}}"#;
        let automation = parse_document(json, 44100.0, 0).unwrap();
        let mut values = values_at(&automation, 50);
        values.sort_by(|x, y| x.0.cmp(y.0));
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].0, "a");
        assert!((values[0].1 - 0.1).abs() < 1e-6);
        assert!((values[1].1 - 0.5).abs() < 1e-6);
    }
}
