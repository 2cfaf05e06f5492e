//! Shape and invariant tests for the hardware description handed to the
//! scheduling backend. The serialized form is owned by the backend, so these
//! tests pin the literal key names and nesting.

use qubit_station::hardware::config::{
    ClusterDescription, ComplexOutput, HardwareConfig, ModuleDescription, PortClockConfig,
    RefSource, QBLOX_HARDWARE_COMPILE,
};

fn as_json(config: &HardwareConfig) -> serde_json::Value {
    serde_json::to_value(config).unwrap()
}

#[test]
fn top_level_keys_match_backend_schema() {
    let json = as_json(&HardwareConfig::single_transmon_default());
    let object = json.as_object().unwrap();

    assert_eq!(
        object.get("backend").unwrap(),
        QBLOX_HARDWARE_COMPILE
    );
    assert!(object.contains_key("clusterA"));
    assert_eq!(object.len(), 2);
}

#[test]
fn cluster_entry_carries_ref_and_instrument_type() {
    let json = as_json(&HardwareConfig::single_transmon_default());
    let cluster = json.get("clusterA").unwrap().as_object().unwrap();

    assert_eq!(cluster.get("ref").unwrap(), "internal");
    assert_eq!(cluster.get("instrument_type").unwrap(), "Cluster");
    assert!(cluster.contains_key("clusterA_module2"));
    assert!(cluster.contains_key("clusterA_module10"));
}

#[test]
fn module_entries_match_backend_schema() {
    let json = as_json(&HardwareConfig::single_transmon_default());
    let module = json
        .pointer("/clusterA/clusterA_module2")
        .unwrap()
        .as_object()
        .unwrap();
    assert_eq!(module.get("instrument_type").unwrap(), "QCM_RF");

    let output = module.get("complex_output_0").unwrap().as_object().unwrap();
    assert_eq!(output.get("lo_freq").unwrap().as_f64(), Some(5_312_327_240.0));
    assert_eq!(output.get("dc_mixer_offset_I").unwrap().as_f64(), Some(0.0));
    assert_eq!(output.get("dc_mixer_offset_Q").unwrap().as_f64(), Some(0.0));

    let readout = json
        .pointer("/clusterA/clusterA_module10/complex_output_0/lo_freq")
        .unwrap();
    assert_eq!(readout.as_f64(), Some(7_197_494_954.0));
}

#[test]
fn portclock_entries_have_exactly_the_four_keys() {
    let json = as_json(&HardwareConfig::single_transmon_default());

    for module in ["clusterA_module2", "clusterA_module10"] {
        let configs = json
            .pointer(&format!("/clusterA/{module}/complex_output_0/portclock_configs"))
            .unwrap()
            .as_array()
            .unwrap();
        assert!(!configs.is_empty(), "{module} has no portclock entries");

        for entry in configs {
            let entry = entry.as_object().unwrap();
            assert_eq!(entry.len(), 4, "unexpected keys in {module}: {entry:?}");
            for key in ["port", "clock", "mixer_amp_ratio", "mixer_phase_error_deg"] {
                assert!(entry.contains_key(key), "{module} missing {key}");
            }
        }
    }
}

#[test]
fn portclock_pairs_are_unique_per_cluster() {
    let config = HardwareConfig::single_transmon_default();
    config.validate().unwrap();

    let portclocks = config.portclocks();
    let unique: std::collections::HashSet<_> = portclocks.iter().collect();
    assert_eq!(portclocks.len(), unique.len());
}

#[test]
fn backend_accepts_the_serialized_form_back() {
    let config = HardwareConfig::single_transmon_default();
    let json = serde_json::to_string(&config).unwrap();
    let reparsed: HardwareConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(reparsed, config);
    reparsed.validate().unwrap();
}

#[test]
fn file_loaded_description_is_validated_like_the_literal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hardware.json");

    // Two modules claiming the same port/clock pair
    let bad = HardwareConfig::new(QBLOX_HARDWARE_COMPILE).with_cluster(
        "clusterB",
        ClusterDescription::new(RefSource::External)
            .with_module(
                "clusterB_module1",
                ModuleDescription {
                    instrument_type: "QCM_RF".to_string(),
                    complex_output_0: ComplexOutput::new(4.8e9)
                        .with_portclock(PortClockConfig::new("q10:mw", "q10.01")),
                },
            )
            .with_module(
                "clusterB_module3",
                ModuleDescription {
                    instrument_type: "QCM_RF".to_string(),
                    complex_output_0: ComplexOutput::new(4.9e9)
                        .with_portclock(PortClockConfig::new("q10:mw", "q10.01")),
                },
            ),
    );
    std::fs::write(&path, serde_json::to_string_pretty(&bad).unwrap()).unwrap();

    let loaded = HardwareConfig::from_file(&path).unwrap();
    let err = loaded.validate().unwrap_err();
    assert!(err.to_string().contains("claimed by more than one module"));
}
