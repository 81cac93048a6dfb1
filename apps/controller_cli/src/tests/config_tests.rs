use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_key: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("controller_cli_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("controller.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn defaults_target_the_control_page_with_the_stock_tune_command() {
    let settings = Settings::default();
    assert_eq!(
        settings.control_endpoint().expect("endpoint").as_str(),
        "ws://127.0.0.1:8088/control.htm"
    );
    assert_eq!(
        settings.tune_command().expect("tune command"),
        TuneCommand::default()
    );
    assert!(settings.remote_ip_address.is_none());
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
controller_host = "192.168.1.222"
wavelength_nm = 614.5
remote_ip_address = "192.168.1.10"
"#,
    );

    let settings = load_settings_with(Some(path.as_path()), no_env).expect("load");

    assert_eq!(settings.controller_host, "192.168.1.222");
    assert_eq!(settings.controller_port, 8088);
    assert_eq!(settings.wavelength_nm, 614.5);
    assert_eq!(settings.remote_ip_address.as_deref(), Some("192.168.1.10"));
    assert_eq!(
        settings.network_endpoint().expect("endpoint").as_str(),
        "ws://192.168.1.222:8088/network.htm"
    );

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let path = temp_config("controller_host = \"from-file\"\ncontroller_port = 9000\n");
    let lookup = env_from(&[
        ("EMM_HOST", "short-name"),
        ("APP__CONTROLLER_HOST", "app-name"),
        ("EMM_PORT", "8089"),
        ("APP__WAVELENGTH_STEP_NM", "0.25"),
    ]);

    let settings = load_settings_with(Some(path.as_path()), lookup).expect("load");

    assert_eq!(settings.controller_host, "app-name");
    assert_eq!(settings.controller_port, 8089);
    assert_eq!(settings.wavelength_step_nm, 0.25);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn rejects_unparsable_env_numbers() {
    let mut settings = Settings::default();
    let err = settings
        .apply_env(env_from(&[("APP__CONTROLLER_PORT", "eighty")]))
        .expect_err("port must be numeric");
    assert!(err.to_string().contains("APP__CONTROLLER_PORT"));
}

#[test]
fn explicit_config_path_must_exist() {
    let missing = env::temp_dir().join("controller_cli_config_test_missing/controller.toml");
    assert!(load_settings_with(Some(missing.as_path()), no_env).is_err());
}

#[test]
fn unknown_keys_in_file_are_rejected() {
    let path = temp_config("controler_host = \"typo\"\n");

    let err = load_settings_with(Some(path.as_path()), no_env).expect_err("typo should fail");
    assert!(err.to_string().contains("failed to parse config file"));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn non_finite_wavelengths_from_env_are_refused_before_sending() {
    let settings = load_settings_with(
        None,
        env_from(&[
            ("APP__WAVELENGTH_NM", "NaN"),
            ("APP__WAVELENGTH_STEP_NM", "-3"),
        ]),
    )
    .expect("values parse as f64");

    let err = settings
        .tune_command()
        .expect_err("NaN wavelength must not reach the wire");
    assert!(err.to_string().contains("wavelength_nm"));

    let settings = load_settings_with(None, env_from(&[("APP__WAVELENGTH_STEP_NM", "-3")]))
        .expect("load");
    let err = settings
        .tune_command()
        .expect_err("negative step must not reach the wire");
    assert!(err.to_string().contains("wavelength_step_nm"));
}

#[test]
fn infinite_wavelength_from_file_is_refused() {
    let path = temp_config("wavelength_nm = inf\n");

    let settings = load_settings_with(Some(path.as_path()), no_env).expect("load");
    assert!(settings.tune_command().is_err());

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn negative_values_set_from_flags_are_refused() {
    let mut settings = Settings::default();
    settings.wavelength_step_nm = -1.0;
    assert!(settings.tune_command().is_err());

    settings.wavelength_step_nm = 0.0;
    settings.wavelength_nm = f64::NEG_INFINITY;
    assert!(settings.tune_command().is_err());

    settings.wavelength_nm = 614.0;
    let frame = settings
        .tune_command()
        .expect("finite, non-negative values are accepted")
        .to_frame()
        .expect("encode");
    assert!(!frame.contains("null"));
    assert!(frame.contains(r#""wavelength_2":614"#));
}
