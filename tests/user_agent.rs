use pypi_user_agent::{SystemHost, UserAgent, libc_ver, user_agent};
use serde_json::Value;

fn json_part(ua: &str) -> Value {
    let (_, json) = ua.split_once(' ').unwrap();
    serde_json::from_str(json).unwrap()
}

#[test]
fn starts_with_name_and_version() {
    let ua = user_agent("myinstaller", "1.0", None);
    assert!(ua.starts_with("myinstaller/1.0 "), "{ua}");
}

#[test]
fn rest_is_json_with_the_installer() {
    let value = json_part(&user_agent("pip", "21.1.1", None));
    assert_eq!(
        value["installer"],
        serde_json::json!({"name": "pip", "version": "21.1.1"})
    );
    assert!(value.get("user_data").is_none());
}

#[test]
fn ci_is_never_false() {
    let value = json_part(&user_agent("pip", "21.1.1", None));
    match value.get("ci") {
        Some(Value::Null) | Some(Value::Bool(true)) => (),
        other => panic!("unexpected ci value: {other:?}"),
    }
}

#[test]
fn user_data_is_passed_through() {
    let value = json_part(&user_agent("pip", "21.1.1", Some("custom data")));
    assert_eq!(value["user_data"], "custom data");
}

#[test]
fn missing_interpreter_is_not_an_error() {
    let ua = UserAgent::new("pip", "21.1.1")
        .interpreter("/definitely/not/python")
        .build();
    let value = json_part(&ua);
    assert!(value.get("python").is_none());
    assert!(value.get("implementation").is_none());
}

#[test]
fn libc_is_glibc_or_nothing() {
    let (lib, version) = libc_ver(&SystemHost);
    if lib.is_empty() {
        assert!(version.is_empty());
    } else {
        assert_eq!(lib, "glibc");
        assert!(!version.is_empty());
    }
}
