use stagehand::input::{Input, InputEvent, StageAction};
use std::io::Write;
use tempfile::NamedTempFile;
use winit::keyboard::{Key, NamedKey};

#[test]
fn remapped_actions_override_defaults() {
    let mut temp = NamedTempFile::new().expect("temp bindings config");
    write!(temp, r#"{{"bindings":{{"camera_cycle":["c"],"preview_toggle":["space"]}}}}"#)
        .expect("write remap config");

    let mut input = Input::from_config(temp.path());

    input.push(InputEvent::Key { key: Key::Character("c".into()), pressed: true });
    assert_eq!(input.take_actions(), [StageAction::CameraCycle], "custom key fires the action");

    input.push(InputEvent::Key { key: Key::Named(NamedKey::Tab), pressed: true });
    assert!(input.take_actions().is_empty(), "default key no longer fires when remapped");

    input.push(InputEvent::Key { key: Key::Named(NamedKey::Space), pressed: true });
    assert_eq!(input.take_actions(), [StageAction::PreviewToggle]);

    input.push(InputEvent::Key { key: Key::Character("r".into()), pressed: true });
    assert_eq!(input.take_actions(), [StageAction::RotateStep], "untouched defaults survive");
}

#[test]
fn invalid_bindings_fall_back_to_defaults() {
    let mut temp = NamedTempFile::new().expect("temp bindings config");
    write!(temp, r#"{{"bindings":{{"camera_cycle":["not-a-key"],"no_such_action":["x"]}}}}"#)
        .expect("write config");

    let mut input = Input::from_config(temp.path());
    input.push(InputEvent::Key { key: Key::Named(NamedKey::Tab), pressed: true });
    assert_eq!(
        input.take_actions(),
        [StageAction::CameraCycle],
        "an action with no valid keys keeps its default binding"
    );
}

#[test]
fn missing_config_file_keeps_defaults() {
    let mut input = Input::from_config("config/does-not-exist.json");
    input.push(InputEvent::Key { key: Key::Character("u".into()), pressed: true });
    assert_eq!(input.take_actions(), [StageAction::SceneNext]);
}

#[test]
fn key_releases_do_not_fire_actions() {
    let mut input = Input::new();
    input.push(InputEvent::Key { key: Key::Character("p".into()), pressed: false });
    assert!(input.take_actions().is_empty());
}
