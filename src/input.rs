use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// Edge-triggered authoring actions the session dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageAction {
    CameraCycle,
    PreviewToggle,
    AnimationNext,
    AnimationPrev,
    AnimationReplay,
    ScaleUp,
    ScaleDown,
    RotateStep,
    PrototypeNext,
    PrototypePrev,
    SearchToggle,
    SceneNext,
}

impl StageAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "camera_cycle" => Some(Self::CameraCycle),
            "preview_toggle" => Some(Self::PreviewToggle),
            "animation_next" => Some(Self::AnimationNext),
            "animation_prev" => Some(Self::AnimationPrev),
            "animation_replay" => Some(Self::AnimationReplay),
            "scale_up" => Some(Self::ScaleUp),
            "scale_down" => Some(Self::ScaleDown),
            "rotate_step" => Some(Self::RotateStep),
            "prototype_next" => Some(Self::PrototypeNext),
            "prototype_prev" => Some(Self::PrototypePrev),
            "search_toggle" => Some(Self::SearchToggle),
            "scene_next" => Some(Self::SceneNext),
            _ => None,
        }
    }

    /// Search toggle rides on Ctrl so plain typing never opens the modal.
    fn requires_ctrl(self) -> bool {
        matches!(self, Self::SearchToggle)
    }
}

pub struct Input {
    bindings: InputBindings,
    fired: Vec<StageAction>,
    ctrl_held: bool,
    cursor_pos: Option<(f32, f32)>,
    left_pressed: bool,
    left_clicked: bool,
    right_pressed: bool,
    right_clicked: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        let bindings = InputBindings::load_or_default(path);
        Self::with_bindings(bindings)
    }

    fn with_bindings(bindings: InputBindings) -> Self {
        Self {
            bindings,
            fired: Vec::new(),
            ctrl_held: false,
            cursor_pos: None,
            left_pressed: false,
            left_clicked: false,
            right_pressed: false,
            right_clicked: false,
        }
    }

    pub fn push(&mut self, ev: InputEvent) {
        match &ev {
            InputEvent::Key { key, pressed } => {
                if let Key::Named(NamedKey::Control) = key {
                    self.ctrl_held = *pressed;
                }
                if *pressed {
                    self.apply_key_binding(key);
                }
            }
            InputEvent::MouseButton { button, pressed } => match button {
                MouseButton::Left => {
                    if *pressed {
                        self.left_clicked = true;
                    }
                    self.left_pressed = *pressed;
                }
                MouseButton::Right => {
                    if *pressed {
                        self.right_clicked = true;
                    }
                    self.right_pressed = *pressed;
                }
                _ => {}
            },
            InputEvent::CursorPos { x, y } => {
                self.cursor_pos = Some((*x, *y));
            }
            InputEvent::Other => {}
        }
    }

    pub fn clear_frame(&mut self) {
        self.fired.clear();
        self.left_clicked = false;
        self.right_clicked = false;
    }

    pub fn take_actions(&mut self) -> Vec<StageAction> {
        std::mem::take(&mut self.fired)
    }

    pub fn take_left_click(&mut self) -> bool {
        let was = self.left_clicked;
        self.left_clicked = false;
        was
    }

    pub fn take_right_click(&mut self) -> bool {
        let was = self.right_clicked;
        self.right_clicked = false;
        was
    }

    pub fn cursor_position(&self) -> Option<(f32, f32)> {
        self.cursor_pos
    }

    pub fn ctrl_held(&self) -> bool {
        self.ctrl_held
    }

    fn apply_key_binding(&mut self, key: &Key) {
        if let Some(binding_key) = InputKeyBinding::from_event_key(key) {
            let actions: Vec<_> = self.bindings.actions_for_key(&binding_key).collect();
            for action in actions {
                if action.requires_ctrl() && !self.ctrl_held {
                    continue;
                }
                self.fired.push(action);
            }
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::with_bindings(InputBindings::default())
    }
}

#[derive(Debug, Clone)]
struct InputBindings {
    key_to_actions: HashMap<InputKeyBinding, Vec<StageAction>>,
}

impl InputBindings {
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<InputConfigFile>(&contents) {
                Ok(config) => Self::from_config(config, &path.display().to_string()),
                Err(err) => {
                    log::warn!(
                        "input: failed to parse {}: {err}; falling back to default bindings",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "input: failed to read {}: {err}; falling back to default bindings",
                    path.display()
                );
                Self::default()
            }
        }
    }

    fn from_config(config: InputConfigFile, origin: &str) -> Self {
        let overrides = config.into_overrides(origin);
        Self::with_overrides(overrides)
    }

    fn with_overrides(overrides: HashMap<StageAction, Vec<InputKeyBinding>>) -> Self {
        let mut action_map = Self::default_action_map();
        for (action, keys) in overrides {
            if keys.is_empty() {
                continue;
            }
            action_map.insert(action, keys);
        }
        Self::from_action_map(action_map)
    }

    fn default_action_map() -> HashMap<StageAction, Vec<InputKeyBinding>> {
        use StageAction::*;
        let mut map = HashMap::new();
        map.insert(CameraCycle, vec![InputKeyBinding::named(NamedKeyCode::Tab)]);
        map.insert(PreviewToggle, vec![InputKeyBinding::character("p")]);
        map.insert(AnimationNext, vec![InputKeyBinding::character("n")]);
        map.insert(AnimationPrev, vec![InputKeyBinding::character("m")]);
        map.insert(AnimationReplay, vec![InputKeyBinding::character("j")]);
        map.insert(ScaleUp, vec![InputKeyBinding::character("="), InputKeyBinding::character("+")]);
        map.insert(ScaleDown, vec![InputKeyBinding::character("-")]);
        map.insert(RotateStep, vec![InputKeyBinding::character("r")]);
        map.insert(PrototypeNext, vec![InputKeyBinding::character("e")]);
        map.insert(PrototypePrev, vec![InputKeyBinding::character("q")]);
        map.insert(SearchToggle, vec![InputKeyBinding::character("f")]);
        map.insert(SceneNext, vec![InputKeyBinding::character("u")]);
        map
    }

    fn from_action_map(action_map: HashMap<StageAction, Vec<InputKeyBinding>>) -> Self {
        let mut key_to_actions: HashMap<InputKeyBinding, Vec<StageAction>> = HashMap::new();
        for (action, keys) in action_map {
            for key in keys {
                key_to_actions.entry(key).or_default().push(action);
            }
        }
        Self { key_to_actions }
    }

    fn actions_for_key(&self, key: &InputKeyBinding) -> impl Iterator<Item = StageAction> + '_ {
        self.key_to_actions.get(key).into_iter().flatten().copied()
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::from_action_map(Self::default_action_map())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InputKeyBinding {
    Character(String),
    Named(NamedKeyCode),
}

impl InputKeyBinding {
    fn character(ch: &str) -> Self {
        Self::Character(ch.to_lowercase())
    }

    fn named(named: NamedKeyCode) -> Self {
        Self::Named(named)
    }

    fn from_event_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) => {
                let s = ch.to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(Self::Character(s.to_lowercase()))
                }
            }
            Key::Named(named) => NamedKeyCode::from_named_key(named).map(Self::Named),
            _ => None,
        }
    }

    fn from_config_value(raw: &str) -> Result<Self, ()> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(());
        }
        if let Some(named) = NamedKeyCode::from_str(&normalized) {
            return Ok(Self::Named(named));
        }
        if normalized.chars().count() == 1 {
            return Ok(Self::Character(normalized));
        }
        Err(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NamedKeyCode {
    Tab,
    Space,
}

impl NamedKeyCode {
    fn from_named_key(key: &NamedKey) -> Option<Self> {
        match key {
            NamedKey::Tab => Some(Self::Tab),
            NamedKey::Space => Some(Self::Space),
            _ => None,
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "tab" => Some(Self::Tab),
            "space" => Some(Self::Space),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<StageAction, Vec<InputKeyBinding>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let action_key = action_name.trim().to_lowercase();
            match StageAction::from_str(&action_key) {
                Some(action) => {
                    let mut parsed = Vec::new();
                    for key in keys {
                        match InputKeyBinding::from_config_value(&key) {
                            Ok(binding) => parsed.push(binding),
                            Err(_) => log::warn!(
                                "input: {origin}: unknown key '{key}' for action '{action_name}', ignoring"
                            ),
                        }
                    }
                    if parsed.is_empty() {
                        log::warn!(
                            "input: {origin}: action '{action_name}' has no valid keys, keeping defaults"
                        );
                        continue;
                    }
                    overrides.insert(action, parsed);
                }
                None => log::warn!("input: {origin}: unknown action '{action_name}', ignoring"),
            }
        }
        overrides
    }
}

pub enum InputEvent {
    Key { key: Key, pressed: bool },
    MouseButton { button: MouseButton, pressed: bool },
    CursorPos { x: f32, y: f32 },
    Other,
}

impl InputEvent {
    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::CursorMoved { position, .. } => {
                InputEvent::CursorPos { x: position.x as f32, y: position.y as f32 }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                InputEvent::MouseButton { button: *button, pressed: *state == ElementState::Pressed }
            }
            WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
                key: event.logical_key.clone(),
                pressed: event.state == ElementState::Pressed,
            },
            _ => InputEvent::Other,
        }
    }
}
